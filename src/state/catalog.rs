//! Unit and building catalog - what can be trained or built, and where

use crate::infra::{Orientation, Position};

use super::observation::{Observation, UnitTypeId};
use super::primitive::FunctionId;

/// What a building contributes to the encoded state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingRole {
    Base,
    Supply,
    Production,
    GasExtraction,
    Support,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingDescriptor {
    /// Unique macro-action label, must not contain `_`
    pub label: String,
    pub unit_type: UnitTypeId,
    pub build: FunctionId,
    pub max_count: usize,
    pub role: BuildingRole,
    /// Screen pixels covered by one instance
    pub footprint: usize,
    /// Placement relative to the command center for a top-left start
    pub placement_offset: (i32, i32),
    /// Shift applied per already existing instance
    pub placement_step: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    /// Unique macro-action label, must not contain `_`
    pub label: String,
    pub unit_type: UnitTypeId,
    pub train: FunctionId,
    /// Building type that trains this unit
    pub produced_by: UnitTypeId,
}

/// Query service over unit and building definitions.
///
/// Descriptor order is significant: the action space is built from it and
/// the learned table is indexed by that order.
pub trait Catalog {
    fn units(&self) -> &[UnitDescriptor];

    fn buildings(&self) -> &[BuildingDescriptor];

    fn worker_type(&self) -> UnitTypeId;

    fn command_center_type(&self) -> UnitTypeId;

    fn mineral_type(&self) -> UnitTypeId;

    fn gas_type(&self) -> UnitTypeId;

    /// How many instances of `building` currently exist
    fn count(&self, building: &BuildingDescriptor, obs: &Observation) -> usize;

    /// A screen location of a visible instance of `unit_type`
    fn locate(&self, unit_type: UnitTypeId, obs: &Observation) -> Option<Position>;

    /// Where the next instance of `building` should go
    fn placement(
        &self,
        building: &BuildingDescriptor,
        obs: &Observation,
        orientation: Orientation,
    ) -> Option<Position>;

    /// Sum of instance counts over every building with `role`
    fn role_count(&self, role: BuildingRole, obs: &Observation) -> usize {
        self.buildings()
            .iter()
            .filter(|b| b.role == role)
            .map(|b| self.count(b, obs))
            .sum()
    }
}

pub const TERRAN_COMMAND_CENTER: UnitTypeId = 18;
pub const TERRAN_SUPPLY_DEPOT: UnitTypeId = 19;
pub const TERRAN_REFINERY: UnitTypeId = 20;
pub const TERRAN_BARRACKS: UnitTypeId = 21;
pub const TERRAN_FACTORY: UnitTypeId = 27;
pub const TERRAN_STARPORT: UnitTypeId = 28;
pub const TERRAN_SCV: UnitTypeId = 45;
pub const TERRAN_MARINE: UnitTypeId = 48;
pub const TERRAN_MARAUDER: UnitTypeId = 51;
pub const TERRAN_HELLION: UnitTypeId = 53;
pub const TERRAN_MEDIVAC: UnitTypeId = 54;
pub const NEUTRAL_MINERAL_FIELD: UnitTypeId = 341;
pub const NEUTRAL_VESPENE_GEYSER: UnitTypeId = 342;

pub const BUILD_BARRACKS: FunctionId = FunctionId(42);
pub const BUILD_FACTORY: FunctionId = FunctionId(53);
pub const BUILD_REFINERY: FunctionId = FunctionId(79);
pub const BUILD_STARPORT: FunctionId = FunctionId(89);
pub const BUILD_SUPPLY_DEPOT: FunctionId = FunctionId(91);
pub const TRAIN_MARAUDER: FunctionId = FunctionId(476);
pub const TRAIN_MARINE: FunctionId = FunctionId(477);
pub const TRAIN_HELLION: FunctionId = FunctionId(484);
pub const TRAIN_MEDIVAC: FunctionId = FunctionId(488);
pub const TRAIN_SCV: FunctionId = FunctionId(490);

/// Footprint of the command center on the default screen resolution
const COMMAND_CENTER_FOOTPRINT: usize = 285;

/// Terran catalog that measures the world from the screen's unit-type layer
#[derive(Debug, Clone)]
pub struct TerranCatalog {
    units: Vec<UnitDescriptor>,
    buildings: Vec<BuildingDescriptor>,
}

impl TerranCatalog {
    pub fn new() -> Self {
        let unit = |label: &str, unit_type, train, produced_by| UnitDescriptor {
            label: label.to_string(),
            unit_type,
            train,
            produced_by,
        };

        let units = vec![
            unit("trainscv", TERRAN_SCV, TRAIN_SCV, TERRAN_COMMAND_CENTER),
            unit("trainmarine", TERRAN_MARINE, TRAIN_MARINE, TERRAN_BARRACKS),
            unit("trainmarauder", TERRAN_MARAUDER, TRAIN_MARAUDER, TERRAN_BARRACKS),
            unit("trainhellion", TERRAN_HELLION, TRAIN_HELLION, TERRAN_FACTORY),
            unit("trainmedivac", TERRAN_MEDIVAC, TRAIN_MEDIVAC, TERRAN_STARPORT),
        ];

        let buildings = vec![
            BuildingDescriptor {
                label: "buildsupplydepot".to_string(),
                unit_type: TERRAN_SUPPLY_DEPOT,
                build: BUILD_SUPPLY_DEPOT,
                max_count: 6,
                role: BuildingRole::Supply,
                footprint: 69,
                placement_offset: (-18, -24),
                placement_step: (10, 0),
            },
            BuildingDescriptor {
                label: "buildbarracks".to_string(),
                unit_type: TERRAN_BARRACKS,
                build: BUILD_BARRACKS,
                max_count: 2,
                role: BuildingRole::Production,
                footprint: 137,
                placement_offset: (18, -6),
                placement_step: (0, 14),
            },
            BuildingDescriptor {
                label: "buildrefinery".to_string(),
                unit_type: TERRAN_REFINERY,
                build: BUILD_REFINERY,
                max_count: 2,
                role: BuildingRole::GasExtraction,
                footprint: 97,
                placement_offset: (0, 0),
                placement_step: (0, 0),
            },
            BuildingDescriptor {
                label: "buildfactory".to_string(),
                unit_type: TERRAN_FACTORY,
                build: BUILD_FACTORY,
                max_count: 1,
                role: BuildingRole::Production,
                footprint: 137,
                placement_offset: (-6, 20),
                placement_step: (0, 0),
            },
            BuildingDescriptor {
                label: "buildstarport".to_string(),
                unit_type: TERRAN_STARPORT,
                build: BUILD_STARPORT,
                max_count: 1,
                role: BuildingRole::Production,
                footprint: 137,
                placement_offset: (10, 20),
                placement_step: (0, 0),
            },
        ];

        Self { units, buildings }
    }

    fn footprint_of(&self, unit_type: UnitTypeId) -> usize {
        if unit_type == TERRAN_COMMAND_CENTER {
            return COMMAND_CENTER_FOOTPRINT;
        }
        self.buildings
            .iter()
            .find(|b| b.unit_type == unit_type)
            .map_or(1, |b| b.footprint)
    }

    /// Number of instances covering `pixels` screen pixels, rounded to nearest
    fn instances(pixels: usize, footprint: usize) -> usize {
        let footprint = footprint.max(1);
        (pixels + footprint / 2) / footprint
    }
}

impl Default for TerranCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for TerranCatalog {
    fn units(&self) -> &[UnitDescriptor] {
        &self.units
    }

    fn buildings(&self) -> &[BuildingDescriptor] {
        &self.buildings
    }

    fn worker_type(&self) -> UnitTypeId {
        TERRAN_SCV
    }

    fn command_center_type(&self) -> UnitTypeId {
        TERRAN_COMMAND_CENTER
    }

    fn mineral_type(&self) -> UnitTypeId {
        NEUTRAL_MINERAL_FIELD
    }

    fn gas_type(&self) -> UnitTypeId {
        NEUTRAL_VESPENE_GEYSER
    }

    fn count(&self, building: &BuildingDescriptor, obs: &Observation) -> usize {
        let pixels = obs.screen.unit_type.count_of(building.unit_type);
        Self::instances(pixels, self.footprint_of(building.unit_type))
    }

    fn locate(&self, unit_type: UnitTypeId, obs: &Observation) -> Option<Position> {
        let pixels = obs.screen.unit_type.positions_of(unit_type);
        if pixels.is_empty() {
            return None;
        }

        let n = pixels.len() as i32;
        let centroid = Position::new(
            pixels.iter().map(|p| p.x).sum::<i32>() / n,
            pixels.iter().map(|p| p.y).sum::<i32>() / n,
        );

        // The centroid of several instances can land between them; snap to
        // the nearest real pixel.
        pixels.into_iter().min_by_key(|p| p.distance(&centroid))
    }

    fn placement(
        &self,
        building: &BuildingDescriptor,
        obs: &Observation,
        orientation: Orientation,
    ) -> Option<Position> {
        if building.role == BuildingRole::GasExtraction {
            return self.locate(self.gas_type(), obs);
        }

        let command_center = self.locate(self.command_center_type(), obs)?;
        let existing = self.count(building, obs) as i32;
        let (dx, dy) = building.placement_offset;
        let (step_x, step_y) = building.placement_step;

        let target = orientation.transform_distance(
            command_center,
            dx + step_x * existing,
            dy + step_y * existing,
        );
        Some(target.clamped(&obs.screen.unit_type.bounds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_rect(obs: &mut Observation, origin: Position, w: i32, h: i32, unit_type: UnitTypeId) {
        obs.screen.unit_type.fill_rect(origin, w, h, unit_type);
    }

    #[test]
    fn test_labels_are_unique_and_delimiter_free() {
        let catalog = TerranCatalog::new();
        let mut labels: Vec<&str> = catalog
            .units()
            .iter()
            .map(|u| u.label.as_str())
            .chain(catalog.buildings().iter().map(|b| b.label.as_str()))
            .collect();
        assert!(labels.iter().all(|l| !l.contains('_')));

        let total = labels.len();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), total);
    }

    #[test]
    fn test_count_rounds_footprints() {
        let catalog = TerranCatalog::new();
        let depot = &catalog.buildings()[0];
        let mut obs = Observation::empty(84, 64);
        assert_eq!(catalog.count(depot, &obs), 0);

        // two depots, roughly 8x9 pixels each
        with_rect(&mut obs, Position::new(0, 0), 8, 9, TERRAN_SUPPLY_DEPOT);
        with_rect(&mut obs, Position::new(20, 0), 8, 9, TERRAN_SUPPLY_DEPOT);
        assert_eq!(catalog.count(depot, &obs), 2);
    }

    #[test]
    fn test_role_count_sums_production() {
        let catalog = TerranCatalog::new();
        let mut obs = Observation::empty(84, 64);
        with_rect(&mut obs, Position::new(0, 0), 12, 12, TERRAN_BARRACKS);
        with_rect(&mut obs, Position::new(40, 40), 12, 12, TERRAN_STARPORT);

        assert_eq!(catalog.role_count(BuildingRole::Production, &obs), 2);
        assert_eq!(catalog.role_count(BuildingRole::Supply, &obs), 0);
    }

    #[test]
    fn test_locate_snaps_to_real_pixel() {
        let catalog = TerranCatalog::new();
        let mut obs = Observation::empty(84, 64);
        assert_eq!(catalog.locate(TERRAN_BARRACKS, &obs), None);

        with_rect(&mut obs, Position::new(0, 0), 3, 3, TERRAN_BARRACKS);
        with_rect(&mut obs, Position::new(30, 0), 3, 3, TERRAN_BARRACKS);
        let location = catalog.locate(TERRAN_BARRACKS, &obs).unwrap();
        assert_eq!(obs.screen.unit_type.get(location), TERRAN_BARRACKS);
    }

    #[test]
    fn test_placement_needs_command_center() {
        let catalog = TerranCatalog::new();
        let depot = catalog.buildings()[0].clone();
        let mut obs = Observation::empty(84, 64);
        assert_eq!(catalog.placement(&depot, &obs, Orientation::TopLeft), None);

        with_rect(&mut obs, Position::new(36, 36), 13, 13, TERRAN_COMMAND_CENTER);
        let top_left = catalog.placement(&depot, &obs, Orientation::TopLeft).unwrap();
        let other = catalog.placement(&depot, &obs, Orientation::Other).unwrap();
        assert_eq!(top_left, Position::new(42 - 18, 42 - 24));
        assert_eq!(other, Position::new(42 + 18, 42 + 24));
    }

    #[test]
    fn test_refinery_goes_on_geyser() {
        let catalog = TerranCatalog::new();
        let refinery = catalog
            .buildings()
            .iter()
            .find(|b| b.role == BuildingRole::GasExtraction)
            .unwrap()
            .clone();
        let mut obs = Observation::empty(84, 64);
        with_rect(&mut obs, Position::new(10, 10), 5, 5, NEUTRAL_VESPENE_GEYSER);

        let target = catalog.placement(&refinery, &obs, Orientation::Other).unwrap();
        assert_eq!(obs.screen.unit_type.get(target), NEUTRAL_VESPENE_GEYSER);
    }
}
