//! The agent's base as drawn on the scripted screen

use crate::infra::Position;
use crate::state::{
    FeatureLayer, NEUTRAL_MINERAL_FIELD, NEUTRAL_VESPENE_GEYSER, PLAYER_SELF, TERRAN_BARRACKS,
    TERRAN_COMMAND_CENTER, TERRAN_FACTORY, TERRAN_REFINERY, TERRAN_SCV, TERRAN_STARPORT,
    TERRAN_SUPPLY_DEPOT, UnitTypeId,
};

pub const SCREEN_SIZE: usize = 84;

/// `player_relative` value of neutral pixels
const PLAYER_NEUTRAL: i32 = 3;

const COMMAND_CENTER_ORIGIN: Position = Position { x: 36, y: 36 };
const MINERAL_ORIGIN: Position = Position { x: 4, y: 20 };
const GEYSER_ORIGIN: Position = Position { x: 12, y: 6 };
const GEYSER_SIZE: i32 = 7;
const WORKER_ROW: Position = Position { x: 20, y: 30 };
/// Only this many workers fit on the drawn mineral line
const MAX_DRAWN_WORKERS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Structure {
    unit_type: UnitTypeId,
    origin: Position,
}

/// Pixel size of a structure, chosen so that one instance counts as one
/// against the catalog footprints
fn shape(unit_type: UnitTypeId) -> (i32, i32) {
    match unit_type {
        TERRAN_COMMAND_CENTER => (13, 13),
        TERRAN_SUPPLY_DEPOT => (8, 9),
        TERRAN_REFINERY => (10, 10),
        _ => (12, 12),
    }
}

#[derive(Debug, Clone)]
pub struct Base {
    structures: Vec<Structure>,
    workers: u32,
}

impl Base {
    /// A command center, its mineral line and one geyser
    pub fn new(workers: u32) -> Self {
        Self {
            structures: vec![Structure {
                unit_type: TERRAN_COMMAND_CENTER,
                origin: COMMAND_CENTER_ORIGIN,
            }],
            workers,
        }
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    pub fn add_worker(&mut self) {
        self.workers += 1;
    }

    pub fn count(&self, unit_type: UnitTypeId) -> usize {
        self.structures
            .iter()
            .filter(|s| s.unit_type == unit_type)
            .count()
    }

    pub fn has(&self, unit_type: UnitTypeId) -> bool {
        self.count(unit_type) > 0
    }

    /// Place `unit_type` centred on `center`. Fails if any of it would leave
    /// the screen or cover something; a refinery must cover the geyser.
    pub fn try_place(&mut self, unit_type: UnitTypeId, center: Position) -> bool {
        let (width, height) = shape(unit_type);
        let origin = center.offset(-width / 2, -height / 2);
        let screen = self.render_unit_types();
        let bounds = screen.bounds();

        let mut covers_geyser = false;
        for y in origin.y..origin.y + height {
            for x in origin.x..origin.x + width {
                let pos = Position::new(x, y);
                if !bounds.contains(&pos) {
                    return false;
                }
                match screen.get(pos) {
                    0 => {}
                    NEUTRAL_VESPENE_GEYSER if unit_type == TERRAN_REFINERY => covers_geyser = true,
                    _ => return false,
                }
            }
        }
        if unit_type == TERRAN_REFINERY && !covers_geyser {
            return false;
        }

        self.structures.push(Structure { unit_type, origin });
        true
    }

    pub fn render_unit_types(&self) -> FeatureLayer {
        let mut layer = FeatureLayer::new(SCREEN_SIZE, SCREEN_SIZE);
        layer.fill_rect(MINERAL_ORIGIN, 3, 30, NEUTRAL_MINERAL_FIELD);
        layer.fill_rect(GEYSER_ORIGIN, GEYSER_SIZE, GEYSER_SIZE, NEUTRAL_VESPENE_GEYSER);

        for structure in &self.structures {
            let (width, height) = shape(structure.unit_type);
            layer.fill_rect(structure.origin, width, height, structure.unit_type);
        }
        for i in 0..self.workers.min(MAX_DRAWN_WORKERS) as i32 {
            layer.fill_rect(WORKER_ROW.offset(3 * i, 0), 2, 2, TERRAN_SCV);
        }
        layer
    }

    /// Ownership layer matching `unit_types`
    pub fn render_player_relative(unit_types: &FeatureLayer) -> FeatureLayer {
        let mut layer = FeatureLayer::new(unit_types.width(), unit_types.height());
        for unit_type in [
            TERRAN_COMMAND_CENTER,
            TERRAN_SUPPLY_DEPOT,
            TERRAN_REFINERY,
            TERRAN_BARRACKS,
            TERRAN_FACTORY,
            TERRAN_STARPORT,
            TERRAN_SCV,
        ] {
            for pos in unit_types.positions_of(unit_type) {
                layer.set(pos, PLAYER_SELF);
            }
        }
        for unit_type in [NEUTRAL_MINERAL_FIELD, NEUTRAL_VESPENE_GEYSER] {
            for pos in unit_types.positions_of(unit_type) {
                layer.set(pos, PLAYER_NEUTRAL);
            }
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Orientation;
    use crate::state::{BuildingRole, Catalog, Observation, TerranCatalog};

    fn observe(base: &Base) -> Observation {
        let mut obs = Observation::empty(SCREEN_SIZE, 64);
        obs.screen.unit_type = base.render_unit_types();
        obs
    }

    #[test]
    fn test_drawn_structures_count_as_one() {
        let catalog = TerranCatalog::new();
        let base = Base::new(12);
        let obs = observe(&base);

        assert_eq!(catalog.role_count(BuildingRole::Supply, &obs), 0);
        assert!(catalog.locate(TERRAN_SCV, &obs).is_some());

        for building in catalog.buildings() {
            let mut base = Base::new(12);
            let target = catalog
                .placement(building, &observe(&base), Orientation::TopLeft)
                .unwrap();
            assert!(base.try_place(building.unit_type, target), "{}", building.label);
            assert_eq!(catalog.count(building, &observe(&base)), 1, "{}", building.label);
        }
    }

    #[test]
    fn test_catalog_placements_fit_for_both_orientations() {
        let catalog = TerranCatalog::new();
        for orientation in [Orientation::TopLeft, Orientation::Other] {
            let mut base = Base::new(12);
            for building in catalog.buildings() {
                for _ in 0..building.max_count {
                    let obs = observe(&base);
                    let Some(target) = catalog.placement(building, &obs, orientation) else {
                        continue;
                    };
                    base.try_place(building.unit_type, target);
                }
            }

            let obs = observe(&base);
            for building in catalog.buildings() {
                assert!(catalog.count(building, &obs) >= 1, "{} {:?}", building.label, orientation);
            }
            assert!(catalog.role_count(BuildingRole::Production, &obs) >= 3);
            assert_eq!(catalog.role_count(BuildingRole::Supply, &obs), 6);
        }
    }

    #[test]
    fn test_overlapping_placement_is_rejected() {
        let mut base = Base::new(0);
        assert!(!base.try_place(TERRAN_BARRACKS, Position::new(42, 42)));
        assert!(!base.try_place(TERRAN_BARRACKS, Position::new(1, 1)));
        assert!(!base.try_place(TERRAN_REFINERY, Position::new(70, 10)));
        assert!(base.try_place(TERRAN_REFINERY, Position::new(15, 9)));
        assert_eq!(base.count(TERRAN_REFINERY), 1);
    }
}
