//! Macro-action space - a fixed, ordered list built once from catalog data

use crate::state::Catalog;

/// Edge length of one attack tile on the minimap
pub const ATTACK_TILE_SIZE: usize = 32;
/// Attack coordinates sit this far before the tile's last pixel
const ATTACK_CENTER_SHIFT: i32 = 16;

pub const NO_OP_LABEL: &str = "donothing";
pub const ATTACK_LABEL: &str = "attack";
const LABEL_DELIMITER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    NoOp,
    TrainUnit,
    BuildBuilding,
    Attack,
}

/// One top-level decision. Train and build variants index the catalog's
/// unit and building descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroAction {
    NoOp,
    TrainUnit(usize),
    BuildBuilding(usize),
    Attack { x: i32, y: i32 },
}

impl MacroAction {
    pub fn category(&self) -> ActionCategory {
        match self {
            MacroAction::NoOp => ActionCategory::NoOp,
            MacroAction::TrainUnit(_) => ActionCategory::TrainUnit,
            MacroAction::BuildBuilding(_) => ActionCategory::BuildBuilding,
            MacroAction::Attack { .. } => ActionCategory::Attack,
        }
    }

    pub fn label(&self, catalog: &dyn Catalog) -> Option<String> {
        match *self {
            MacroAction::NoOp => Some(NO_OP_LABEL.to_string()),
            MacroAction::TrainUnit(i) => catalog.units().get(i).map(|u| u.label.clone()),
            MacroAction::BuildBuilding(i) => catalog.buildings().get(i).map(|b| b.label.clone()),
            MacroAction::Attack { x, y } => Some(format!(
                "{ATTACK_LABEL}{LABEL_DELIMITER}{x}{LABEL_DELIMITER}{y}"
            )),
        }
    }

    /// Resolve a label back to an action; `None` means the label is unknown
    /// to this catalog.
    pub fn from_label(label: &str, catalog: &dyn Catalog) -> Option<Self> {
        let (category, x, y) = split_label(label);

        if category == NO_OP_LABEL {
            return Some(MacroAction::NoOp);
        }
        if category == ATTACK_LABEL {
            return Some(MacroAction::Attack { x, y });
        }
        if let Some(i) = catalog.units().iter().position(|u| u.label == category) {
            return Some(MacroAction::TrainUnit(i));
        }
        catalog
            .buildings()
            .iter()
            .position(|b| b.label == category)
            .map(MacroAction::BuildBuilding)
    }
}

/// Split a compound label into `(category, x, y)`.
///
/// Labels without coordinates yield `(label, 0, 0)`.
pub fn split_label(label: &str) -> (&str, i32, i32) {
    let mut parts = label.splitn(3, LABEL_DELIMITER);
    let category = parts.next().unwrap_or(label);
    let mut coordinate = || parts.next().and_then(|p| p.parse::<i32>().ok()).unwrap_or(0);
    let x = coordinate();
    let y = coordinate();
    (category, x, y)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace {
    actions: Vec<MacroAction>,
    labels: Vec<String>,
}

impl ActionSpace {
    /// Build the action list: no-op, one train action per unit, one build
    /// action per building, then one attack per minimap tile.
    pub fn build(catalog: &dyn Catalog, minimap_size: usize) -> Self {
        let mut actions = vec![MacroAction::NoOp];
        actions.extend((0..catalog.units().len()).map(MacroAction::TrainUnit));
        actions.extend((0..catalog.buildings().len()).map(MacroAction::BuildBuilding));

        let tiles = minimap_size / ATTACK_TILE_SIZE;
        for tile_x in 0..tiles {
            for tile_y in 0..tiles {
                let last_x = ((tile_x + 1) * ATTACK_TILE_SIZE - 1) as i32;
                let last_y = ((tile_y + 1) * ATTACK_TILE_SIZE - 1) as i32;
                actions.push(MacroAction::Attack {
                    x: last_x - ATTACK_CENTER_SHIFT,
                    y: last_y - ATTACK_CENTER_SHIFT,
                });
            }
        }

        // Descriptor indices are in range by construction
        let labels: Vec<String> = actions
            .iter()
            .map(|a| a.label(catalog).unwrap_or_default())
            .collect();

        let duplicate = labels
            .iter()
            .enumerate()
            .find(|(i, label)| labels[..*i].contains(*label));
        if let Some((_, label)) = duplicate {
            tracing::warn!(label = %label, "Duplicate macro-action label");
            debug_assert!(false, "macro-action labels must be unique");
        }

        tracing::debug!(actions = actions.len(), "Built macro-action space");

        Self { actions, labels }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<MacroAction> {
        self.actions.get(index).copied()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, MacroAction)> + '_ {
        self.actions.iter().copied().enumerate()
    }

    pub fn count_of(&self, category: ActionCategory) -> usize {
        self.actions
            .iter()
            .filter(|a| a.category() == category)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TerranCatalog;

    #[test]
    fn test_layout_of_action_space() {
        let catalog = TerranCatalog::new();
        let space = ActionSpace::build(&catalog, 64);

        let units = catalog.units().len();
        let buildings = catalog.buildings().len();
        assert_eq!(space.len(), 1 + units + buildings + 4);
        assert_eq!(space.get(0), Some(MacroAction::NoOp));
        assert_eq!(space.get(1), Some(MacroAction::TrainUnit(0)));
        assert_eq!(space.get(1 + units), Some(MacroAction::BuildBuilding(0)));
        assert_eq!(space.get(space.len()), None);
    }

    #[test]
    fn test_attack_tiles_for_64_minimap() {
        let catalog = TerranCatalog::new();
        let space = ActionSpace::build(&catalog, 64);

        let attacks: Vec<MacroAction> = space
            .iter()
            .map(|(_, a)| a)
            .filter(|a| a.category() == ActionCategory::Attack)
            .collect();
        assert_eq!(
            attacks,
            vec![
                MacroAction::Attack { x: 15, y: 15 },
                MacroAction::Attack { x: 15, y: 47 },
                MacroAction::Attack { x: 47, y: 15 },
                MacroAction::Attack { x: 47, y: 47 },
            ]
        );
        assert_eq!(space.count_of(ActionCategory::Attack), 4);
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = TerranCatalog::new();
        assert_eq!(
            ActionSpace::build(&catalog, 64),
            ActionSpace::build(&catalog, 64)
        );
    }

    #[test]
    fn test_every_label_resolves() {
        let catalog = TerranCatalog::new();
        let space = ActionSpace::build(&catalog, 64);

        for (index, action) in space.iter() {
            let label = space.label(index).unwrap();
            assert_eq!(MacroAction::from_label(label, &catalog), Some(action));
            assert_eq!(space.index_of(label), Some(index));
        }
        assert_eq!(space.label(0), Some(NO_OP_LABEL));
    }

    #[test]
    fn test_unknown_label() {
        let catalog = TerranCatalog::new();
        assert_eq!(MacroAction::from_label("buildnuke", &catalog), None);
    }

    #[test]
    fn test_split_label() {
        assert_eq!(split_label("attack_15_47"), ("attack", 15, 47));
        assert_eq!(split_label("buildbarracks"), ("buildbarracks", 0, 0));
        assert_eq!(split_label("donothing"), ("donothing", 0, 0));
    }
}
