//! Per-tick observation as delivered by the game environment

use std::collections::HashSet;

use crate::infra::{Bounds, Position};

use super::primitive::FunctionId;

pub type UnitTypeId = i32;

/// `player_relative` value of pixels owned by the agent
pub const PLAYER_SELF: i32 = 1;
/// `player_relative` value of pixels owned by an enemy
pub const PLAYER_HOSTILE: i32 = 4;

/// A typed per-pixel feature layer, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayer {
    width: usize,
    height: usize,
    data: Vec<i32>,
}

impl FeatureLayer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_grid(self.width, self.height)
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.bounds().contains(&pos) {
            Some(pos.y as usize * self.width + pos.x as usize)
        } else {
            None
        }
    }

    /// Value at `pos`, 0 outside the layer
    pub fn get(&self, pos: Position) -> i32 {
        self.index(pos).map_or(0, |i| self.data[i])
    }

    pub fn set(&mut self, pos: Position, value: i32) {
        if let Some(i) = self.index(pos) {
            self.data[i] = value;
        }
    }

    /// Paint a `width` x `height` rectangle; pixels outside the layer are dropped
    pub fn fill_rect(&mut self, origin: Position, width: i32, height: i32, value: i32) {
        for y in origin.y..origin.y + height {
            for x in origin.x..origin.x + width {
                self.set(Position::new(x, y), value);
            }
        }
    }

    /// Every pixel holding `value`, scanned row by row
    pub fn positions_of(&self, value: i32) -> Vec<Position> {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == value)
            .map(|(i, _)| Position::new((i % self.width) as i32, (i / self.width) as i32))
            .collect()
    }

    pub fn count_of(&self, value: i32) -> usize {
        self.data.iter().filter(|v| **v == value).count()
    }

    pub fn contains_value(&self, value: i32) -> bool {
        self.data.contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    First,
    Mid,
    Last,
}

/// One entry of a unit-selection list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedUnit {
    pub unit_type: UnitTypeId,
}

/// Layers of the local play-area view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayers {
    pub player_relative: FeatureLayer,
    pub unit_type: FeatureLayer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimapLayers {
    pub player_relative: FeatureLayer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub step_type: StepType,
    /// Outcome of the episode; only meaningful on the last step
    pub reward: f64,
    pub screen: ScreenLayers,
    pub minimap: MinimapLayers,
    pub army_supply: u32,
    pub available_actions: HashSet<FunctionId>,
    pub single_select: Vec<SelectedUnit>,
    pub multi_select: Vec<SelectedUnit>,
}

impl Observation {
    /// An observation of nothing: empty layers and only `no_op` available
    pub fn empty(screen_size: usize, minimap_size: usize) -> Self {
        Self {
            step_type: StepType::First,
            reward: 0.0,
            screen: ScreenLayers {
                player_relative: FeatureLayer::new(screen_size, screen_size),
                unit_type: FeatureLayer::new(screen_size, screen_size),
            },
            minimap: MinimapLayers {
                player_relative: FeatureLayer::new(minimap_size, minimap_size),
            },
            army_supply: 0,
            available_actions: HashSet::from([FunctionId::NO_OP]),
            single_select: Vec::new(),
            multi_select: Vec::new(),
        }
    }

    pub fn is_first(&self) -> bool {
        self.step_type == StepType::First
    }

    pub fn is_last(&self) -> bool {
        self.step_type == StepType::Last
    }

    pub fn is_available(&self, function: FunctionId) -> bool {
        self.available_actions.contains(&function)
    }

    /// True if `unit_type` heads either selection list
    pub fn primary_selection_is(&self, unit_type: UnitTypeId) -> bool {
        let heads = |units: &[SelectedUnit]| units.first().map(|u| u.unit_type) == Some(unit_type);
        heads(&self.single_select) || heads(&self.multi_select)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_of_row_major() {
        let mut layer = FeatureLayer::new(4, 3);
        layer.set(Position::new(3, 0), 7);
        layer.set(Position::new(0, 2), 7);
        layer.set(Position::new(1, 1), 2);

        assert_eq!(
            layer.positions_of(7),
            vec![Position::new(3, 0), Position::new(0, 2)]
        );
        assert_eq!(layer.count_of(7), 2);
        assert!(layer.contains_value(2));
        assert!(!layer.contains_value(9));
    }

    #[test]
    fn test_fill_rect_clips_to_layer() {
        let mut layer = FeatureLayer::new(5, 5);
        layer.fill_rect(Position::new(3, 3), 4, 4, 1);
        assert_eq!(layer.count_of(1), 4);
        assert_eq!(layer.get(Position::new(10, 10)), 0);
    }

    #[test]
    fn test_primary_selection() {
        let mut obs = Observation::empty(84, 64);
        assert!(!obs.primary_selection_is(45));

        obs.multi_select = vec![SelectedUnit { unit_type: 45 }, SelectedUnit { unit_type: 48 }];
        assert!(obs.primary_selection_is(45));
        assert!(!obs.primary_selection_is(48));
    }
}
