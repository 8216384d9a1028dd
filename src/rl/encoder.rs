//! State encoder - reduces an observation to a coarse 8-feature state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infra::Orientation;
use crate::state::{BuildingRole, Catalog, FeatureLayer, Observation, PLAYER_HOSTILE, PLAYER_SELF};

pub const STATE_LEN: usize = 8;
pub const QUADRANT_COUNT: usize = 4;
/// Edge length of one minimap quadrant
pub const QUADRANT_SIZE: i32 = 32;
const QUADRANTS_PER_ROW: usize = 2;
const QUADRANT_OFFSET: usize = STATE_LEN - QUADRANT_COUNT;

/// `[has_command_center, supply_depots, production_buildings, army_supply, q0, q1, q2, q3]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateVector([u16; STATE_LEN]);

impl StateVector {
    pub fn new(values: [u16; STATE_LEN]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[u16; STATE_LEN] {
        &self.0
    }

    pub fn has_command_center(&self) -> bool {
        self.0[0] != 0
    }

    pub fn supply_depots(&self) -> u16 {
        self.0[1]
    }

    pub fn production_buildings(&self) -> u16 {
        self.0[2]
    }

    pub fn army_supply(&self) -> u16 {
        self.0[3]
    }

    pub fn hostile_quadrants(&self) -> [u16; QUADRANT_COUNT] {
        let mut flags = [0; QUADRANT_COUNT];
        flags.copy_from_slice(&self.0[QUADRANT_OFFSET..]);
        flags
    }

    pub fn key(&self) -> StateKey {
        StateKey::from(*self)
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Exact-match table key: the eight features packed 16 bits apiece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey(u128);

impl StateKey {
    pub fn vector(&self) -> StateVector {
        let mut values = [0u16; STATE_LEN];
        for (i, value) in values.iter_mut().enumerate() {
            *value = (self.0 >> (16 * i)) as u16;
        }
        StateVector(values)
    }
}

impl From<StateVector> for StateKey {
    fn from(state: StateVector) -> Self {
        let packed = state
            .0
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, v)| acc | (u128::from(*v) << (16 * i)));
        StateKey(packed)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.vector(), f)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateEncoder;

impl StateEncoder {
    /// Top-left if the agent's own minimap pixels sit in the upper half on
    /// average. With nothing of ours visible the answer is `Other`.
    pub fn detect_orientation(obs: &Observation) -> Orientation {
        let layer = &obs.minimap.player_relative;
        let own = layer.positions_of(PLAYER_SELF);
        if own.is_empty() {
            return Orientation::Other;
        }

        let mean_row = own.iter().map(|p| f64::from(p.y)).sum::<f64>() / own.len() as f64;
        let upper_half_limit = layer.height() as f64 / 2.0 - 1.0;
        if mean_row <= upper_half_limit {
            Orientation::TopLeft
        } else {
            Orientation::Other
        }
    }

    pub fn encode(obs: &Observation, orientation: Orientation, catalog: &dyn Catalog) -> StateVector {
        let mut values = [0u16; STATE_LEN];

        values[0] = u16::from(
            obs.screen
                .unit_type
                .contains_value(catalog.command_center_type()),
        );
        values[1] = saturate(catalog.role_count(BuildingRole::Supply, obs));
        values[2] = saturate(catalog.role_count(BuildingRole::Production, obs));
        values[3] = u16::try_from(obs.army_supply).unwrap_or(u16::MAX);

        let quadrants = Self::hostile_quadrants(&obs.minimap.player_relative, orientation);
        values[QUADRANT_OFFSET..].copy_from_slice(&quadrants);

        StateVector(values)
    }

    /// Binary hostile-presence flags per minimap quadrant, row-major from the
    /// top-left. Reversed for `Other` so both starts read the same.
    pub fn hostile_quadrants(minimap: &FeatureLayer, orientation: Orientation) -> [u16; QUADRANT_COUNT] {
        let mut flags = [0u16; QUADRANT_COUNT];

        for pos in minimap.positions_of(PLAYER_HOSTILE) {
            let row = quadrant_of(pos.y);
            let col = quadrant_of(pos.x);
            let index = (row - 1) * QUADRANTS_PER_ROW + (col - 1);
            if col <= QUADRANTS_PER_ROW && index < QUADRANT_COUNT {
                flags[index] = 1;
            }
        }

        if !orientation.is_top_left() {
            flags.reverse();
        }
        flags
    }
}

/// 1-based quadrant of a pixel coordinate: `ceil((c + 1) / 32)`
fn quadrant_of(coordinate: i32) -> usize {
    ((coordinate + 1) as u32).div_ceil(QUADRANT_SIZE as u32) as usize
}

fn saturate(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}
