//! Action executor - decomposes a macro-action into one primitive per tick
//!
//! Each macro-action spans `STEPS_PER_ACTION` ticks. Any unmet precondition
//! (nothing visible to click, function unavailable, building at cap) yields
//! `None` for that tick; the cursor keeps moving regardless.

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::trace;

use crate::infra::{Orientation, Position};
use crate::state::{
    BuildingDescriptor, BuildingRole, Catalog, FunctionId, Observation, Primitive, SelectMode,
    UnitDescriptor, UnitTypeId,
};

use super::action_space::MacroAction;

/// Attack jitter is drawn in whole tiles of this many minimap pixels
pub const ATTACK_JITTER: i32 = 8;
/// Chance, in percent, that a returning worker is sent to gas
pub const GAS_HARVEST_PERCENT: u32 = 20;

pub struct ActionExecutor<'a> {
    catalog: &'a dyn Catalog,
    minimap_size: i32,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(catalog: &'a dyn Catalog, minimap_size: usize) -> Self {
        Self {
            catalog,
            minimap_size: minimap_size as i32,
        }
    }

    pub fn decompose<R: Rng + ?Sized>(
        &self,
        action: MacroAction,
        step: u8,
        obs: &Observation,
        orientation: Orientation,
        rng: &mut R,
    ) -> Option<Primitive> {
        match action {
            MacroAction::NoOp => Some(Primitive::NoOp),
            MacroAction::TrainUnit(i) => {
                let Some(unit) = self.catalog.units().get(i) else {
                    tracing::warn!(index = i, "Train action outside the unit catalog");
                    return None;
                };
                self.train_unit(unit, step, obs)
            }
            MacroAction::BuildBuilding(i) => {
                let Some(building) = self.catalog.buildings().get(i) else {
                    tracing::warn!(index = i, "Build action outside the building catalog");
                    return None;
                };
                self.build(building, step, obs, orientation, rng)
            }
            MacroAction::Attack { x, y } => self.attack(x, y, step, obs, orientation, rng),
        }
    }

    fn train_unit(&self, unit: &UnitDescriptor, step: u8, obs: &Observation) -> Option<Primitive> {
        match step {
            0 => {
                let Some(target) = self.catalog.locate(unit.produced_by, obs) else {
                    trace!(unit = %unit.label, "No production building visible");
                    return None;
                };
                Some(Primitive::SelectPoint {
                    mode: SelectMode::SelectAllOfType,
                    target,
                })
            }
            1 => {
                if !obs.is_available(unit.train) {
                    trace!(unit = %unit.label, "Train function unavailable");
                    return None;
                }
                Some(Primitive::Train {
                    function: unit.train,
                    queued: true,
                })
            }
            _ => None,
        }
    }

    fn build<R: Rng + ?Sized>(
        &self,
        building: &BuildingDescriptor,
        step: u8,
        obs: &Observation,
        orientation: Orientation,
        rng: &mut R,
    ) -> Option<Primitive> {
        match step {
            0 => self.select_worker(obs, rng),
            1 => {
                let count = self.catalog.count(building, obs);
                if count >= building.max_count {
                    trace!(building = %building.label, count, "Building at cap");
                    return None;
                }
                if !obs.is_available(building.build) {
                    trace!(building = %building.label, "Build function unavailable");
                    return None;
                }
                let target = self.catalog.placement(building, obs, orientation)?;
                Some(Primitive::Build {
                    function: building.build,
                    queued: false,
                    target,
                })
            }
            2 => {
                // the gas builder stays on its geyser
                if building.role == BuildingRole::GasExtraction
                    || !obs.is_available(FunctionId::HARVEST_GATHER_SCREEN)
                {
                    return None;
                }
                self.return_worker_to_harvest(obs, rng)
            }
            _ => None,
        }
    }

    fn attack<R: Rng + ?Sized>(
        &self,
        x: i32,
        y: i32,
        step: u8,
        obs: &Observation,
        orientation: Orientation,
        rng: &mut R,
    ) -> Option<Primitive> {
        match step {
            0 => obs
                .is_available(FunctionId::SELECT_ARMY)
                .then_some(Primitive::SelectArmy { queued: false }),
            1 => {
                if obs.primary_selection_is(self.catalog.worker_type()) {
                    trace!("Worker selected, not attacking");
                    return None;
                }
                if !obs.is_available(FunctionId::ATTACK_MINIMAP) {
                    return None;
                }
                let dx = rng.random_range(-1..=1) * ATTACK_JITTER;
                let dy = rng.random_range(-1..=1) * ATTACK_JITTER;
                let target =
                    orientation.transform_location(Position::new(x + dx, y + dy), self.minimap_size);
                Some(Primitive::AttackMinimap {
                    queued: false,
                    target,
                })
            }
            _ => None,
        }
    }

    fn select_worker<R: Rng + ?Sized>(&self, obs: &Observation, rng: &mut R) -> Option<Primitive> {
        let target = random_pixel(obs, self.catalog.worker_type(), rng)?;
        Some(Primitive::SelectPoint {
            mode: SelectMode::Select,
            target,
        })
    }

    /// Assumes the worker that just built is still selected
    fn return_worker_to_harvest<R: Rng + ?Sized>(
        &self,
        obs: &Observation,
        rng: &mut R,
    ) -> Option<Primitive> {
        let resource = if rng.random_range(0..100) < GAS_HARVEST_PERCENT {
            self.catalog.gas_type()
        } else {
            self.catalog.mineral_type()
        };
        let target = random_pixel(obs, resource, rng)?;
        Some(Primitive::HarvestGather {
            queued: true,
            target,
        })
    }
}

/// A uniformly chosen screen pixel showing `unit_type`
fn random_pixel<R: Rng + ?Sized>(
    obs: &Observation,
    unit_type: UnitTypeId,
    rng: &mut R,
) -> Option<Position> {
    obs.screen
        .unit_type
        .positions_of(unit_type)
        .choose(rng)
        .copied()
}
