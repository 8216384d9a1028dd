//! Scripted single-base skirmish behind the `Environment` trait

use std::collections::HashSet;
use std::convert::Infallible;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::infra::{Environment, Orientation, Position};
use crate::rl::encoder::QUADRANT_SIZE;
use crate::state::{
    BUILD_BARRACKS, BUILD_FACTORY, BUILD_REFINERY, BUILD_STARPORT, BUILD_SUPPLY_DEPOT,
    FeatureLayer, FunctionId, MinimapLayers, Observation, PLAYER_HOSTILE, PLAYER_SELF, Primitive,
    ScreenLayers, SelectMode, SelectedUnit, StepType, TERRAN_BARRACKS, TERRAN_COMMAND_CENTER,
    TERRAN_FACTORY, TERRAN_MARAUDER, TERRAN_MARINE, TERRAN_MEDIVAC, TERRAN_HELLION,
    TERRAN_REFINERY, TERRAN_SCV, TERRAN_STARPORT, TERRAN_SUPPLY_DEPOT, TRAIN_HELLION,
    TRAIN_MARAUDER, TRAIN_MARINE, TRAIN_MEDIVAC, TRAIN_SCV, UnitTypeId,
};

use super::base::Base;

const STARTING_WORKERS: u32 = 12;
const STARTING_MINERALS: u32 = 50;
/// Workers beyond this add no income
const SATURATION: u32 = 16;
const GAS_PER_REFINERY: u32 = 3;
const BASE_SUPPLY: u32 = 15;
const SUPPLY_PER_DEPOT: u32 = 8;
/// The enemy army grows by one supply every this many ticks
const ENEMY_GROWTH_TICKS: usize = 25;
/// The enemy attacks every this many ticks
const RAID_INTERVAL: usize = 100;
/// Edge length of a base marker on the minimap
const MARKER_SIZE: i32 = 8;
const MARKER_INSET: i32 = 8;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub episode_ticks: usize,
    pub minimap_size: usize,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            episode_ticks: 400,
            minimap_size: 64,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Nothing,
    Worker,
    Buildings(UnitTypeId),
    Army,
}

/// Minerals, gas and supply
#[derive(Debug, Clone, Copy)]
struct Cost {
    minerals: u32,
    gas: u32,
    supply: u32,
}

const fn cost(minerals: u32, gas: u32, supply: u32) -> Cost {
    Cost {
        minerals,
        gas,
        supply,
    }
}

/// `(function, building, prerequisite, cost)`
const BUILD_ORDERS: [(FunctionId, UnitTypeId, Option<UnitTypeId>, Cost); 5] = [
    (BUILD_SUPPLY_DEPOT, TERRAN_SUPPLY_DEPOT, None, cost(100, 0, 0)),
    (BUILD_BARRACKS, TERRAN_BARRACKS, Some(TERRAN_SUPPLY_DEPOT), cost(150, 0, 0)),
    (BUILD_REFINERY, TERRAN_REFINERY, None, cost(75, 0, 0)),
    (BUILD_FACTORY, TERRAN_FACTORY, Some(TERRAN_BARRACKS), cost(150, 100, 0)),
    (BUILD_STARPORT, TERRAN_STARPORT, Some(TERRAN_FACTORY), cost(150, 100, 0)),
];

/// `(function, unit, producer, cost)`
const TRAIN_ORDERS: [(FunctionId, UnitTypeId, UnitTypeId, Cost); 5] = [
    (TRAIN_SCV, TERRAN_SCV, TERRAN_COMMAND_CENTER, cost(50, 0, 1)),
    (TRAIN_MARINE, TERRAN_MARINE, TERRAN_BARRACKS, cost(50, 0, 1)),
    (TRAIN_MARAUDER, TERRAN_MARAUDER, TERRAN_BARRACKS, cost(100, 25, 2)),
    (TRAIN_HELLION, TERRAN_HELLION, TERRAN_FACTORY, cost(100, 0, 2)),
    (TRAIN_MEDIVAC, TERRAN_MEDIVAC, TERRAN_STARPORT, cost(100, 100, 2)),
];

/// A deterministic-by-seed stand-in for the real game.
///
/// The agent spawns in the top-left or bottom-right corner with a command
/// center and workers; the enemy sits in the opposite corner and grows
/// stronger over time. An attack on the enemy's quadrant with more army
/// supply than the enemy wins; an enemy raid against a weaker army loses.
/// Reaching the tick limit is a tie.
pub struct ScriptedEnvironment {
    config: SimConfig,
    rng: StdRng,
    orientation: Orientation,
    base: Base,
    army: Vec<(UnitTypeId, u32)>,
    minerals: u32,
    gas: u32,
    enemy_supply: u32,
    selection: Selection,
    tick: usize,
    outcome: Option<f64>,
}

impl ScriptedEnvironment {
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            orientation: Orientation::TopLeft,
            base: Base::new(STARTING_WORKERS),
            army: Vec::new(),
            minerals: STARTING_MINERALS,
            gas: 0,
            enemy_supply: 0,
            selection: Selection::Nothing,
            tick: 0,
            outcome: None,
        }
    }

    /// Corner the agent spawned in this episode
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn army_supply(&self) -> u32 {
        self.army.iter().map(|(_, supply)| supply).sum()
    }

    fn supply_used(&self) -> u32 {
        self.base.workers() + self.army_supply()
    }

    fn supply_cap(&self) -> u32 {
        BASE_SUPPLY + SUPPLY_PER_DEPOT * self.base.count(TERRAN_SUPPLY_DEPOT) as u32
    }

    fn affordable(&self, cost: Cost) -> bool {
        self.minerals >= cost.minerals
            && self.gas >= cost.gas
            && self.supply_used() + cost.supply <= self.supply_cap()
    }

    fn pay(&mut self, cost: Cost) {
        self.minerals -= cost.minerals;
        self.gas -= cost.gas;
    }

    fn available_actions(&self) -> HashSet<FunctionId> {
        let mut available = HashSet::from([FunctionId::NO_OP, FunctionId::SELECT_POINT]);
        if !self.army.is_empty() {
            available.insert(FunctionId::SELECT_ARMY);
        }

        match self.selection {
            Selection::Worker => {
                available.insert(FunctionId::HARVEST_GATHER_SCREEN);
                for (function, _, prerequisite, cost) in BUILD_ORDERS {
                    if prerequisite.is_none_or(|p| self.base.has(p)) && self.affordable(cost) {
                        available.insert(function);
                    }
                }
            }
            Selection::Buildings(producer) => {
                for (function, _, building, cost) in TRAIN_ORDERS {
                    if building == producer && self.affordable(cost) {
                        available.insert(function);
                    }
                }
            }
            Selection::Army => {
                available.insert(FunctionId::ATTACK_MINIMAP);
            }
            Selection::Nothing => {}
        }
        available
    }

    fn apply(&mut self, primitive: &Primitive, screen: &FeatureLayer) {
        match *primitive {
            Primitive::NoOp | Primitive::HarvestGather { .. } => {}
            Primitive::SelectPoint { mode, target } => {
                self.selection = match screen.get(target) {
                    TERRAN_SCV if mode != SelectMode::SelectAllOfType => Selection::Worker,
                    0 => Selection::Nothing,
                    unit_type if self.base.has(unit_type) => Selection::Buildings(unit_type),
                    _ => Selection::Nothing,
                };
            }
            Primitive::SelectArmy { .. } => self.selection = Selection::Army,
            Primitive::Build {
                function, target, ..
            } => {
                let Some((_, building, _, cost)) =
                    BUILD_ORDERS.into_iter().find(|(f, ..)| *f == function)
                else {
                    return;
                };
                if self.base.try_place(building, target) {
                    self.pay(cost);
                    debug!("Built {} at {:?}", building, target);
                } else {
                    trace!("Cannot place {} at {:?}", building, target);
                }
            }
            Primitive::Train { function, .. } => {
                let Some((_, unit, _, cost)) =
                    TRAIN_ORDERS.into_iter().find(|(f, ..)| *f == function)
                else {
                    return;
                };
                self.pay(cost);
                if unit == TERRAN_SCV {
                    self.base.add_worker();
                } else {
                    self.army.push((unit, cost.supply));
                }
            }
            Primitive::AttackMinimap { target, .. } => self.attack(target),
        }
    }

    fn attack(&mut self, target: Position) {
        let enemy_corner = self.enemy_marker();
        let quadrant = |p: Position| (p.x / QUADRANT_SIZE, p.y / QUADRANT_SIZE);
        if quadrant(target) != quadrant(enemy_corner) {
            trace!("Attack at {:?} finds nothing", target);
            return;
        }

        let army = self.army_supply();
        if army > self.enemy_supply {
            debug!("Attack wins: {} against {}", army, self.enemy_supply);
            self.outcome = Some(1.0);
        } else {
            debug!("Attack fails: {} against {}", army, self.enemy_supply);
            self.enemy_supply -= army / 2;
            self.army.clear();
            self.selection = Selection::Nothing;
        }
    }

    fn raid(&mut self) {
        let army = self.army_supply();
        if self.enemy_supply > army {
            debug!("Raid of {} breaks a defense of {}", self.enemy_supply, army);
            self.outcome = Some(-1.0);
        } else {
            self.enemy_supply /= 2;
            self.army.truncate(self.army.len() / 2);
        }
    }

    fn own_marker(&self) -> Position {
        self.marker(self.orientation)
    }

    fn enemy_marker(&self) -> Position {
        let enemy = match self.orientation {
            Orientation::TopLeft => Orientation::Other,
            Orientation::Other => Orientation::TopLeft,
        };
        self.marker(enemy)
    }

    fn marker(&self, corner: Orientation) -> Position {
        let far = self.config.minimap_size as i32 - MARKER_INSET - MARKER_SIZE;
        match corner {
            Orientation::TopLeft => Position::new(MARKER_INSET, MARKER_INSET),
            Orientation::Other => Position::new(far, far),
        }
    }

    fn observe(&self, step_type: StepType) -> Observation {
        let unit_type = self.base.render_unit_types();
        let player_relative = Base::render_player_relative(&unit_type);

        let size = self.config.minimap_size;
        let mut minimap = FeatureLayer::new(size, size);
        minimap.fill_rect(self.own_marker(), MARKER_SIZE, MARKER_SIZE, PLAYER_SELF);
        if self.enemy_supply > 0 {
            minimap.fill_rect(self.enemy_marker(), MARKER_SIZE, MARKER_SIZE, PLAYER_HOSTILE);
        }

        let army: Vec<SelectedUnit> = self
            .army
            .iter()
            .map(|(unit_type, _)| SelectedUnit {
                unit_type: *unit_type,
            })
            .collect();
        let (single_select, multi_select) = match self.selection {
            Selection::Nothing => (Vec::new(), Vec::new()),
            Selection::Worker => (vec![SelectedUnit { unit_type: TERRAN_SCV }], Vec::new()),
            Selection::Buildings(unit_type) => {
                let count = self.base.count(unit_type);
                (Vec::new(), vec![SelectedUnit { unit_type }; count])
            }
            Selection::Army => (Vec::new(), army),
        };

        Observation {
            step_type,
            reward: self.outcome.unwrap_or(0.0),
            screen: ScreenLayers {
                player_relative,
                unit_type,
            },
            minimap: MinimapLayers {
                player_relative: minimap,
            },
            army_supply: self.army_supply(),
            available_actions: self.available_actions(),
            single_select,
            multi_select,
        }
    }
}

impl Environment for ScriptedEnvironment {
    type Error = Infallible;

    fn reset(&mut self) -> Result<Observation, Self::Error> {
        self.orientation = if self.rng.random_bool(0.5) {
            Orientation::TopLeft
        } else {
            Orientation::Other
        };
        self.base = Base::new(STARTING_WORKERS);
        self.army.clear();
        self.minerals = STARTING_MINERALS;
        self.gas = 0;
        self.enemy_supply = 1;
        self.selection = Selection::Nothing;
        self.tick = 0;
        self.outcome = None;

        debug!("Scripted episode starts at {:?}", self.orientation);
        Ok(self.observe(StepType::First))
    }

    fn step(&mut self, primitive: &Primitive) -> Result<Observation, Self::Error> {
        if self.outcome.is_some() {
            return Ok(self.observe(StepType::Last));
        }

        self.tick += 1;
        self.minerals += self.base.workers().min(SATURATION);
        self.gas += GAS_PER_REFINERY * self.base.count(TERRAN_REFINERY) as u32;

        let available = self.available_actions();
        if available.contains(&primitive.function_id()) {
            let screen = self.base.render_unit_types();
            self.apply(primitive, &screen);
        } else {
            trace!("Unavailable primitive {} ignored", primitive);
        }

        if self.tick % ENEMY_GROWTH_TICKS == 0 {
            self.enemy_supply += 1;
        }
        if self.outcome.is_none() && self.tick % RAID_INTERVAL == 0 {
            self.raid();
        }
        if self.outcome.is_none() && self.tick >= self.config.episode_ticks {
            self.outcome = Some(0.0);
        }

        let step_type = if self.outcome.is_some() {
            StepType::Last
        } else {
            StepType::Mid
        };
        Ok(self.observe(step_type))
    }
}
