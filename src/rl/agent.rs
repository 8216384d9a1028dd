//! The sparse-reward agent loop
//!
//! One call to [`SparseAgent::step`] per environment tick. A macro-action is
//! chosen every `STEPS_PER_ACTION` ticks and decomposed into one primitive per
//! tick in between. The only reward is the terminal one; intermediate
//! decisions learn from each other with reward 0.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error};

use crate::config::AgentConfig;
use crate::infra::{DefaultObserver, GameObserver, Orientation};
use crate::state::{Catalog, Observation, Primitive};

use super::action_space::ActionSpace;
use super::context::ExecutionContext;
use super::encoder::{StateEncoder, StateKey};
use super::executor::ActionExecutor;
use super::metrics::EpisodeMetrics;
use super::q_table::{NextState, QTable};
use super::store::{TableStore, load_table};

pub struct SparseAgent {
    catalog: Box<dyn Catalog>,
    action_space: ActionSpace,
    table: QTable,
    store: Box<dyn TableStore>,
    observer: Box<dyn GameObserver>,
    rng: StdRng,
    metrics: EpisodeMetrics,
    minimap_size: usize,
    /// Ticks seen in the current episode
    ticks: usize,
}

impl SparseAgent {
    /// Build the action space and load the table it indexes
    pub fn new(config: &AgentConfig, catalog: Box<dyn Catalog>, mut store: Box<dyn TableStore>) -> Self {
        let action_space = ActionSpace::build(catalog.as_ref(), config.minimap_size);
        let table = load_table(
            store.as_mut(),
            action_space.labels().to_vec(),
            config.q_learning(),
        );
        debug!(
            "Agent ready: {} actions, {} known states",
            action_space.len(),
            table.len()
        );

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            catalog,
            action_space,
            table,
            store,
            observer: Box::new(DefaultObserver::new()),
            rng,
            metrics: EpisodeMetrics::default(),
            minimap_size: config.minimap_size,
            ticks: 0,
        }
    }

    pub fn with_observer(mut self, observer: impl GameObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.metrics
    }

    pub fn start_episode(&mut self, episode: usize) {
        self.ticks = 0;
        self.observer.on_episode_start(episode);
    }

    #[tracing::instrument(level = "trace", skip_all, fields(step = ctx.step_number()))]
    pub fn step(&mut self, ctx: &mut ExecutionContext, obs: &Observation) -> Primitive {
        self.ticks += 1;

        if obs.is_last() {
            return self.finish_episode(ctx, obs.reward);
        }

        let orientation = match ctx.orientation() {
            Some(orientation) if !obs.is_first() => orientation,
            _ => {
                let orientation = StateEncoder::detect_orientation(obs);
                debug!("Base orientation: {:?}", orientation);
                ctx.set_orientation(orientation);
                orientation
            }
        };

        if ctx.step_number() == 0 {
            self.decide(ctx, obs, orientation);
        }

        let step = ctx.advance();
        let primitive = ctx
            .previous_action()
            .and_then(|index| self.action_space.get(index))
            .and_then(|action| {
                ActionExecutor::new(self.catalog.as_ref(), self.minimap_size).decompose(
                    action,
                    step,
                    obs,
                    orientation,
                    &mut self.rng,
                )
            })
            .unwrap_or(Primitive::NoOp);

        self.observer.on_primitive(&primitive);
        primitive
    }

    /// Encode, learn from the previous decision, choose the next one
    fn decide(&mut self, ctx: &mut ExecutionContext, obs: &Observation, orientation: Orientation) {
        let state = StateEncoder::encode(obs, orientation, self.catalog.as_ref()).key();

        if let Some((previous, action)) = ctx.previous_decision() {
            self.learn(previous, action, 0.0, NextState::State(state));
        }

        let action = self.table.choose_action(state, &mut self.rng);
        ctx.record_decision(state, action);

        let label = self.action_space.label(action).unwrap_or("?");
        self.observer.on_decision(state, action, label);
    }

    fn learn(&mut self, state: StateKey, action: usize, reward: f64, next: NextState) {
        let value = self.table.learn(state, action, reward, next);
        self.observer.on_learn(state, action, reward, next, value);
    }

    fn finish_episode(&mut self, ctx: &mut ExecutionContext, reward: f64) -> Primitive {
        match ctx.previous_decision() {
            Some((previous, action)) => self.learn(previous, action, reward, NextState::Terminal),
            None => debug!("Episode ended before any decision, nothing to learn"),
        }

        let result = self.store.persist(self.table.data());
        if let Err(e) = &result {
            error!("Failed to persist Q-table: {}", e);
        }
        self.observer.on_persist(&result);

        let outcome = self.metrics.record_episode(reward, self.ticks);
        self.metrics.log_summary();
        self.observer.on_episode_finished(reward, self.ticks, outcome);

        self.ticks = 0;
        ctx.reset();
        Primitive::NoOp
    }
}
