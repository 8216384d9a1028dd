use crate::rl::{EpisodeOutcome, NextState, StateKey, StoreError};
use crate::state::Primitive;

/// Trait for observing agent events during execution.
///
/// Every hook has an empty default so observers only implement what they use.
pub trait GameObserver {
    /// Called when a new episode starts
    fn on_episode_start(&mut self, _episode: usize) {}

    /// Called when a macro-action is chosen at the start of a decomposition
    fn on_decision(&mut self, _state: StateKey, _action: usize, _label: &str) {}

    /// Called after every Q-table update with the new value
    fn on_learn(&mut self, _state: StateKey, _action: usize, _reward: f64, _next: NextState, _value: f64) {}

    /// Called with the primitive issued for a tick
    fn on_primitive(&mut self, _primitive: &Primitive) {}

    /// Called after the table was written at the end of an episode
    fn on_persist(&mut self, _result: &Result<(), StoreError>) {}

    /// Called when an episode finishes
    fn on_episode_finished(&mut self, _reward: f64, _ticks: usize, _outcome: EpisodeOutcome) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {}
