use tracing::{debug, info, trace};

use crate::rl::{EpisodeOutcome, NextState, StateKey};
use crate::state::Primitive;

use super::game_observer::GameObserver;

/// Logs agent events through `tracing`
#[derive(Debug, Default)]
pub struct DefaultObserver {
    primitives: usize,
    no_ops: usize,
}

impl DefaultObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameObserver for DefaultObserver {
    fn on_episode_start(&mut self, episode: usize) {
        self.primitives = 0;
        self.no_ops = 0;
        info!("Episode {} started", episode);
    }

    fn on_decision(&mut self, state: StateKey, action: usize, label: &str) {
        debug!("state: {}, action: {} ({})", state, label, action);
    }

    fn on_learn(&mut self, state: StateKey, action: usize, reward: f64, next: NextState, value: f64) {
        match next {
            NextState::Terminal => debug!(
                "learn {} a={} r={} -> terminal, q={:.5}",
                state, action, reward, value
            ),
            NextState::State(next) => trace!(
                "learn {} a={} r={} -> {}, q={:.5}",
                state, action, reward, next, value
            ),
        }
    }

    fn on_primitive(&mut self, primitive: &Primitive) {
        self.primitives += 1;
        if primitive.is_no_op() {
            self.no_ops += 1;
        } else {
            trace!("primitive: {}", primitive);
        }
    }

    fn on_episode_finished(&mut self, reward: f64, ticks: usize, outcome: EpisodeOutcome) {
        info!(
            "Episode finished: {:?} (reward {}) after {} ticks, {} of {} primitives were no-ops",
            outcome, reward, ticks, self.no_ops, self.primitives
        );
    }
}
