//! Per-episode execution context, passed explicitly into every tick

use crate::infra::Orientation;

use super::encoder::StateKey;

/// Number of ticks one macro-action is decomposed over
pub const STEPS_PER_ACTION: u8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    previous_state: Option<StateKey>,
    previous_action: Option<usize>,
    step_number: u8,
    orientation: Option<Orientation>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_state(&self) -> Option<StateKey> {
        self.previous_state
    }

    pub fn previous_action(&self) -> Option<usize> {
        self.previous_action
    }

    /// The last decision as a `(state, action)` pair
    pub fn previous_decision(&self) -> Option<(StateKey, usize)> {
        self.previous_state.zip(self.previous_action)
    }

    pub fn step_number(&self) -> u8 {
        self.step_number
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = Some(orientation);
    }

    /// Cache a fresh top-level decision. A different action restarts the
    /// decomposition at step 0.
    pub fn record_decision(&mut self, state: StateKey, action: usize) {
        if self.previous_action != Some(action) {
            self.step_number = 0;
        }
        self.previous_state = Some(state);
        self.previous_action = Some(action);
    }

    /// Step to decompose this tick; the cursor then moves on, wrapping at
    /// `STEPS_PER_ACTION`.
    pub fn advance(&mut self) -> u8 {
        let step = self.step_number;
        self.step_number = (step + 1) % STEPS_PER_ACTION;
        step
    }

    /// Forget the episode: no previous decision, step 0, orientation unknown
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
