use crate::state::{Observation, Primitive};

/// The game the agent plays.
///
/// `reset` starts a new episode and returns its first observation; `step`
/// executes one primitive and returns what the agent sees next. An episode
/// ends with an observation whose step type is `Last`.
pub trait Environment {
    type Error: std::error::Error + 'static;

    fn reset(&mut self) -> Result<Observation, Self::Error>;

    fn step(&mut self, primitive: &Primitive) -> Result<Observation, Self::Error>;
}
