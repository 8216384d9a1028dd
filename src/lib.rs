pub mod config;
pub mod game;
pub mod infra;
pub mod rl;
pub mod sim;
pub mod state;

// Re-export commonly used types for convenience
pub use config::AgentConfig;
pub use game::Game;
pub use infra::{Environment, GameObserver, Orientation, Position};
pub use rl::{ExecutionContext, SparseAgent};
