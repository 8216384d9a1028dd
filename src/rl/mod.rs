//! Sparse-reward tabular Q-learning agent
//!
//! # Architecture
//!
//! ```text
//! Observation
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateEncoder (every 4th tick)                              │
//! │  - base, depots, production, army supply                    │
//! │  - hostile presence per minimap quadrant                    │
//! └─────────────────────────────────────────────────────────────┘
//!     │  StateKey
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  QTable                                                     │
//! │  - epsilon-greedy choice over the ActionSpace               │
//! │  - learns from the previous decision (reward 0, or the      │
//! │    terminal reward at episode end)                          │
//! └─────────────────────────────────────────────────────────────┘
//!     │  MacroAction
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ActionExecutor                                             │
//! │  - one primitive per tick for steps 0..4                    │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! Primitive
//! ```
//!
//! The table is loaded once through a [`TableStore`] and written back at the
//! end of every episode.

pub mod action_space;
pub mod agent;
pub mod context;
pub mod encoder;
pub mod executor;
pub mod metrics;
pub mod q_table;
pub mod store;

pub use action_space::{ActionCategory, ActionSpace, MacroAction, split_label};
pub use agent::SparseAgent;
pub use context::{ExecutionContext, STEPS_PER_ACTION};
pub use encoder::{StateEncoder, StateKey, StateVector};
pub use executor::ActionExecutor;
pub use metrics::{EpisodeMetrics, EpisodeOutcome, MovingAverage};
pub use q_table::{NextState, QLearningParams, QTable, TableData};
pub use store::{GzipFileStore, MemoryStore, StoreError, TableStore, load_table};
