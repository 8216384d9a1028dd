//! Scripted environment used by the binary and the end-to-end tests

mod base;
mod env;

pub use base::SCREEN_SIZE;
pub use env::{ScriptedEnvironment, SimConfig};
