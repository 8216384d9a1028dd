mod default_observer;
mod environment;
mod game_observer;
mod types;

pub use default_observer::DefaultObserver;
pub use environment::Environment;
pub use game_observer::{GameObserver, NullObserver};
pub use types::{Bounds, Orientation, Position};
