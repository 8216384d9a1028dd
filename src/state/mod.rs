mod catalog;
mod observation;
mod primitive;

pub use catalog::*;
pub use observation::{
    FeatureLayer, MinimapLayers, Observation, PLAYER_HOSTILE, PLAYER_SELF, ScreenLayers,
    SelectedUnit, StepType, UnitTypeId,
};
pub use primitive::{FunctionId, Primitive, SelectMode};
