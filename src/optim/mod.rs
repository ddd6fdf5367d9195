pub mod settings;
pub mod state;

pub use settings::{AdamSettings, MomentumSettings, OptimizerMode, OptimizerSettings};
pub use state::{AdamClock, OptimizerState, UpdateContext, UpdateRule};
