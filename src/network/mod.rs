pub mod network;
pub mod settings;
pub mod spec;

pub use network::{Evaluation, LayerSummary, Network};
pub use settings::{AutosaveSettings, NetworkSettings, OutputMode};
pub use spec::{LayerSpec, NetworkSpec};
