pub mod activation;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use data::dataset::{Dataset, Sample};
pub use error::{Error, Result};
pub use layers::dense::Layer;
pub use math::summation::SummationMode;
pub use network::network::{Evaluation, Network};
pub use network::settings::{AutosaveSettings, NetworkSettings, OutputMode};
pub use network::spec::{LayerSpec, NetworkSpec};
pub use optim::settings::{AdamSettings, OptimizerMode, OptimizerSettings};
pub use train::evolve::{hill_climb, MutationConfig, MutationKind};
pub use train::loop_fn::{train_loop, TrainSummary};
pub use train::session::TrainingSession;
pub use train::train_config::TrainConfig;
pub use train::trainer::train_network;
