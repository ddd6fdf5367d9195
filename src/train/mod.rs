pub mod evolve;
pub mod iteration_stats;
pub mod loop_fn;
pub mod session;
pub mod train_config;
pub mod trainer;

pub use evolve::{hill_climb, MutationConfig, MutationKind};
pub use iteration_stats::IterationStats;
pub use loop_fn::{train_loop, TrainSummary};
pub use session::TrainingSession;
pub use train_config::TrainConfig;
pub use trainer::train_network;
