use serde::{Deserialize, Serialize};

/// Per-iteration report emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, one value is
/// sent after every iteration. Held-out fields are only filled on iterations
/// that ran an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    pub total_iterations: usize,
    /// Mean squared-error loss of this iteration's batch.
    pub train_loss: f64,
    /// Mean absolute held-out error, when evaluated.
    pub test_error: Option<f64>,
    /// Held-out samples within tolerance, when evaluated.
    pub correct: Option<usize>,
    pub test_size: usize,
    /// Wall-clock duration of this iteration in milliseconds.
    pub elapsed_ms: u64,
}
