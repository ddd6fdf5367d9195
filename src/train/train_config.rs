use std::sync::mpsc;

use crate::train::iteration_stats::IterationStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `iterations`   : number of batches drawn and applied
/// - `learning_rate`: step size handed to every update rule
/// - `batch_size`   : samples per batch; `0` uses the whole training split
/// - `seed`         : seeds the split and batch draws; `None` uses entropy
/// - `progress_tx`  : optional channel; one `IterationStats` per iteration.
///   A dropped receiver does not stop training.
pub struct TrainConfig {
    pub iterations: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<IterationStats>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no seed and no progress channel.
    pub fn new(iterations: usize, learning_rate: f64, batch_size: usize) -> Self {
        TrainConfig {
            iterations,
            learning_rate,
            batch_size,
            seed: None,
            progress_tx: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<IterationStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}
