use crate::{
    data::dataset::Dataset,
    error::Result,
    network::network::Network,
    train::loop_fn::{train_loop, TrainSummary},
    train::train_config::TrainConfig,
};

/// Trains on paired inputs and targets with full-batch updates.
///
/// Uses the network's own settings for the held-out split, reporting and
/// optimizer; see `train_loop` for finer control.
pub fn train_network(
    network: &mut Network,
    inputs: &[Vec<f64>],
    expected_outputs: &[Vec<f64>],
    learning_rate: f64,
    iterations: usize,
) -> Result<TrainSummary> {
    let dataset = Dataset::from_pairs(inputs, expected_outputs)?;
    train_loop(network, &dataset, &TrainConfig::new(iterations, learning_rate, 0))
}
