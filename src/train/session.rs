use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use crate::data::dataset::{Dataset, Sample};
use crate::error::Result;
use crate::layers::dense::Layer;
use crate::loss::squared::SquaredError;
use crate::math::summation::SummationMode;
use crate::network::network::{Evaluation, Network};
use crate::optim::state::{AdamClock, UpdateContext};

/// A network with optimizer state attached to every weight.
///
/// The state is created by [`Network::begin_training`] and released when the
/// session is dropped, leaving the network usable for inference. Gradients
/// accumulate across calls to [`accumulate`](Self::accumulate) until
/// [`apply_update`](Self::apply_update) consumes them.
pub struct TrainingSession<'n> {
    network: &'n mut Network,
    pool: ThreadPool,
    clock: AdamClock,
}

impl<'n> TrainingSession<'n> {
    pub(crate) fn begin(network: &'n mut Network) -> Result<TrainingSession<'n>> {
        network.validate()?;
        let pool = network.settings.thread_pool()?;
        let mode = network.settings.optimizer.mode;
        for layer in network.layers_mut() {
            layer.init_training(mode);
        }
        debug!(optimizer = ?mode, threads = pool.current_num_threads(), "training session started");
        Ok(TrainingSession { network, pool, clock: AdamClock::new() })
    }

    pub fn network(&self) -> &Network {
        &*self.network
    }

    /// Adam time step the next update will use.
    pub fn step_count(&self) -> u64 {
        self.clock.step()
    }

    /// Backpropagates every sample of `batch` in parallel, adding into the
    /// per-weight accumulators. Returns the batch's mean squared-error loss.
    pub fn accumulate(&self, batch: &[&Sample]) -> Result<f64> {
        for sample in batch {
            self.network.check_sample(sample)?;
        }
        if batch.is_empty() {
            return Ok(0.0);
        }
        let network: &Network = &*self.network;
        let mode = network.settings.summation;
        let losses: Vec<f64> = self.pool.install(|| {
            batch
                .par_iter()
                .map(|sample| backpropagate_sample(network.layers(), sample, mode))
                .collect()
        });
        Ok(losses.iter().sum::<f64>() / losses.len() as f64)
    }

    /// Moves every weight against its accumulated gradient, clears the
    /// accumulators and advances the Adam clock.
    pub fn apply_update(&mut self, learning_rate: f64) {
        let TrainingSession { network, pool, clock } = self;
        let settings = network.settings.optimizer;
        let ctx = UpdateContext { settings: &settings, step: clock.step() };
        let layers = network.layers_mut();
        pool.install(|| {
            layers
                .par_iter_mut()
                .for_each(|layer| layer.apply_update(learning_rate, ctx));
        });
        clock.advance(settings.adam.reset_after());
    }

    /// `accumulate` followed by `apply_update`.
    pub fn step(&mut self, batch: &[&Sample], learning_rate: f64) -> Result<f64> {
        let loss = self.accumulate(batch)?;
        self.apply_update(learning_rate);
        Ok(loss)
    }

    pub fn evaluate(&self, dataset: &Dataset) -> Result<Evaluation> {
        self.network.evaluate_in(&self.pool, dataset)
    }

    /// Ends the session, releasing optimizer state.
    pub fn finish(self) {}
}

impl Drop for TrainingSession<'_> {
    fn drop(&mut self) {
        for layer in self.network.layers_mut() {
            layer.release_training();
        }
        debug!(steps = self.clock.step(), "training session released");
    }
}

/// Forward pass keeping each layer's input, then the backward pass from the
/// squared-error signal at the output.
fn backpropagate_sample(layers: &[Layer], sample: &Sample, mode: SummationMode) -> f64 {
    let mut inputs: Vec<Vec<f64>> = Vec::with_capacity(layers.len());
    let mut current = sample.input().to_vec();
    for layer in layers {
        let next = layer.forward(&current, mode);
        inputs.push(current);
        current = next;
    }

    let loss = SquaredError::loss(&current, sample.target());
    let mut error = SquaredError::derivative(&current, sample.target());
    for (i, (layer, input)) in layers.iter().zip(&inputs).enumerate().rev() {
        if i == 0 {
            layer.accumulate_gradients(&error, input, mode);
        } else {
            layer.backpropagate(&mut error, input, mode);
        }
    }
    loss
}
