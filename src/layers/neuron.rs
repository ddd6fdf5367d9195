use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::summation::SummationMode;
use crate::optim::settings::OptimizerMode;
use crate::optim::state::{OptimizerState, UpdateContext};

/// A single unit: `N_in` input weights followed by a bias.
///
/// The bias is stored as a positive number and subtracted from the weighted
/// sum. While a training session is open the neuron also owns one
/// `OptimizerState` per weight; outside a session that vector is empty and
/// gradient-related calls do nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NeuronRecord", into = "NeuronRecord")]
pub struct Neuron {
    weights: Vec<f64>,
    optimizer: Vec<OptimizerState>,
}

/// On-disk form of a neuron; loading goes through `Neuron::from_weights`.
#[derive(Serialize, Deserialize)]
struct NeuronRecord {
    weights: Vec<f64>,
}

impl TryFrom<NeuronRecord> for Neuron {
    type Error = Error;

    fn try_from(record: NeuronRecord) -> Result<Neuron> {
        Neuron::from_weights(record.weights)
    }
}

impl From<Neuron> for NeuronRecord {
    fn from(neuron: Neuron) -> NeuronRecord {
        NeuronRecord { weights: neuron.weights }
    }
}

impl Neuron {
    /// `n_in` input weights plus a bias, all uniform in `[-1, 1]`.
    pub fn new<R: Rng + ?Sized>(n_in: usize, rng: &mut R) -> Neuron {
        let weights = (0..=n_in).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        Neuron { weights, optimizer: Vec::new() }
    }

    /// Wraps explicit weights; the last entry is the bias.
    pub fn from_weights(weights: Vec<f64>) -> Result<Neuron> {
        if weights.len() < 2 {
            return Err(Error::InvalidWeights(format!(
                "a neuron needs at least one input weight and a bias, got {} values",
                weights.len()
            )));
        }
        Ok(Neuron { weights, optimizer: Vec::new() })
    }

    /// Number of inputs (the bias excluded).
    pub fn input_width(&self) -> usize {
        self.weights.len().saturating_sub(1)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    pub fn weighted_sum(&self, input: &[f64], mode: SummationMode) -> f64 {
        mode.weighted_sum(&self.weights, input)
    }

    pub fn forward(&self, input: &[f64], activation: &ActivationFunction, mode: SummationMode) -> f64 {
        activation.function(self.weighted_sum(input, mode))
    }

    /// Activation derivative at this neuron's weighted sum for `input`.
    pub fn activation_gradient(
        &self,
        input: &[f64],
        activation: &ActivationFunction,
        mode: SummationMode,
    ) -> f64 {
        activation.derivative(self.weighted_sum(input, mode))
    }

    /// Adds this sample's contribution to every weight's gradient.
    ///
    /// Safe to call concurrently for different samples: each accumulator is
    /// updated with an atomic add.
    pub fn accumulate_gradient(
        &self,
        error: f64,
        input: &[f64],
        activation: &ActivationFunction,
        mode: SummationMode,
    ) {
        let Some((bias, scales)) = self.optimizer.split_last() else {
            return;
        };
        let delta = self.activation_gradient(input, activation, mode) * error;
        for (state, x) in scales.iter().zip(input) {
            state.accumulate(x * delta);
        }
        bias.accumulate(-delta);
    }

    /// Moves every weight by its optimizer rule and clears the gradients.
    pub fn apply_update(&mut self, learning_rate: f64, ctx: UpdateContext<'_>) {
        for (w, state) in self.weights.iter_mut().zip(self.optimizer.iter_mut()) {
            state.update(w, learning_rate, ctx);
        }
    }

    /// Snapshot of the accumulated gradients; empty outside a session.
    pub fn gradients(&self) -> Vec<f64> {
        self.optimizer.iter().map(OptimizerState::gradient).collect()
    }

    pub fn is_training(&self) -> bool {
        !self.optimizer.is_empty()
    }

    pub(crate) fn init_training(&mut self, mode: OptimizerMode) {
        self.optimizer = (0..self.weights.len()).map(|_| OptimizerState::new(mode)).collect();
    }

    pub(crate) fn release_training(&mut self) {
        self.optimizer = Vec::new();
    }

    /// `w += U(-1, 1) * speed` for every weight.
    pub fn random_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) {
        if speed == 0.0 {
            return;
        }
        for w in &mut self.weights {
            *w += rng.gen_range(-1.0..=1.0) * speed;
        }
    }

    /// Resamples every weight uniformly within `±|w * speed|` of itself.
    pub fn smart_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) {
        if speed == 0.0 {
            return;
        }
        for w in &mut self.weights {
            let spread = (*w * speed).abs();
            if spread > 0.0 && spread.is_finite() {
                *w = rng.gen_range(*w - spread..=*w + spread);
            }
        }
    }
}
