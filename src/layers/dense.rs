use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::neuron::Neuron;
use crate::math::summation::SummationMode;
use crate::optim::settings::OptimizerMode;
use crate::optim::state::UpdateContext;

/// A fully-connected layer: an ordered list of neurons sharing one
/// activation. Neuron `i` produces output channel `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    activation: ActivationFunction,
    neurons: Vec<Neuron>,
}

impl Layer {
    /// `size` neurons with `input_size` random weights each (plus bias).
    /// Without an explicit activation the layer uses sigmoid.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        size: usize,
        activation: Option<ActivationFunction>,
        rng: &mut R,
    ) -> Result<Layer> {
        if input_size == 0 {
            return Err(Error::InvalidWidth(input_size));
        }
        if size == 0 {
            return Err(Error::InvalidWidth(size));
        }
        let neurons = (0..size).map(|_| Neuron::new(input_size, rng)).collect();
        Ok(Layer {
            activation: activation.unwrap_or_default(),
            neurons,
        })
    }

    /// One row of weights per neuron, each ending with the bias.
    pub fn from_weights(rows: Vec<Vec<f64>>, activation: Option<ActivationFunction>) -> Result<Layer> {
        let neurons = rows
            .into_iter()
            .map(Neuron::from_weights)
            .collect::<Result<Vec<_>>>()?;
        let layer = Layer {
            activation: activation.unwrap_or_default(),
            neurons,
        };
        layer.validate()?;
        Ok(layer)
    }

    /// Checks that the layer has neurons and that they agree on input width.
    pub fn validate(&self) -> Result<()> {
        let first = self.neurons.first().ok_or(Error::InvalidWidth(0))?;
        let width = first.input_width();
        if width == 0 {
            return Err(Error::InvalidWidth(0));
        }
        for neuron in &self.neurons[1..] {
            if neuron.input_width() != width {
                return Err(Error::shape("neuron input", width, neuron.input_width()));
            }
        }
        Ok(())
    }

    pub fn input_width(&self) -> usize {
        self.neurons.first().map_or(0, Neuron::input_width)
    }

    pub fn output_width(&self) -> usize {
        self.neurons.len()
    }

    pub fn activation(&self) -> &ActivationFunction {
        &self.activation
    }

    pub fn set_activation(&mut self, activation: ActivationFunction) {
        self.activation = activation;
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }

    /// Copy of the weight matrix, one row per neuron.
    pub fn weights(&self) -> Vec<Vec<f64>> {
        self.neurons.iter().map(|n| n.weights().to_vec()).collect()
    }

    pub fn forward(&self, input: &[f64], mode: SummationMode) -> Vec<f64> {
        self.neurons
            .iter()
            .map(|n| n.forward(input, &self.activation, mode))
            .collect()
    }

    /// Error with respect to this layer's inputs:
    /// `out[i] = Σ_j error[j] * f'(sum_j) * w_j[i]`.
    ///
    /// Must run before the weights of this iteration are updated.
    pub fn backward_error(&self, error: &[f64], input: &[f64], mode: SummationMode) -> Vec<f64> {
        let scaled: Vec<f64> = self
            .neurons
            .iter()
            .zip(error)
            .map(|(n, e)| e * n.activation_gradient(input, &self.activation, mode))
            .collect();

        let mut terms = vec![0.0; self.neurons.len()];
        (0..self.input_width())
            .map(|i| {
                for ((term, n), s) in terms.iter_mut().zip(&self.neurons).zip(&scaled) {
                    *term = s * n.weights()[i];
                }
                mode.sum(&mut terms)
            })
            .collect()
    }

    /// One backprop step: accumulates every neuron's gradient for the
    /// incoming `error` and replaces it with the error for the previous layer.
    pub fn backpropagate(&self, error: &mut Vec<f64>, input: &[f64], mode: SummationMode) {
        let propagated = self.backward_error(error, input, mode);
        self.accumulate_gradients(error, input, mode);
        *error = propagated;
    }

    /// Accumulates gradients without computing the previous layer's error.
    pub fn accumulate_gradients(&self, error: &[f64], input: &[f64], mode: SummationMode) {
        for (n, e) in self.neurons.iter().zip(error) {
            n.accumulate_gradient(*e, input, &self.activation, mode);
        }
    }

    pub fn apply_update(&mut self, learning_rate: f64, ctx: UpdateContext<'_>) {
        self.neurons
            .par_iter_mut()
            .for_each(|n| n.apply_update(learning_rate, ctx));
    }

    pub fn random_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) {
        for n in &mut self.neurons {
            n.random_mutate(speed, rng);
        }
    }

    pub fn smart_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) {
        for n in &mut self.neurons {
            n.smart_mutate(speed, rng);
        }
    }

    pub(crate) fn init_training(&mut self, mode: OptimizerMode) {
        for n in &mut self.neurons {
            n.init_training(mode);
        }
    }

    pub(crate) fn release_training(&mut self) {
        for n in &mut self.neurons {
            n.release_training();
        }
    }
}
