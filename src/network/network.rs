use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activation::activation::ActivationFunction;
use crate::data::dataset::{Dataset, Sample};
use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::loss::absolute::AbsoluteError;
use crate::network::settings::NetworkSettings;
use crate::train::session::TrainingSession;

/// Result of running a network over a labelled dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean over samples of the summed absolute channel error.
    pub error: f64,
    /// Samples whose every channel was within the network's tolerance.
    pub correct: usize,
    pub total: usize,
}

/// Shape of one layer, as reported by [`Network::summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub input_width: usize,
    pub output_width: usize,
    pub activation: ActivationFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub settings: NetworkSettings,
    layers: Vec<Layer>,
}

impl Network {
    /// Builds sigmoid layers between consecutive `widths`; `widths[0]` is the
    /// input width and the last entry the output width.
    pub fn new<R: Rng + ?Sized>(widths: &[usize], rng: &mut R) -> Result<Network> {
        if widths.len() < 2 {
            return Err(Error::EmptyNetwork);
        }
        if let Some(&bad) = widths.iter().find(|&&w| w == 0) {
            return Err(Error::InvalidWidth(bad));
        }
        let layers = widths
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], Some(ActivationFunction::Sigmoid), rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Network { settings: NetworkSettings::default(), layers })
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        let network = Network { settings: NetworkSettings::default(), layers };
        network.validate()?;
        Ok(network)
    }

    /// Appends a layer whose input width must match the current output width.
    pub fn push_layer(&mut self, layer: Layer) -> Result<()> {
        layer.validate()?;
        if let Some(last) = self.layers.last() {
            if last.output_width() != layer.input_width() {
                return Err(Error::shape("layer input", last.output_width(), layer.input_width()));
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Checks every layer and the chaining of consecutive layers.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::EmptyNetwork);
        }
        for layer in &self.layers {
            layer.validate()?;
        }
        for pair in self.layers.windows(2) {
            if pair[0].output_width() != pair[1].input_width() {
                return Err(Error::shape("layer input", pair[0].output_width(), pair[1].input_width()));
            }
        }
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers can be edited in place but never resized through this slice.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_width)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_width)
    }

    /// Raw output of the last layer, without output post-processing.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self.forward_unchecked(input))
    }

    /// Output with the configured `OutputMode` applied.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self.predict_unchecked(input))
    }

    /// `predict` over many inputs on a pool built from `settings.threads`;
    /// output order matches input order.
    pub fn predict_many(&self, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let pool = self.settings.thread_pool()?;
        self.predict_many_in(&pool, inputs)
    }

    /// `predict_many` on an existing pool.
    pub fn predict_many_in(&self, pool: &ThreadPool, inputs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        for input in inputs {
            self.check_input(input)?;
        }
        Ok(pool.install(|| inputs.par_iter().map(|x| self.predict_unchecked(x)).collect()))
    }

    /// Evaluates on `dataset` using a pool built from `settings.threads`.
    /// Callers evaluating repeatedly should build one pool and use
    /// [`evaluate_in`](Self::evaluate_in).
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Evaluation> {
        let pool = self.settings.thread_pool()?;
        self.evaluate_in(&pool, dataset)
    }

    pub fn evaluate_in(&self, pool: &ThreadPool, dataset: &Dataset) -> Result<Evaluation> {
        self.check_dataset(dataset)?;
        if dataset.is_empty() {
            return Ok(Evaluation { error: 0.0, correct: 0, total: 0 });
        }
        let tolerance = self.settings.tolerance;
        let per_sample: Vec<(f64, bool)> = pool.install(|| {
            dataset
                .samples()
                .par_iter()
                .map(|s| {
                    let out = self.predict_unchecked(s.input());
                    (
                        AbsoluteError::total(&out, s.target()),
                        AbsoluteError::all_within(&out, s.target(), tolerance),
                    )
                })
                .collect()
        });

        let total = per_sample.len();
        let error = per_sample.iter().map(|p| p.0).sum::<f64>() / total as f64;
        let correct = per_sample.iter().filter(|p| p.1).count();
        Ok(Evaluation { error, correct, total })
    }

    /// Adds `U(-1, 1) * speed` to every weight. Layers mutate in parallel on
    /// a pool of `settings.threads` workers, each layer with its own
    /// generator seeded from `rng`, so the result does not depend on the
    /// thread count.
    pub fn random_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) -> Result<()> {
        let pool = self.settings.thread_pool()?;
        self.random_mutate_in(&pool, speed, rng);
        Ok(())
    }

    pub fn random_mutate_in<R: Rng + ?Sized>(&mut self, pool: &ThreadPool, speed: f64, rng: &mut R) {
        self.mutate_layers(pool, rng, |layer, seeded| layer.random_mutate(speed, seeded));
    }

    /// Resamples every weight within `±|w * speed|` of itself, layers in
    /// parallel as in [`random_mutate`](Self::random_mutate).
    pub fn smart_mutate<R: Rng + ?Sized>(&mut self, speed: f64, rng: &mut R) -> Result<()> {
        let pool = self.settings.thread_pool()?;
        self.smart_mutate_in(&pool, speed, rng);
        Ok(())
    }

    pub fn smart_mutate_in<R: Rng + ?Sized>(&mut self, pool: &ThreadPool, speed: f64, rng: &mut R) {
        self.mutate_layers(pool, rng, |layer, seeded| layer.smart_mutate(speed, seeded));
    }

    fn mutate_layers<R, F>(&mut self, pool: &ThreadPool, rng: &mut R, mutate: F)
    where
        R: Rng + ?Sized,
        F: Fn(&mut Layer, &mut ChaCha8Rng) + Sync + Send,
    {
        let seeds: Vec<u64> = self.layers.iter().map(|_| rng.gen()).collect();
        let layers = &mut self.layers;
        pool.install(|| {
            layers.par_iter_mut().zip(seeds).for_each(|(layer, seed)| {
                mutate(layer, &mut ChaCha8Rng::seed_from_u64(seed));
            });
        });
    }

    /// Opens a training session; optimizer state lives until it is dropped.
    pub fn begin_training(&mut self) -> Result<TrainingSession<'_>> {
        TrainingSession::begin(self)
    }

    pub fn summary(&self) -> Vec<LayerSummary> {
        self.layers
            .iter()
            .map(|l| LayerSummary {
                input_width: l.input_width(),
                output_width: l.output_width(),
                activation: *l.activation(),
            })
            .collect()
    }

    pub fn log_summary(&self) {
        for (i, layer) in self.summary().iter().enumerate() {
            info!(
                layer = i,
                inputs = layer.input_width,
                outputs = layer.output_width,
                activation = layer.activation.name(),
                "layer"
            );
        }
        info!(settings = ?self.settings, "network settings");
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Network> {
        let network: Network = serde_json::from_str(json)?;
        network.validate()?;
        Ok(network)
    }

    /// Serializes weights, activations and settings to a pretty-printed JSON
    /// file. Optimizer state is never written.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by
    /// `save_json` and re-checks its shape.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let reader = BufReader::new(File::open(path)?);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }

    fn forward_unchecked(&self, input: &[f64]) -> Vec<f64> {
        let mode = self.settings.summation;
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current, mode);
        }
        current
    }

    fn predict_unchecked(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.forward_unchecked(input);
        self.settings.output.apply(&mut out);
        out
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_width() {
            return Err(Error::shape("network input", self.input_width(), input.len()));
        }
        Ok(())
    }

    pub(crate) fn check_sample(&self, sample: &Sample) -> Result<()> {
        self.check_input(sample.input())?;
        if sample.target().len() != self.output_width() {
            return Err(Error::shape("network output", self.output_width(), sample.target().len()));
        }
        Ok(())
    }

    /// Checks that `dataset` matches the network's input and output widths.
    pub fn check_dataset(&self, dataset: &Dataset) -> Result<()> {
        match dataset.samples().first() {
            Some(sample) => self.check_sample(sample),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::summation::SummationMode;
    use crate::network::settings::OutputMode;

    fn seeded() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1234)
    }

    #[test]
    fn new_chains_sigmoid_layers() {
        let net = Network::new(&[3, 5, 2], &mut seeded()).unwrap();
        assert_eq!(net.layers().len(), 2);
        assert_eq!(net.input_width(), 3);
        assert_eq!(net.output_width(), 2);
        assert!(net.layers().iter().all(|l| *l.activation() == ActivationFunction::Sigmoid));
    }

    #[test]
    fn rejects_bad_architectures() {
        assert!(matches!(Network::new(&[3], &mut seeded()), Err(Error::EmptyNetwork)));
        assert!(matches!(Network::new(&[3, 0, 1], &mut seeded()), Err(Error::InvalidWidth(0))));

        let mut rng = seeded();
        let a = Layer::new(2, 3, None, &mut rng).unwrap();
        let b = Layer::new(4, 1, None, &mut rng).unwrap();
        assert!(matches!(Network::from_layers(vec![a.clone(), b.clone()]), Err(Error::ShapeMismatch { .. })));

        let mut net = Network::from_layers(vec![a]).unwrap();
        assert!(net.push_layer(b).is_err());
        assert!(net.push_layer(Layer::new(3, 1, None, &mut rng).unwrap()).is_ok());
    }

    #[test]
    fn forward_rejects_wrong_input_width() {
        let net = Network::new(&[2, 2, 1], &mut seeded()).unwrap();
        assert!(matches!(net.forward(&[1.0]), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn forward_is_deterministic_across_thread_counts() {
        let mut net = Network::new(&[4, 8, 8, 3], &mut seeded()).unwrap();
        net.settings.summation = SummationMode::Sorted;
        let inputs: Vec<Vec<f64>> = (0..32)
            .map(|i| (0..4).map(|j| ((i * 4 + j) as f64 * 0.37).sin()).collect())
            .collect();

        let single: Vec<Vec<f64>> = inputs.iter().map(|x| net.forward(x).unwrap()).collect();
        let again: Vec<Vec<f64>> = inputs.iter().map(|x| net.forward(x).unwrap()).collect();
        assert_eq!(single, again);

        net.settings.threads = 1;
        assert_eq!(net.predict_many(&inputs).unwrap(), single);
        net.settings.threads = 4;
        assert_eq!(net.predict_many(&inputs).unwrap(), single);
    }

    #[test]
    fn predict_applies_output_mode_but_forward_does_not() {
        let layer = Layer::from_weights(
            vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.5, 0.0]],
            Some(ActivationFunction::Identity),
        )
        .unwrap();
        let mut net = Network::from_layers(vec![layer]).unwrap();
        net.settings.output = OutputMode::WinnerTakeAll;
        assert_eq!(net.forward(&[1.0]).unwrap(), vec![1.0, 2.0, 0.5]);
        assert_eq!(net.predict(&[1.0]).unwrap(), vec![0.0, 1.0, 0.0]);

        net.settings.output = OutputMode::Threshold { cutoff: 0.75 };
        assert_eq!(net.predict(&[1.0]).unwrap(), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn evaluate_counts_samples_within_tolerance() {
        let layer = Layer::from_weights(vec![vec![1.0, 0.0]], Some(ActivationFunction::Identity)).unwrap();
        let mut net = Network::from_layers(vec![layer]).unwrap();
        net.settings.tolerance = 0.1;
        let data = Dataset::from_pairs(
            &[vec![1.0], vec![2.0], vec![3.0]],
            &[vec![1.05], vec![2.5], vec![3.0]],
        )
        .unwrap();
        let eval = net.evaluate(&data).unwrap();
        assert_eq!(eval.total, 3);
        assert_eq!(eval.correct, 2);
        assert!((eval.error - 0.55 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_speed_mutations_leave_weights_unchanged() {
        let mut net = Network::new(&[3, 4, 2], &mut seeded()).unwrap();
        let before: Vec<_> = net.layers().iter().map(Layer::weights).collect();
        let mut rng = seeded();
        net.random_mutate(0.0, &mut rng).unwrap();
        net.smart_mutate(0.0, &mut rng).unwrap();
        let after: Vec<_> = net.layers().iter().map(Layer::weights).collect();
        assert_eq!(before, after);

        net.random_mutate(0.5, &mut rng).unwrap();
        let moved: Vec<_> = net.layers().iter().map(Layer::weights).collect();
        assert_ne!(before, moved);
    }

    #[test]
    fn mutations_do_not_depend_on_thread_count() {
        let base = Network::new(&[3, 5, 4, 2], &mut seeded()).unwrap();
        let mutated = |threads: usize| {
            let mut net = base.clone();
            net.settings.threads = threads;
            let mut rng = ChaCha8Rng::seed_from_u64(21);
            net.random_mutate(0.3, &mut rng).unwrap();
            net.smart_mutate(0.3, &mut rng).unwrap();
            net.layers().iter().map(Layer::weights).collect::<Vec<_>>()
        };
        assert_eq!(mutated(1), mutated(4));
    }

    #[test]
    fn json_round_trip_preserves_output() {
        let mut net = Network::new(&[3, 4, 2], &mut seeded()).unwrap();
        net.layers_mut()[0].set_activation(ActivationFunction::Elu { alpha: 0.3 });
        net.settings.summation = SummationMode::Sorted;
        net.settings.output = OutputMode::Threshold { cutoff: 0.4 };
        net.settings.set_test_fraction(0.25);

        let restored = Network::from_json(&net.to_json().unwrap()).unwrap();
        let input = [0.1, -0.7, 2.3];
        assert_eq!(restored.forward(&input).unwrap(), net.forward(&input).unwrap());
        assert_eq!(restored.settings, net.settings);
        assert_eq!(restored.summary(), net.summary());
    }

    #[test]
    fn loading_rejects_mismatched_layers() {
        let json = r#"{
            "layers": [
                {"activation": {"name": "relu"}, "neurons": [{"weights": [1.0, 2.0, 0.0]}]},
                {"activation": {"name": "sigmoid"}, "neurons": [{"weights": [1.0, 1.0, 0.0]}]}
            ]
        }"#;
        assert!(matches!(Network::from_json(json), Err(Error::ShapeMismatch { .. })));
        let unknown = r#"{"layers": [{"activation": {"name": "swish"}, "neurons": [{"weights": [1.0, 0.0]}]}]}"#;
        assert!(matches!(Network::from_json(unknown), Err(Error::Json(_))));
        let no_weights = r#"{"layers": [{"activation": {"name": "sigmoid"}, "neurons": [{"weights": []}]}]}"#;
        assert!(matches!(Network::from_json(no_weights), Err(Error::Json(_))));
        let bias_only = r#"{"layers": [{"activation": {"name": "sigmoid"}, "neurons": [{"weights": [0.5]}]}]}"#;
        assert!(matches!(Network::from_json(bias_only), Err(Error::Json(_))));
    }
}
