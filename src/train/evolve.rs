use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::network::network::Network;

/// Which mutation operator `hill_climb` applies to each candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// `w += U(-1, 1) * speed`
    #[default]
    Random,
    /// `w ← U(w - |w·speed|, w + |w·speed|)`
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    pub iterations: usize,
    pub speed: f64,
    pub kind: MutationKind,
    pub seed: Option<u64>,
}

impl MutationConfig {
    pub fn new(iterations: usize, speed: f64, kind: MutationKind) -> Self {
        MutationConfig { iterations, speed, kind, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Gradient-free (1+1) search: mutate a copy of `network`, keep it when its
/// error on `dataset` is no worse. Returns the error of the final network.
pub fn hill_climb(network: &mut Network, dataset: &Dataset, config: &MutationConfig) -> Result<f64> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let pool = network.settings.thread_pool()?;
    let mut best = network.evaluate_in(&pool, dataset)?.error;
    let mut accepted = 0usize;

    for _ in 0..config.iterations {
        let mut candidate = network.clone();
        match config.kind {
            MutationKind::Random => candidate.random_mutate_in(&pool, config.speed, &mut rng),
            MutationKind::Smart => candidate.smart_mutate_in(&pool, config.speed, &mut rng),
        }
        let error = candidate.evaluate_in(&pool, dataset)?.error;
        if error <= best {
            *network = candidate;
            best = error;
            accepted += 1;
        }
    }

    debug!(iterations = config.iterations, accepted, error = best, "hill climb finished");
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Dataset {
        let inputs: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64 / 12.0, 1.0 - i as f64 / 12.0]).collect();
        let targets: Vec<Vec<f64>> = inputs.iter().map(|x| vec![0.3 + 0.4 * x[0]]).collect();
        Dataset::from_pairs(&inputs, &targets).unwrap()
    }

    #[test]
    fn error_never_increases() {
        let data = data();
        for kind in [MutationKind::Random, MutationKind::Smart] {
            let mut network = Network::new(&[2, 3, 1], &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
            let start = network.evaluate(&data).unwrap().error;
            let config = MutationConfig::new(60, 0.2, kind).with_seed(13);
            let end = hill_climb(&mut network, &data, &config).unwrap();
            assert!(end <= start);
            assert_eq!(network.evaluate(&data).unwrap().error, end);
        }
    }

    #[test]
    fn zero_speed_keeps_the_network() {
        let data = data();
        let mut network = Network::new(&[2, 1], &mut ChaCha8Rng::seed_from_u64(2)).unwrap();
        let before = network.layers()[0].weights();
        hill_climb(&mut network, &data, &MutationConfig::new(5, 0.0, MutationKind::Random).with_seed(1)).unwrap();
        assert_eq!(network.layers()[0].weights(), before);
    }
}
