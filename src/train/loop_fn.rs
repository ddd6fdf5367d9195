use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::network::network::{Evaluation, Network};
use crate::train::iteration_stats::IterationStats;
use crate::train::train_config::TrainConfig;

/// Outcome of a `train_loop` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub iterations: usize,
    /// Batch loss of the last iteration.
    pub train_loss: f64,
    /// Last held-out evaluation, if any ran.
    pub evaluation: Option<Evaluation>,
}

/// Trains `network` on `dataset` for `config.iterations` batches.
///
/// The dataset is shuffled and split by the network's `test_fraction`. When
/// the training part is empty or smaller than one batch, the whole dataset is
/// used for training instead. The held-out part is evaluated every
/// `report_every` iterations and on the last one.
///
/// Optimizer state exists only for the duration of the call.
///
/// # Errors
/// `EmptyDataset` for an empty dataset, `ShapeMismatch` when sample widths do
/// not match the network, `ThreadPool` when the worker pool cannot be built.
pub fn train_loop(network: &mut Network, dataset: &Dataset, config: &TrainConfig) -> Result<TrainSummary> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    network.check_dataset(dataset)?;

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let (mut train, test) = dataset.split(network.settings.test_fraction(), &mut rng);
    if train.is_empty() || train.len() < config.batch_size {
        warn!(
            train = train.len(),
            batch_size = config.batch_size,
            "training split smaller than one batch; training on the whole dataset"
        );
        train = dataset.clone();
    }

    let report_every = network.settings.report_every;
    let autosave = network.settings.autosave.clone();
    info!(
        train = train.len(),
        test = test.len(),
        iterations = config.iterations,
        batch_size = config.batch_size,
        "training started"
    );

    let mut session = network.begin_training()?;
    let mut train_loss = 0.0;
    let mut evaluation = None;

    for iteration in 1..=config.iterations {
        let t_start = Instant::now();

        let batch = train.draw(config.batch_size, &mut rng);
        train_loss = session.step(&batch, config.learning_rate)?;

        let report_due = report_every != 0
            && !test.is_empty()
            && (iteration % report_every == 0 || iteration == config.iterations);
        let eval = if report_due { Some(session.evaluate(&test)?) } else { None };
        if let Some(e) = eval {
            info!(
                iteration,
                train_loss,
                error = e.error,
                correct = e.correct,
                total = e.total,
                "held-out evaluation"
            );
            evaluation = Some(e);
        }

        let stats = IterationStats {
            iteration,
            total_iterations: config.iterations,
            train_loss,
            test_error: eval.map(|e| e.error),
            correct: eval.map(|e| e.correct),
            test_size: test.len(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        if let Some(ref tx) = config.progress_tx {
            let _ = tx.send(stats);
        }

        if let Some(ref save) = autosave {
            if save.every != 0 && iteration % save.every == 0 {
                if let Err(err) = session.network().save_json(&save.path) {
                    warn!(path = %save.path.display(), error = %err, "autosave failed");
                }
            }
        }
    }

    session.finish();
    Ok(TrainSummary { iterations: config.iterations, train_loss, evaluation })
}
