use std::path::PathBuf;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::math::summation::SummationMode;
use crate::optim::settings::OptimizerSettings;

/// Transform applied to the final layer's output at inference and
/// evaluation time. Never used while backpropagating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputMode {
    /// Raw activations.
    #[default]
    Identity,
    /// The largest channel becomes 1, every other channel 0.
    WinnerTakeAll,
    /// Channels `>= cutoff` become 1, the rest 0.
    Threshold { cutoff: f64 },
}

impl OutputMode {
    pub fn apply(&self, out: &mut [f64]) {
        match *self {
            OutputMode::Identity => {}
            OutputMode::WinnerTakeAll => {
                let winner = argmax(out);
                for (i, v) in out.iter_mut().enumerate() {
                    *v = if i == winner { 1.0 } else { 0.0 };
                }
            }
            OutputMode::Threshold { cutoff } => {
                for v in out.iter_mut() {
                    *v = if *v >= cutoff { 1.0 } else { 0.0 };
                }
            }
        }
    }
}

/// Index of the first maximum element.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &x)| if x > best.1 { (i, x) } else { best })
        .0
}

/// Periodic snapshot of the network during training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveSettings {
    pub path: PathBuf,
    /// Save every `every` iterations; `0` disables saving.
    pub every: usize,
}

/// Hyperparameters persisted next to the weights so that a restored network
/// trains and predicts exactly like the one that was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Worker threads used by training and evaluation (`0` lets rayon pick).
    pub threads: usize,
    /// Evaluate on the held-out split every `report_every` iterations
    /// (`0` never does).
    pub report_every: usize,
    /// A sample counts as correct when every channel is within this
    /// distance of its target.
    pub tolerance: f64,
    pub output: OutputMode,
    #[serde(deserialize_with = "fraction")]
    test_fraction: f64,
    pub autosave: Option<AutosaveSettings>,
    pub summation: SummationMode,
    pub optimizer: OptimizerSettings,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        NetworkSettings {
            threads: 1,
            report_every: 0,
            tolerance: 0.01,
            output: OutputMode::Identity,
            test_fraction: 0.1,
            autosave: None,
            summation: SummationMode::Naive,
            optimizer: OptimizerSettings::default(),
        }
    }
}

impl NetworkSettings {
    /// Fraction of the dataset held out for evaluation, in `[0, 1]`.
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    pub fn set_test_fraction(&mut self, fraction: f64) {
        self.test_fraction = clamp_fraction(fraction);
    }

    pub fn thread_pool(&self) -> Result<ThreadPool> {
        Ok(ThreadPoolBuilder::new().num_threads(self.threads).build()?)
    }
}

fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn fraction<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_take_all_keeps_first_maximum() {
        let mut out = vec![0.2, 0.9, 0.9, 0.1];
        OutputMode::WinnerTakeAll.apply(&mut out);
        assert_eq!(out, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut out = vec![0.49, 0.5, 0.51];
        OutputMode::Threshold { cutoff: 0.5 }.apply(&mut out);
        assert_eq!(out, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn identity_leaves_output_alone() {
        let mut out = vec![0.3, -2.0];
        OutputMode::Identity.apply(&mut out);
        assert_eq!(out, vec![0.3, -2.0]);
    }

    #[test]
    fn test_fraction_is_clamped() {
        let mut settings = NetworkSettings::default();
        settings.set_test_fraction(1.7);
        assert_eq!(settings.test_fraction(), 1.0);
        settings.set_test_fraction(-0.2);
        assert_eq!(settings.test_fraction(), 0.0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: NetworkSettings = serde_json::from_str(r#"{"threads":4}"#).unwrap();
        assert_eq!(settings.threads, 4);
        assert_eq!(settings.tolerance, 0.01);
        assert_eq!(settings.test_fraction(), 0.1);
        assert_eq!(settings.output, OutputMode::Identity);

        let clamped: NetworkSettings = serde_json::from_str(r#"{"test_fraction":3.0}"#).unwrap();
        assert_eq!(clamped.test_fraction(), 1.0);
    }
}
