use serde::{Deserialize, Deserializer, Serialize};

/// Which update rule every weight of a network uses while training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerMode {
    /// `w -= lr * g`
    #[default]
    Sgd,
    /// Classical momentum with coefficient `gamma`.
    #[serde(alias = "nesterov")]
    Momentum,
    /// Adam with bias-corrected first and second moments.
    Adam,
}

/// Momentum coefficient. Always inside `[0.01, 0.99]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumSettings {
    #[serde(deserialize_with = "unit_interval")]
    gamma: f64,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        MomentumSettings { gamma: 0.9 }
    }
}

impl MomentumSettings {
    pub fn new(gamma: f64) -> MomentumSettings {
        MomentumSettings { gamma: clamp_unit(gamma) }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.gamma = clamp_unit(gamma);
    }
}

/// Adam coefficients.
///
/// `beta1` and `beta2` outside `(0, 1)` are pulled to `0.01` or `0.99`, and a
/// non-positive `epsilon` becomes `0.01`. `reset_after` bounds the shared
/// step counter: once it is reached the per-weight moments are cleared and
/// the counter wraps back to zero. `0` disables the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamSettings {
    #[serde(deserialize_with = "unit_interval")]
    beta1: f64,
    #[serde(deserialize_with = "unit_interval")]
    beta2: f64,
    #[serde(deserialize_with = "positive")]
    epsilon: f64,
    reset_after: u64,
}

impl Default for AdamSettings {
    fn default() -> Self {
        AdamSettings {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            reset_after: 1000,
        }
    }
}

impl AdamSettings {
    pub fn new(beta1: f64, beta2: f64, epsilon: f64, reset_after: u64) -> AdamSettings {
        AdamSettings {
            beta1: clamp_unit(beta1),
            beta2: clamp_unit(beta2),
            epsilon: clamp_positive(epsilon),
            reset_after,
        }
    }

    pub fn beta1(&self) -> f64 {
        self.beta1
    }

    pub fn beta2(&self) -> f64 {
        self.beta2
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn reset_after(&self) -> u64 {
        self.reset_after
    }

    pub fn set_beta1(&mut self, beta1: f64) {
        self.beta1 = clamp_unit(beta1);
    }

    pub fn set_beta2(&mut self, beta2: f64) {
        self.beta2 = clamp_unit(beta2);
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = clamp_positive(epsilon);
    }

    pub fn set_reset_after(&mut self, reset_after: u64) {
        self.reset_after = reset_after;
    }
}

/// Optimizer choice plus the coefficients of every rule, so that switching
/// modes keeps previously configured values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub mode: OptimizerMode,
    pub momentum: MomentumSettings,
    pub adam: AdamSettings,
}

impl OptimizerSettings {
    pub fn sgd() -> OptimizerSettings {
        OptimizerSettings::default()
    }

    pub fn momentum(gamma: f64) -> OptimizerSettings {
        OptimizerSettings {
            mode: OptimizerMode::Momentum,
            momentum: MomentumSettings::new(gamma),
            ..OptimizerSettings::default()
        }
    }

    pub fn adam(adam: AdamSettings) -> OptimizerSettings {
        OptimizerSettings {
            mode: OptimizerMode::Adam,
            adam,
            ..OptimizerSettings::default()
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value <= 0.0 || value.is_nan() {
        0.01
    } else if value >= 1.0 {
        0.99
    } else {
        value
    }
}

fn clamp_positive(value: f64) -> f64 {
    if value > 0.0 { value } else { 0.01 }
}

fn unit_interval<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_unit)
}

fn positive<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(clamp_positive)
}
