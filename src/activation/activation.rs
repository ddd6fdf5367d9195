use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::error::{Error, Result};

/// Stand-in for a saturated value whose closed form overflowed.
const SATURATED: f64 = 1e-13;
/// Stand-in for a derivative whose closed form overflowed.
const FLAT: f64 = 1e-10;
/// Stand-in for a gaussian value whose closed form overflowed.
const GAUSSIAN_FLOOR: f64 = 1e-9;

/// Scalar activation applied by every neuron of a layer.
///
/// The set of variants is closed. Each variant is identified by the name
/// returned from [`ActivationFunction::name`] plus its parameter list, which
/// is also how it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "ActivationRecord", into = "ActivationRecord")]
pub enum ActivationFunction {
    #[default]
    Sigmoid,
    Sinusoid,
    Gaussian,
    ReLU,
    Identity,
    Tanh,
    Arctan,
    Elu { alpha: f64 },
}

impl ActivationFunction {
    /// Every recognised name, in declaration order.
    pub const NAMES: [&'static str; 8] = [
        "sigmoid", "sinusoid", "gaussian", "relu", "identity", "tanh", "arctan", "elu",
    ];

    /// Builds an activation from its persisted name and parameters.
    ///
    /// `elu` reads its alpha from `parameters[0]` and falls back to `1.0`;
    /// every other variant ignores `parameters`.
    pub fn from_name(name: &str, parameters: &[f64]) -> Result<ActivationFunction> {
        let activation = match name {
            "sigmoid" => ActivationFunction::Sigmoid,
            "sinusoid" => ActivationFunction::Sinusoid,
            "gaussian" => ActivationFunction::Gaussian,
            "relu" => ActivationFunction::ReLU,
            "identity" => ActivationFunction::Identity,
            "tanh" => ActivationFunction::Tanh,
            "arctan" => ActivationFunction::Arctan,
            "elu" => ActivationFunction::Elu {
                alpha: parameters.first().copied().unwrap_or(1.0),
            },
            other => return Err(Error::UnknownActivation(other.to_string())),
        };
        Ok(activation)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Sinusoid => "sinusoid",
            ActivationFunction::Gaussian => "gaussian",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Identity => "identity",
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::Arctan => "arctan",
            ActivationFunction::Elu { .. } => "elu",
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        match self {
            ActivationFunction::Elu { alpha } => vec![*alpha],
            _ => Vec::new(),
        }
    }

    /// Element-wise activation. Never returns NaN or infinity for a finite
    /// input.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let y = 1.0 / (1.0 + (-x).exp());
                if y.is_finite() {
                    y
                } else if x > 0.0 {
                    1.0
                } else {
                    SATURATED
                }
            }
            ActivationFunction::Sinusoid => x.sin(),
            ActivationFunction::Gaussian => {
                let y = (-x * x).exp();
                if y.is_finite() { y } else { GAUSSIAN_FLOOR }
            }
            ActivationFunction::ReLU => if x < 0.0 { 0.0 } else { x },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => {
                let y = x.tanh();
                if y.is_finite() {
                    y
                } else if x > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            ActivationFunction::Arctan => {
                let y = x.atan();
                if y.is_finite() {
                    y
                } else if x > 0.0 {
                    FRAC_PI_2
                } else {
                    -FRAC_PI_2
                }
            }
            ActivationFunction::Elu { alpha } => {
                if x >= 0.0 {
                    return x;
                }
                let y = alpha * (x.exp() - 1.0);
                if y.is_finite() { y } else { -alpha }
            }
        }
    }

    /// Element-wise derivative, evaluated at the pre-activation sum.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let e = (-x).exp();
                let d = e / ((1.0 + e) * (1.0 + e));
                if d.is_finite() { d } else { FLAT }
            }
            ActivationFunction::Sinusoid => x.cos(),
            ActivationFunction::Gaussian => {
                let d = -2.0 * x * (-x * x).exp();
                if d.is_finite() {
                    d
                } else if x < 0.0 {
                    FLAT
                } else {
                    -FLAT
                }
            }
            ActivationFunction::ReLU => if x < 0.0 { 0.0 } else { 1.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let fx = self.function(x);
                let d = 1.0 - fx * fx;
                if d == 0.0 { SATURATED } else { d }
            }
            ActivationFunction::Arctan => 1.0 / (x * x + 1.0),
            ActivationFunction::Elu { alpha } => {
                if x >= 0.0 {
                    return 1.0;
                }
                // On the negative branch f'(x) = alpha * e^x = f(x) + alpha.
                let d = self.function(x) + alpha;
                if d == 0.0 { SATURATED } else { d }
            }
        }
    }
}

/// Persisted shape of an activation: `{ "name": ..., "parameters": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActivationRecord {
    name: String,
    #[serde(default)]
    parameters: Vec<f64>,
}

impl TryFrom<ActivationRecord> for ActivationFunction {
    type Error = Error;

    fn try_from(record: ActivationRecord) -> Result<Self> {
        ActivationFunction::from_name(&record.name, &record.parameters)
    }
}

impl From<ActivationFunction> for ActivationRecord {
    fn from(activation: ActivationFunction) -> Self {
        ActivationRecord {
            name: activation.name().to_string(),
            parameters: activation.parameters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [ActivationFunction; 8] = [
        ActivationFunction::Sigmoid,
        ActivationFunction::Sinusoid,
        ActivationFunction::Gaussian,
        ActivationFunction::ReLU,
        ActivationFunction::Identity,
        ActivationFunction::Tanh,
        ActivationFunction::Arctan,
        ActivationFunction::Elu { alpha: 0.7 },
    ];

    fn central_difference(f: &ActivationFunction, x: f64) -> f64 {
        let h = 1e-6;
        (f.function(x + h) - f.function(x - h)) / (2.0 * h)
    }

    #[test]
    fn derivatives_match_central_difference() {
        // Kinks at 0 (relu, elu) are skipped on purpose.
        let xs = [-800.0, -40.0, -3.3, -1.2, -0.4, 0.3, 0.9, 2.5, 17.0, 800.0];
        for f in ALL {
            for &x in &xs {
                let analytic = f.derivative(x);
                let numeric = central_difference(&f, x);
                assert!(
                    (analytic - numeric).abs() < 1e-5,
                    "{} at {x}: analytic {analytic}, numeric {numeric}",
                    f.name()
                );
            }
        }
    }

    #[test]
    fn large_inputs_hit_the_guards() {
        let sigmoid = ActivationFunction::Sigmoid;
        assert_eq!(sigmoid.derivative(-1000.0), FLAT);
        assert_eq!(ActivationFunction::Tanh.derivative(1000.0), SATURATED);
        assert_eq!(ActivationFunction::Tanh.function(-1000.0), -1.0);
        let elu = ActivationFunction::Elu { alpha: 1.0 };
        assert_eq!(elu.derivative(-1000.0), SATURATED);
        assert_eq!(elu.function(-1000.0), -1.0);
    }

    #[test]
    fn relu_and_identity_are_exact() {
        assert_eq!(ActivationFunction::ReLU.function(-2.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.function(3.5), 3.5);
        assert_eq!(ActivationFunction::ReLU.derivative(-0.1), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.0), 1.0);
        assert_eq!(ActivationFunction::Identity.derivative(123.0), 1.0);
    }

    #[test]
    fn from_name_accepts_every_known_name() {
        for name in ActivationFunction::NAMES {
            let f = ActivationFunction::from_name(name, &[]).unwrap();
            assert_eq!(f.name(), name);
        }
    }

    #[test]
    fn from_name_rejects_unknown_names() {
        let err = ActivationFunction::from_name("softplus", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownActivation(ref n) if n == "softplus"));
    }

    #[test]
    fn elu_defaults_alpha_to_one() {
        let f = ActivationFunction::from_name("elu", &[]).unwrap();
        assert_eq!(f, ActivationFunction::Elu { alpha: 1.0 });
        let g = ActivationFunction::from_name("elu", &[0.25]).unwrap();
        assert_eq!(g.parameters(), vec![0.25]);
    }

    #[test]
    fn serializes_as_name_and_parameters() {
        let json = serde_json::to_string(&ActivationFunction::Elu { alpha: 0.5 }).unwrap();
        assert_eq!(json, r#"{"name":"elu","parameters":[0.5]}"#);
        let back: ActivationFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActivationFunction::Elu { alpha: 0.5 });
        assert!(serde_json::from_str::<ActivationFunction>(r#"{"name":"nope"}"#).is_err());
    }

    proptest! {
        #[test]
        fn value_and_derivative_stay_finite(x in -1.0e6f64..1.0e6) {
            for f in ALL {
                prop_assert!(f.function(x).is_finite());
                prop_assert!(f.derivative(x).is_finite());
            }
        }
    }
}
