use serde::{Deserialize, Serialize};

/// How a list of floating-point terms is reduced to a single sum.
///
/// - `Naive` : terms are added in the order they are produced.
/// - `Sorted`: terms are sorted by ascending absolute value first, so small
///              contributions are combined before a large partial sum can
///              swallow them. Slower, but loses less to cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummationMode {
    #[default]
    Naive,
    Sorted,
}

impl SummationMode {
    /// Sums `terms`, reordering the slice in place when the mode is `Sorted`.
    pub fn sum(self, terms: &mut [f64]) -> f64 {
        if self == SummationMode::Sorted {
            terms.sort_by(|a, b| a.abs().total_cmp(&b.abs()));
        }
        terms.iter().fold(0.0, |acc, &t| acc + t)
    }

    /// `Σ weights[i] * input[i] - bias`.
    ///
    /// `weights` holds one entry per input followed by the bias; the bias is
    /// stored positive and subtracted.
    pub fn weighted_sum(self, weights: &[f64], input: &[f64]) -> f64 {
        let (bias, scales) = match weights.split_last() {
            Some((bias, scales)) => (*bias, scales),
            None => return 0.0,
        };
        match self {
            SummationMode::Naive => {
                let dot = scales.iter().zip(input).fold(0.0, |acc, (w, x)| acc + w * x);
                dot - bias
            }
            SummationMode::Sorted => {
                let mut terms: Vec<f64> = scales.iter().zip(input).map(|(w, x)| w * x).collect();
                terms.push(-bias);
                self.sum(&mut terms)
            }
        }
    }
}
