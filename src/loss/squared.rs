/// Half the summed squared error, the objective minimized by backpropagation.
pub struct SquaredError;

impl SquaredError {
    /// `0.5 * Σ (predicted - expected)²`
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        0.5 * predicted
            .iter()
            .zip(expected)
            .map(|(p, y)| (p - y) * (p - y))
            .sum::<f64>()
    }

    /// Error signal fed into the last layer: `predicted - expected`.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected).map(|(p, y)| p - y).collect()
    }
}
