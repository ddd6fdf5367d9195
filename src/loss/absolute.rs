/// Per-sample absolute error used when scoring held-out data.
pub struct AbsoluteError;

impl AbsoluteError {
    /// `Σ |predicted - expected|` over all channels.
    pub fn total(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected).map(|(p, y)| (p - y).abs()).sum()
    }

    /// True when every channel is strictly closer than `tolerance`.
    pub fn all_within(predicted: &[f64], expected: &[f64], tolerance: f64) -> bool {
        predicted
            .iter()
            .zip(expected)
            .all(|(p, y)| (p - y).abs() < tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_channels() {
        assert!((AbsoluteError::total(&[0.5, -1.0], &[0.0, 1.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn within_needs_every_channel() {
        assert!(AbsoluteError::all_within(&[0.1, 0.95], &[0.0, 1.0], 0.2));
        assert!(!AbsoluteError::all_within(&[0.1, 0.5], &[0.0, 1.0], 0.2));
        assert!(!AbsoluteError::all_within(&[0.2], &[0.0], 0.2));
    }
}
