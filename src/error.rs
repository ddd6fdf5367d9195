use thiserror::Error;

/// Errors surfaced while building, validating, training or persisting a
/// network. Numeric degeneracy inside activations is never reported here;
/// it is absorbed by the activation guards.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),

    #[error("layer widths must be positive (got {0})")]
    InvalidWidth(usize),

    #[error("a network needs at least one layer")]
    EmptyNetwork,

    #[error("shape mismatch: {context} expects width {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(context: &'static str, expected: usize, actual: usize) -> Error {
        Error::ShapeMismatch { context, expected, actual }
    }
}
