pub mod absolute;
pub mod squared;

pub use absolute::AbsoluteError;
pub use squared::SquaredError;
