pub mod atomic;
pub mod summation;

pub use atomic::AtomicF64;
pub use summation::SummationMode;
