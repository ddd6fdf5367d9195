use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` cell supporting lock-free read-modify-write from many threads.
///
/// Stored as raw bits in an `AtomicU64`; `fetch_add` retries a
/// compare-exchange until no concurrent writer intervened, so no addition is
/// ever lost.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> AtomicF64 {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Adds `delta` and returns the previous value.
    pub fn fetch_add(&self, delta: f64) -> f64 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.0.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Replaces the value with `0.0` and returns what was there.
    pub fn take(&mut self) -> f64 {
        f64::from_bits(std::mem::replace(self.0.get_mut(), 0.0f64.to_bits()))
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        AtomicF64::new(self.load())
    }
}
