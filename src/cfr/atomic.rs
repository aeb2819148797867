//! Lock-free `f64` cell for tally slots shared across parallel chance branches.

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` stored as its bit pattern in an [`AtomicU64`].
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    /// Create a new cell.
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    /// Read the current value.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Overwrite the current value.
    #[inline]
    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Add `amount` atomically, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, amount: f64) -> f64 {
        let previous = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + amount).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous)
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_fetch_add() {
        let cell = AtomicF64::new(1.5);
        assert_eq!(cell.fetch_add(-3.0), 1.5);
        assert_eq!(cell.load(), -1.5);
        cell.store(0.0);
        assert_eq!(cell.load(), 0.0);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let cell = AtomicF64::new(0.0);
        (0..10_000).into_par_iter().for_each(|_| {
            cell.fetch_add(1.0);
        });
        assert_eq!(cell.load(), 10_000.0);
    }
}
