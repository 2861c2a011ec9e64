//! Request counters for an entropy context.

use crate::error::EntropyError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated on every request.
#[derive(Debug, Default)]
pub struct ContextStats {
    requests: AtomicU64,
    bytes_served: AtomicU64,
    registry_full: AtomicU64,
    no_source: AtomicU64,
    too_large: AtomicU64,
    conditioning_failures: AtomicU64,
    source_failures: AtomicU64,
}

/// Point-in-time copy of [`ContextStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Total `get` calls.
    pub requests: u64,
    /// Total conditioned bytes handed to callers.
    pub bytes_served: u64,
    /// Rejected registrations.
    pub registry_full: u64,
    /// Requests made with no source registered.
    pub no_source: u64,
    /// Requests larger than one block.
    pub too_large: u64,
    /// Cipher initialization or encryption failures.
    pub conditioning_failures: u64,
    /// Requests aborted by a failing source.
    pub source_failures: u64,
}

impl StatsSnapshot {
    /// Total failed requests.
    pub fn failures(&self) -> u64 {
        self.no_source + self.too_large + self.conditioning_failures + self.source_failures
    }
}

impl ContextStats {
    pub(crate) fn record_get(&self, result: &Result<usize, EntropyError>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(len) => {
                self.bytes_served.fetch_add(*len as u64, Ordering::Relaxed);
                return;
            }
            Err(EntropyError::NoSource) => &self.no_source,
            Err(EntropyError::RequestTooLarge { .. }) => &self.too_large,
            Err(EntropyError::Conditioning(_)) => &self.conditioning_failures,
            Err(EntropyError::SourceFailed { .. }) => &self.source_failures,
            Err(EntropyError::RegistryFull { .. }) => &self.registry_full,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_registry_full(&self) {
        self.registry_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
            registry_full: self.registry_full.load(Ordering::Relaxed),
            no_source: self.no_source.load(Ordering::Relaxed),
            too_large: self.too_large.load(Ordering::Relaxed),
            conditioning_failures: self.conditioning_failures.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let stats = ContextStats::default();

        stats.record_get(&Ok(16));
        stats.record_get(&Ok(4));
        stats.record_get(&Err(EntropyError::NoSource));
        stats.record_get(&Err(EntropyError::RequestTooLarge {
            requested: 20,
            max: 16,
        }));
        stats.record_registry_full();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests, 4);
        assert_eq!(snapshot.bytes_served, 20);
        assert_eq!(snapshot.no_source, 1);
        assert_eq!(snapshot.too_large, 1);
        assert_eq!(snapshot.registry_full, 1);
        assert_eq!(snapshot.failures(), 2);
    }
}
