//! Deterministic stand-in sources.
//!
//! These provide no entropy at all. They exist so the conditioner can be
//! exercised with known inputs and so failure paths can be triggered on
//! demand.

use super::{NoiseSource, SourceError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source that repeats a fixed byte pattern on every call.
#[derive(Debug)]
pub struct FixedSource {
    pattern: Vec<u8>,
    calls: AtomicU64,
}

impl FixedSource {
    /// Creates a source that cycles through `pattern`.
    ///
    /// An empty pattern yields zero bytes.
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
            calls: AtomicU64::new(0),
        }
    }

    /// Source that fills every byte with `value`.
    pub fn repeat(value: u8) -> Self {
        Self::new(vec![value])
    }

    /// Returns how many times the source has been sampled.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl NoiseSource for FixedSource {
    fn sample(&self, buf: &mut [u8]) -> Result<usize, SourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.pattern.is_empty() {
            buf.fill(0);
        } else {
            for (b, p) in buf.iter_mut().zip(self.pattern.iter().cycle()) {
                *b = *p;
            }
        }
        Ok(buf.len())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Source that always fails with the configured error.
#[derive(Debug, Clone)]
pub struct FailingSource {
    error: SourceError,
}

impl FailingSource {
    pub fn new(error: SourceError) -> Self {
        Self { error }
    }
}

impl Default for FailingSource {
    fn default() -> Self {
        Self::new(SourceError::Unavailable("failing source".into()))
    }
}

impl NoiseSource for FailingSource {
    fn sample(&self, _buf: &mut [u8]) -> Result<usize, SourceError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_cycles_pattern() {
        let source = FixedSource::new([1u8, 2, 3]);
        let mut buf = [0u8; 7];

        assert_eq!(source.sample(&mut buf), Ok(7));
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_empty_pattern_zero_fills() {
        let source = FixedSource::new(Vec::new());
        let mut buf = [0xFFu8; 4];

        source.sample(&mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn test_failing_source() {
        let source = FailingSource::default();
        let mut buf = [0u8; 4];

        assert!(matches!(
            source.sample(&mut buf),
            Err(SourceError::Unavailable(_))
        ));
    }
}
