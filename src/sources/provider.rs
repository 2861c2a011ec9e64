//! The noise source abstraction.
//!
//! Every provider, whether it samples a hardware peripheral or a test
//! fixture, is driven through the same call: fill a buffer, report how
//! many bytes were written.

use thiserror::Error;

/// Errors a noise source can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source initialization failed: {0}")]
    InitFailed(String),
    #[error("hardware read failed: {0}")]
    Hardware(String),
    #[error("sampling timed out after {elapsed_ms} ms ({remaining} measurements outstanding)")]
    Timeout { elapsed_ms: u64, remaining: usize },
    #[error("source produced {written} of {requested} bytes")]
    ShortRead { written: usize, requested: usize },
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// A provider of raw, possibly biased noise bytes.
///
/// Implementations must attempt to fill the whole buffer and return the
/// number of bytes written. Sampling takes `&self` so a registered source
/// can be shared across threads; sources with internal state guard it
/// themselves.
pub trait NoiseSource: Send + Sync {
    /// Fills `buf` with noise and returns the number of bytes written.
    fn sample(&self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Short human-readable name used in logs and errors.
    fn name(&self) -> &str {
        "external"
    }
}

impl<F> NoiseSource for F
where
    F: Fn(&mut [u8]) -> Result<usize, SourceError> + Send + Sync,
{
    fn sample(&self, buf: &mut [u8]) -> Result<usize, SourceError> {
        self(buf)
    }
}
