//! Errors reported by the accumulator.
//!
//! Every failure is a value: nothing on the request path panics or
//! aborts, because on a device without an OS a missing seed has to be
//! something the caller can retry or report.

use crate::conditioning::CipherError;
use crate::sources::SourceError;
use thiserror::Error;

/// Errors returned by [`EntropyContext`](crate::EntropyContext) and
/// [`EntropyConditioner`](crate::EntropyConditioner).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntropyError {
    #[error("source registry full ({capacity} sources)")]
    RegistryFull { capacity: usize },
    #[error("no entropy source registered")]
    NoSource,
    #[error("requested {requested} bytes, at most {max} available per call")]
    RequestTooLarge { requested: usize, max: usize },
    #[error("conditioning failed: {0}")]
    Conditioning(#[from] CipherError),
    #[error("entropy source {index} ({name}) failed: {source}")]
    SourceFailed {
        index: usize,
        name: String,
        #[source]
        source: SourceError,
    },
}

impl EntropyError {
    /// Status code for success.
    pub const OK: i32 = 0;
    /// Status code for a full registry.
    pub const MAX_SRC: i32 = -1;
    /// Status code for an empty registry.
    pub const NO_SRC: i32 = -2;
    /// Status code for every other failure.
    pub const ERR: i32 = -3;

    /// Returns the numeric status code for this error.
    ///
    /// Useful when the result has to cross an FFI or shell boundary.
    pub fn code(&self) -> i32 {
        match self {
            Self::RegistryFull { .. } => Self::MAX_SRC,
            Self::NoSource => Self::NO_SRC,
            Self::RequestTooLarge { .. } | Self::Conditioning(_) | Self::SourceFailed { .. } => {
                Self::ERR
            }
        }
    }
}

/// Folds a `get` result into a single status: byte count or negative code.
pub fn status_code(result: &Result<usize, EntropyError>) -> i32 {
    match result {
        Ok(len) => *len as i32,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(EntropyError::RegistryFull { capacity: 3 }.code(), -1);
        assert_eq!(EntropyError::NoSource.code(), -2);
        assert_eq!(
            EntropyError::RequestTooLarge {
                requested: 17,
                max: 16
            }
            .code(),
            -3
        );
        assert_eq!(
            EntropyError::Conditioning(CipherError::InvalidKeyLength(3)).code(),
            -3
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(status_code(&Ok(16)), 16);
        assert_eq!(status_code(&Err(EntropyError::NoSource)), EntropyError::NO_SRC);
    }

    #[test]
    fn test_source_failure_keeps_cause() {
        use std::error::Error as _;

        let err = EntropyError::SourceFailed {
            index: 1,
            name: "adc".into(),
            source: SourceError::InitFailed("line 0".into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("adc"));
    }
}
