//! ADC least-significant-bit noise source.
//!
//! The lowest bit of a converter reading on a floating or noisy line is
//! dominated by thermal and quantization noise. Eight conversions are
//! packed into each output byte.

use super::{NoiseSource, SourceError};
use crate::config::AdcConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ADC conversion resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcResolution {
    Bits6,
    Bits8,
    #[default]
    Bits10,
    Bits12,
    Bits14,
    Bits16,
}

impl AdcResolution {
    /// Returns the resolution in bits.
    pub fn bits(self) -> u8 {
        match self {
            Self::Bits6 => 6,
            Self::Bits8 => 8,
            Self::Bits10 => 10,
            Self::Bits12 => 12,
            Self::Bits14 => 14,
            Self::Bits16 => 16,
        }
    }
}

/// Errors reported by an ADC line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdcError {
    #[error("ADC line {0} could not be configured")]
    Config(u8),
    #[error("resolution {0:?} not supported")]
    UnsupportedResolution(AdcResolution),
    #[error("conversion failed: {0}")]
    Conversion(String),
}

/// One ADC input line, as exposed by the board's peripheral driver.
pub trait AdcLine: Send + Sync {
    /// Configures the line for sampling.
    fn init(&self) -> Result<(), AdcError>;

    /// Performs a single conversion.
    fn sample(&self, resolution: AdcResolution) -> Result<u16, AdcError>;
}

/// Noise source that harvests ADC conversion LSBs.
#[derive(Debug)]
pub struct AdcNoiseSource<A> {
    line: A,
    resolution: AdcResolution,
}

impl<A: AdcLine> AdcNoiseSource<A> {
    pub fn new(line: A, resolution: AdcResolution) -> Self {
        Self { line, resolution }
    }

    pub fn from_config(line: A, config: &AdcConfig) -> Self {
        Self::new(line, config.resolution)
    }

    /// Returns the underlying ADC line.
    pub fn line(&self) -> &A {
        &self.line
    }
}

impl<A: AdcLine> NoiseSource for AdcNoiseSource<A> {
    fn sample(&self, buf: &mut [u8]) -> Result<usize, SourceError> {
        self.line
            .init()
            .map_err(|e| SourceError::InitFailed(e.to_string()))?;

        for byte in buf.iter_mut() {
            let mut packed = 0u8;
            for bit in 0..8 {
                let reading = self
                    .line
                    .sample(self.resolution)
                    .map_err(|e| SourceError::Hardware(e.to_string()))?;
                packed |= ((reading & 0x01) as u8) << bit;
            }
            *byte = packed;
        }

        tracing::trace!(
            bytes = buf.len(),
            resolution_bits = self.resolution.bits(),
            "Sampled ADC noise"
        );

        Ok(buf.len())
    }

    fn name(&self) -> &str {
        "adc"
    }
}
