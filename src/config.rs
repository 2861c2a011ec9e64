//! Runtime configuration.
//!
//! Capacity and block size are fixed at build time; everything here only
//! selects and tunes the providers that feed the accumulator.

use crate::sources::AdcResolution;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("timer jitter clocks must run at a non-zero frequency")]
    InvalidFrequency,
    #[error("timer jitter wait must be at least one tick")]
    InvalidWait,
    #[error("requested block size {0} exceeds the maximum of {max}", max = crate::MAX_BYTES_REQUEST)]
    InvalidBlockSize(usize),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Which providers `EntropyContext::init` registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Register the hardware RNG (operating system generator on hosts).
    pub hwrng: bool,
    /// Register the timer jitter source.
    pub timer_jitter: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            hwrng: true,
            timer_jitter: true,
        }
    }
}

/// Timer jitter sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerJitterConfig {
    /// Slow-clock ticks between measurements.
    pub wait_ticks: u32,
    /// Slow (alarm) clock frequency in Hz.
    pub alarm_hz: u32,
    /// Fast (free-running counter) clock frequency in Hz.
    pub counter_hz: u32,
    /// Upper bound on a single sampling run; absent or 0 blocks indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for TimerJitterConfig {
    fn default() -> Self {
        Self {
            wait_ticks: 10,
            alarm_hz: 32_768,
            counter_hz: 20_000_000,
            timeout_ms: Some(1000),
        }
    }
}

impl TimerJitterConfig {
    /// Returns the sampling timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alarm_hz == 0 || self.counter_hz == 0 {
            return Err(ConfigError::InvalidFrequency);
        }
        if self.wait_ticks == 0 {
            return Err(ConfigError::InvalidWait);
        }
        Ok(())
    }
}

/// ADC noise sampling parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    /// Conversion resolution used for noise sampling.
    pub resolution: AdcResolution,
}

/// Output configuration for the command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted (true) or emit a fixed number of blocks (false).
    pub continuous: bool,
    /// Number of blocks to emit if not continuous.
    pub blocks: u32,
    /// Bytes requested per block.
    pub bytes_per_block: usize,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            blocks: 4,
            bytes_per_block: crate::MAX_BYTES_REQUEST,
            metrics_port: 9090,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntropyConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub timer_jitter: TimerJitterConfig,
    #[serde(default)]
    pub adc: AdcConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl EntropyConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EntropyConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timer_jitter.validate()?;
        if self.output.bytes_per_block > crate::MAX_BYTES_REQUEST {
            return Err(ConfigError::InvalidBlockSize(self.output.bytes_per_block));
        }
        Ok(())
    }
}
