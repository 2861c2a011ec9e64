//! Noise source providers.
//!
//! Sources produce raw, unconditioned bytes. They are not trusted to be
//! uniform or even independent of an attacker; whitening happens in the
//! conditioning stage, never here.

mod adc;
mod hwrng;
mod mock;
mod provider;
pub mod timer_jitter;

pub use adc::{AdcError, AdcLine, AdcNoiseSource, AdcResolution};
pub use hwrng::HwRngSource;
pub use mock::{FailingSource, FixedSource};
pub use provider::{NoiseSource, SourceError};
pub use timer_jitter::TimerJitterSource;
