//! Entropy Accumulator Library
//!
//! Gathers raw noise from a small, fixed set of sources and conditions it
//! into uniformly distributed output suitable for seeding a PRNG.
//!
//! # Architecture
//!
//! Each request runs the full pipeline from scratch:
//!
//! ```text
//! sources (hwrng, timer jitter, adc, ...)
//!     ↓  16 raw bytes each, in registration order
//! conditioning (acc ^= raw; acc = AES-128(acc))
//!     ↓
//! output (at most one block) → seeding (ChaCha20)
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed**: a failing source fails the request; no partial output
//! - **Memoryless**: no entropy is retained between requests
//! - **Wiped scratch**: conditioning buffers are zeroized on every exit path
//! - **Whitening, not secrecy**: the conditioning key is fixed and public
//!
//! # Example
//!
//! ```no_run
//! use entropy_accumulator::{EntropyContext, seeding::ReseedableRng};
//! use rand_core::RngCore;
//!
//! let mut ctx: EntropyContext = EntropyContext::new();
//! ctx.init().unwrap();
//!
//! let mut out = [0u8; 16];
//! ctx.get(&mut out).unwrap();
//!
//! let mut rng = ReseedableRng::from_context(&ctx).unwrap();
//! let _ = rng.next_u64();
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod conditioning;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod seeding;
pub mod sources;

/// Maximum number of sources a default context accepts.
pub const MAX_NUM_SOURCES: usize = 3;

/// Maximum number of bytes a single request may ask for.
pub const MAX_BYTES_REQUEST: usize = conditioning::BLOCK_SIZE;

// Re-export commonly used types at crate root
pub use conditioning::{Aes128Mixer, EntropyConditioner, MixingCipher};
pub use config::{ConfigError, EntropyConfig};
pub use context::{EntropyContext, SourceRegistry};
pub use error::{status_code, EntropyError};
pub use seeding::{HashAlgorithm, ReseedableRng};
pub use sources::{NoiseSource, SourceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
