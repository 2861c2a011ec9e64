//! CSPRNG seeding from conditioned entropy.
//!
//! This module provides a ChaCha20 generator whose seed material comes
//! exclusively from an [`EntropyContext`](crate::EntropyContext).

mod csprng;
mod seed;

pub use csprng::{ReseedableRng, SeedingError};
pub use seed::{HashAlgorithm, SeedMaterial, SEED_LEN};
