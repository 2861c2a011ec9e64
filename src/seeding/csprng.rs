//! ChaCha-based CSPRNG seeded from an entropy context.
//!
//! # Reseeding Model
//!
//! Every (re)seed hashes together:
//! - A domain separator and the reseed counter
//! - The previous seed material (all zero before the first seed)
//! - 32 fresh bytes of conditioned entropy
//!
//! The digest becomes both the ChaCha20 key and the retained seed
//! material for the next reseed.

use super::seed::{HashAlgorithm, SeedMaterial, SEED_LEN};
use crate::context::EntropyContext;
use crate::error::EntropyError;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use thiserror::Error;
use zeroize::Zeroizing;

/// Domain separator for seeding operations.
const RESEED_DOMAIN: &[u8] = b"entropy-accumulator-reseed-v1";

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedingError {
    /// The entropy context could not deliver seed material.
    #[error("seed material unavailable: {0}")]
    Entropy(#[from] EntropyError),
}

/// A reseedable CSPRNG backed by ChaCha20.
///
/// The generator is never seeded from anything but conditioned output of
/// an [`EntropyContext`], so a context with no working source makes
/// construction and reseeding fail rather than fall back.
pub struct ReseedableRng {
    inner: ChaCha20Rng,
    /// Retained seed material for mixing during reseed.
    seed_material: Zeroizing<[u8; SEED_LEN]>,
    algorithm: HashAlgorithm,
    reseed_count: u64,
    bytes_since_reseed: u64,
}

impl ReseedableRng {
    /// Seeds a new generator from `ctx` using BLAKE3 mixing.
    pub fn from_context<const N: usize>(ctx: &EntropyContext<N>) -> Result<Self, SeedingError> {
        Self::from_context_with(ctx, HashAlgorithm::default())
    }

    /// Seeds a new generator from `ctx` with the given mixing hash.
    pub fn from_context_with<const N: usize>(
        ctx: &EntropyContext<N>,
        algorithm: HashAlgorithm,
    ) -> Result<Self, SeedingError> {
        let seed = SeedMaterial::gather(ctx)?;
        let mut rng = Self::unseeded(algorithm);
        rng.absorb(&seed);
        Ok(rng)
    }

    fn unseeded(algorithm: HashAlgorithm) -> Self {
        Self {
            inner: ChaCha20Rng::from_seed([0u8; SEED_LEN]),
            seed_material: Zeroizing::new([0u8; SEED_LEN]),
            algorithm,
            reseed_count: 0,
            bytes_since_reseed: 0,
        }
    }

    /// Creates a generator from fixed seed material (for testing only).
    #[cfg(test)]
    pub(crate) fn from_seed_for_testing(seed: &SeedMaterial, algorithm: HashAlgorithm) -> Self {
        let mut rng = Self::unseeded(algorithm);
        rng.absorb(seed);
        rng
    }

    /// Draws fresh seed material from `ctx` and mixes it in.
    ///
    /// On failure the generator keeps its current state.
    pub fn reseed<const N: usize>(&mut self, ctx: &EntropyContext<N>) -> Result<(), SeedingError> {
        let seed = SeedMaterial::gather(ctx)?;
        self.reseed_with(&seed);
        Ok(())
    }

    /// Mixes caller-provided seed material into the generator.
    pub fn reseed_with(&mut self, seed: &SeedMaterial) {
        self.absorb(seed);
        tracing::info!(
            reseed_count = self.reseed_count,
            algorithm = ?self.algorithm,
            "CSPRNG reseeded"
        );
    }

    // new_seed = H(domain || counter || old_seed_material || new_entropy)
    fn absorb(&mut self, seed: &SeedMaterial) {
        let counter = self.reseed_count.to_le_bytes();
        let next = Zeroizing::new(self.algorithm.digest(&[
            RESEED_DOMAIN,
            &counter[..],
            &self.seed_material[..],
            &seed.as_bytes()[..],
        ]));

        self.inner = ChaCha20Rng::from_seed(*next);
        *self.seed_material = *next;
        self.reseed_count += 1;
        self.bytes_since_reseed = 0;
    }

    /// Hash used for mixing.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of times seed material has been absorbed, including the
    /// initial seed.
    pub fn reseed_count(&self) -> u64 {
        self.reseed_count
    }

    /// Returns bytes generated since last reseed.
    pub fn bytes_since_reseed(&self) -> u64 {
        self.bytes_since_reseed
    }
}

impl std::fmt::Debug for ReseedableRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReseedableRng")
            .field("algorithm", &self.algorithm)
            .field("reseed_count", &self.reseed_count)
            .field("bytes_since_reseed", &self.bytes_since_reseed)
            .finish_non_exhaustive()
    }
}

impl RngCore for ReseedableRng {
    fn next_u32(&mut self) -> u32 {
        self.bytes_since_reseed += 4;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.bytes_since_reseed += 8;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.bytes_since_reseed += dest.len() as u64;
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.bytes_since_reseed += dest.len() as u64;
        self.inner.try_fill_bytes(dest)
    }
}

impl CryptoRng for ReseedableRng {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FailingSource, FixedSource};

    fn seed(byte: u8) -> SeedMaterial {
        SeedMaterial::from_bytes_for_testing([byte; SEED_LEN])
    }

    fn fixed_context(byte: u8) -> EntropyContext {
        let mut ctx = EntropyContext::new();
        ctx.source_add(FixedSource::repeat(byte)).unwrap();
        ctx
    }

    #[test]
    fn test_from_context_deterministic_for_fixed_source() {
        let mut rng1 = ReseedableRng::from_context(&fixed_context(0x42)).unwrap();
        let mut rng2 = ReseedableRng::from_context(&fixed_context(0x42)).unwrap();

        let mut out1 = [0u8; 64];
        let mut out2 = [0u8; 64];
        rng1.fill_bytes(&mut out1);
        rng2.fill_bytes(&mut out2);

        assert_eq!(out1, out2);
        assert_eq!(rng1.reseed_count(), 1);
    }

    #[test]
    fn test_from_context_fails_closed() {
        let ctx: EntropyContext = EntropyContext::new();
        assert!(matches!(
            ReseedableRng::from_context(&ctx),
            Err(SeedingError::Entropy(EntropyError::NoSource))
        ));

        let mut failing: EntropyContext = EntropyContext::new();
        failing.source_add(FailingSource::default()).unwrap();
        assert!(ReseedableRng::from_context(&failing).is_err());
    }

    #[test]
    fn test_failed_reseed_keeps_state() {
        let ctx = fixed_context(0x11);
        let mut rng1 = ReseedableRng::from_context(&ctx).unwrap();
        let mut rng2 = ReseedableRng::from_context(&ctx).unwrap();

        let empty: EntropyContext = EntropyContext::new();
        assert!(rng1.reseed(&empty).is_err());
        assert_eq!(rng1.reseed_count(), 1);

        assert_eq!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_bytes_since_reseed_tracking() {
        let ctx = fixed_context(0x01);
        let mut rng = ReseedableRng::from_context(&ctx).unwrap();

        let mut buf = [0u8; 100];
        rng.fill_bytes(&mut buf);
        rng.next_u32();
        assert_eq!(rng.bytes_since_reseed(), 104);

        rng.reseed(&ctx).unwrap();
        assert_eq!(rng.bytes_since_reseed(), 0);
        assert_eq!(rng.reseed_count(), 2);
    }

    #[test]
    fn test_reseed_changes_output() {
        let mut rng1 = ReseedableRng::from_seed_for_testing(&seed(0x01), HashAlgorithm::Blake3);
        let mut rng2 = ReseedableRng::from_seed_for_testing(&seed(0x01), HashAlgorithm::Blake3);

        rng1.reseed_with(&seed(0xAB));

        let mut out1 = [0u8; 32];
        let mut out2 = [0u8; 32];
        rng1.fill_bytes(&mut out1);
        rng2.fill_bytes(&mut out2);
        assert_ne!(out1, out2);
    }

    #[test]
    fn test_reseed_counter_affects_output() {
        let mut rng1 = ReseedableRng::from_seed_for_testing(&seed(0x01), HashAlgorithm::Sha256);
        let mut rng2 = ReseedableRng::from_seed_for_testing(&seed(0x01), HashAlgorithm::Sha256);

        rng1.reseed_with(&seed(0xAA));
        rng2.reseed_with(&seed(0x00));
        rng2.reseed_with(&seed(0xAA));

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_algorithm_choice_matters() {
        let mut blake = ReseedableRng::from_seed_for_testing(&seed(0x5A), HashAlgorithm::Blake3);
        let mut sha = ReseedableRng::from_seed_for_testing(&seed(0x5A), HashAlgorithm::Sha256);

        assert_eq!(sha.algorithm(), HashAlgorithm::Sha256);
        assert_ne!(blake.next_u64(), sha.next_u64());
    }
}
