//! Seed material gathered from an entropy context.

use crate::conditioning::BLOCK_SIZE;
use crate::context::EntropyContext;
use crate::error::EntropyError;
use blake3::Hasher as Blake3Hasher;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Seed length for the ChaCha20 generator.
pub const SEED_LEN: usize = 32;

/// Hash used to mix fresh seed material into the generator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// BLAKE3 - fast, secure, recommended default.
    #[default]
    Blake3,
    /// SHA-256 - widely deployed, conservative choice.
    Sha256,
}

impl HashAlgorithm {
    /// Hashes `parts` in order into a 32-byte digest.
    pub(crate) fn digest(self, parts: &[&[u8]]) -> [u8; SEED_LEN] {
        match self {
            Self::Blake3 => {
                let mut hasher = Blake3Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                *hasher.finalize().as_bytes()
            }
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                hasher.finalize().into()
            }
        }
    }
}

/// 32 bytes of conditioned entropy, wiped on drop.
///
/// A single request yields at most one cipher block, so a seed is
/// assembled from two consecutive requests.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SeedMaterial {
    data: [u8; SEED_LEN],
}

impl SeedMaterial {
    /// Draws two full blocks from `ctx`.
    pub fn gather<const N: usize>(ctx: &EntropyContext<N>) -> Result<Self, EntropyError> {
        let mut data = [0u8; SEED_LEN];
        for chunk in data.chunks_mut(BLOCK_SIZE) {
            if let Err(e) = ctx.get(chunk) {
                data.zeroize();
                return Err(e);
            }
        }
        Ok(Self { data })
    }

    /// Returns the seed bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.data
    }

    /// Creates seed material from fixed bytes (for testing only).
    #[cfg(test)]
    pub(crate) fn from_bytes_for_testing(data: [u8; SEED_LEN]) -> Self {
        Self { data }
    }
}

impl std::fmt::Debug for SeedMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedMaterial").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FailingSource, FixedSource};

    #[test]
    fn test_gather_uses_two_blocks() {
        let mut ctx: EntropyContext = EntropyContext::new();
        ctx.source_add(FixedSource::repeat(0x42)).unwrap();

        let seed = SeedMaterial::gather(&ctx).unwrap();
        let block = ctx.get_block().unwrap();

        // fixed sources give identical blocks
        assert_eq!(&seed.as_bytes()[..16], &block[..]);
        assert_eq!(&seed.as_bytes()[16..], &block[..]);
        assert_eq!(ctx.stats().snapshot().requests, 3);
    }

    #[test]
    fn test_gather_propagates_failure() {
        let mut ctx: EntropyContext = EntropyContext::new();
        ctx.source_add(FailingSource::default()).unwrap();

        assert!(matches!(
            SeedMaterial::gather(&ctx),
            Err(EntropyError::SourceFailed { .. })
        ));
    }

    #[test]
    fn test_hash_algorithms_differ() {
        let parts: [&[u8]; 2] = [b"abc", b"def"];
        assert_ne!(
            HashAlgorithm::Blake3.digest(&parts),
            HashAlgorithm::Sha256.digest(&parts)
        );
    }

    #[test]
    fn test_sha256_matches_single_update() {
        let joined = HashAlgorithm::Sha256.digest(&[&b"abcdef"[..]]);
        let split = HashAlgorithm::Sha256.digest(&[&b"abc"[..], &b"def"[..]]);
        assert_eq!(joined, split);
    }
}
