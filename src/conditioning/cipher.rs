//! Block cipher used as a mixing permutation.
//!
//! The cipher is not used for confidentiality. Its key is the public
//! sequence `00 01 02 .. 0f`, so anyone who knows every source output can
//! recompute the conditioned block. What it buys is diffusion: a single
//! flipped input bit changes about half of the output bits.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use thiserror::Error;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// One cipher block.
pub type Block = [u8; BLOCK_SIZE];

/// Errors from the mixing cipher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),
    #[error("block encryption failed: {0}")]
    Encrypt(String),
}

/// A keyed 128-bit permutation applied once per source.
pub trait MixingCipher: Sized {
    /// Initializes the cipher with `key`.
    fn new(key: &[u8]) -> Result<Self, CipherError>;

    /// Encrypts `block` in place (single-block ECB).
    fn encrypt_block(&self, block: &mut Block) -> Result<(), CipherError>;
}

/// AES-128 mixing permutation.
///
/// The expanded key schedule is zeroized on drop.
pub struct Aes128Mixer {
    cipher: Aes128,
}

impl MixingCipher for Aes128Mixer {
    fn new(key: &[u8]) -> Result<Self, CipherError> {
        let cipher =
            Aes128::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    fn encrypt_block(&self, block: &mut Block) -> Result<(), CipherError> {
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(block.as_mut_slice()));
        Ok(())
    }
}

impl std::fmt::Debug for Aes128Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes128Mixer").finish_non_exhaustive()
    }
}

/// Returns the fixed whitening key `0, 1, .., 15`.
pub fn whitening_key() -> Block {
    std::array::from_fn(|i| i as u8)
}
