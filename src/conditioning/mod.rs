//! Entropy conditioning via cascaded block-cipher whitening.
//!
//! This module turns raw, possibly biased source output into a single
//! whitened block. It never keeps entropy between calls and wipes its
//! scratch memory on every exit path.

mod cipher;
mod conditioner;
mod state;

pub use cipher::{whitening_key, Aes128Mixer, Block, CipherError, MixingCipher, BLOCK_SIZE};
pub use conditioner::EntropyConditioner;
pub use state::{ConditioningState, WipeGuard};
