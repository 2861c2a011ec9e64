//! Scratch memory for a single conditioning pass.

use super::cipher::{whitening_key, Block, BLOCK_SIZE};
use std::ops::{Deref, DerefMut};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Per-call working state.
///
/// Lives for one request only. The accumulator holds entropy-derived
/// bytes, so the whole struct is wiped on drop and by [`WipeGuard`].
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ConditioningState {
    pub(crate) accumulator: Block,
    pub(crate) raw: Block,
    pub(crate) key: Block,
}

impl ConditioningState {
    pub fn new() -> Self {
        Self {
            accumulator: [0u8; BLOCK_SIZE],
            raw: [0u8; BLOCK_SIZE],
            key: whitening_key(),
        }
    }

    /// Returns true if every byte of scratch memory is zero.
    pub fn is_wiped(&self) -> bool {
        self.accumulator
            .iter()
            .chain(self.raw.iter())
            .chain(self.key.iter())
            .all(|&b| b == 0)
    }
}

impl Default for ConditioningState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConditioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditioningState")
            .field("accumulator", &"***SENSITIVE***")
            .field("wiped", &self.is_wiped())
            .finish()
    }
}

/// Zeroizes the borrowed value when the guard goes out of scope.
///
/// Early returns through `?` drop the guard too, so every exit path wipes.
pub struct WipeGuard<'a, T: Zeroize> {
    inner: &'a mut T,
}

impl<'a, T: Zeroize> WipeGuard<'a, T> {
    pub fn new(inner: &'a mut T) -> Self {
        Self { inner }
    }
}

impl<T: Zeroize> Deref for WipeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner
    }
}

impl<T: Zeroize> DerefMut for WipeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner
    }
}

impl<T: Zeroize> Drop for WipeGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
