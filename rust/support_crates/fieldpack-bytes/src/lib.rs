//! Byte storage for the fieldpack infrastructure: a fixed-length, zero-initialized byte
//! block and the alignment arithmetic used to lay values out inside it.

use std::ops::Range;

pub mod align;

/// A byte block whose length is fixed at construction.
///
/// The block is zero-filled when created and never grows or shrinks. Writes address it
/// by absolute position; callers are responsible for tracking how much of it is in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBytes(Box<[u8]>);

impl FixedBytes {
    /// Creates a block of `len` zero bytes.
    pub fn zeroed(len: usize) -> FixedBytes {
        FixedBytes(vec![0u8; len].into_boxed_slice())
    }

    /// Returns the length of the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the block has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if `len` bytes starting at `pos` lie entirely within the block.
    #[inline]
    pub fn fits(&self, pos: usize, len: usize) -> bool {
        pos.checked_add(len).is_some_and(|end| end <= self.len())
    }

    /// Sets the bytes in `range` to zero.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    #[inline]
    pub fn zero_range(&mut self, range: Range<usize>) {
        self.0[range].fill(0);
    }

    /// Returns the mutable window of `len` bytes starting at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if the window is out of bounds.
    #[inline]
    pub fn window_mut(&mut self, pos: usize, len: usize) -> &mut [u8] {
        &mut self.0[pos..pos + len]
    }

    /// Consumes the block and returns the underlying storage.
    pub fn into_boxed_slice(self) -> Box<[u8]> {
        self.0
    }
}

impl std::ops::Deref for FixedBytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}
