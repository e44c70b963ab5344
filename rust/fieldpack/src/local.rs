//! Packing into a locally owned, fixed-length buffer.

use std::convert::identity;

use fieldpack_bytes::{
    FixedBytes,
    align::{is_aligned, is_valid_alignment, padding_len},
};
use fieldpack_common::{Result, error::Error, verify_arg};

use crate::{
    backend::PackBackend,
    scalar::{Field, U8, U16, U32, U64},
};

/// A [`PackBackend`] writing into a zero-initialized buffer it owns.
///
/// The buffer length is fixed at construction. The cursor satisfies
/// `0 <= position <= capacity` before and after every operation.
///
/// Composite values (vectors, matrices) are validated as a whole before any byte is
/// written, so a failing composite leaves the packer untouched. On success the bytes are
/// the same as packing the components one at a time.
#[derive(Debug, Clone)]
pub struct LocalPacker {
    data: FixedBytes,
    pos: usize,
}

impl LocalPacker {
    /// Creates a packer over `capacity` zero bytes, with the cursor at the start.
    pub fn new(capacity: usize) -> LocalPacker {
        LocalPacker {
            data: FixedBytes::zeroed(capacity),
            pos: 0,
        }
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Computes where a write of `len` bytes with the given alignment would start,
    /// failing if the padding plus the write does not fit.
    fn reserve(&self, alignment: usize, len: usize) -> Result<usize> {
        let padding = padding_len(self.pos, alignment);
        let requested = padding.saturating_add(len);
        if !self.data.fits(self.pos, requested) {
            log::debug!(
                "packer overflow: {requested} bytes at position {} of {}",
                self.pos,
                self.data.len()
            );
            return Err(Error::buffer_overflow(self.pos, requested, self.data.len()));
        }
        let start = self.pos + padding;
        debug_assert!(is_aligned(start, alignment));
        Ok(start)
    }

    /// Writes zero padding up to `start` and moves the cursor there.
    #[inline]
    fn pad_to(&mut self, start: usize) {
        self.data.zero_range(self.pos..start);
        self.pos = start;
    }

    #[inline]
    fn put<F: Field>(&mut self, value: F) -> Result<()> {
        self.put_all(&[value])
    }

    /// Packs `values` back to back, as one atomic write.
    ///
    /// Each value's width is a multiple of its alignment, so only the first value can
    /// need padding.
    fn put_all<F: Field>(&mut self, values: &[F]) -> Result<()> {
        for value in values {
            value.check()?;
        }
        let width = F::KIND.width();
        let len = width * values.len();
        let start = self.reserve(F::KIND.alignment(), len)?;
        self.pad_to(start);
        let window = self.data.window_mut(start, len);
        for (dst, value) in window.chunks_exact_mut(width).zip(values) {
            value.store(dst);
        }
        self.pos = start + len;
        debug_assert!(self.pos <= self.data.len());
        Ok(())
    }
}

macro_rules! atomic_vector_ops {
    ($($scalar:ident: $input:ty => $wrap:expr),* $(,)?) => {
        paste::paste! {
            $(
                fn [<add_ $scalar x2>](&mut self, v: [$input; 2]) -> Result<()> {
                    self.put_all(&v.map($wrap))
                }

                fn [<add_ $scalar x3>](&mut self, v: [$input; 3]) -> Result<()> {
                    self.put_all(&v.map($wrap))
                }

                fn [<add_ $scalar x4>](&mut self, v: [$input; 4]) -> Result<()> {
                    self.put_all(&v.map($wrap))
                }
            )*
        }
    };
}

impl PackBackend for LocalPacker {
    #[inline]
    fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn align(&mut self, boundary: usize) -> Result<()> {
        verify_arg!(boundary, is_valid_alignment(boundary));
        let start = self.reserve(boundary, 0)?;
        self.pad_to(start);
        Ok(())
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(Error::invalid_arg(
                "pos",
                format!("position {pos} is outside the buffer of {} bytes", self.data.len()),
            ));
        }
        self.pos = pos;
        Ok(())
    }

    fn skip(&mut self, delta: isize) -> Result<()> {
        let target = self
            .pos
            .checked_add_signed(delta)
            .filter(|&target| target <= self.data.len());
        match target {
            Some(target) => {
                self.pos = target;
                Ok(())
            }
            None => Err(Error::invalid_arg(
                "delta",
                format!(
                    "skipping {delta} bytes from position {} leaves the buffer of {} bytes",
                    self.pos,
                    self.data.len()
                ),
            )),
        }
    }

    fn add_i8(&mut self, v: i8) -> Result<()> {
        self.put(v)
    }

    fn add_u8(&mut self, v: i16) -> Result<()> {
        self.put(U8(v))
    }

    fn add_i16(&mut self, v: i16) -> Result<()> {
        self.put(v)
    }

    fn add_u16(&mut self, v: i32) -> Result<()> {
        self.put(U16(v))
    }

    fn add_i32(&mut self, v: i32) -> Result<()> {
        self.put(v)
    }

    fn add_u32(&mut self, v: i64) -> Result<()> {
        self.put(U32(v))
    }

    fn add_i64(&mut self, v: i64) -> Result<()> {
        self.put(v)
    }

    fn add_u64(&mut self, v: i64) -> Result<()> {
        self.put(U64(v))
    }

    fn add_f32(&mut self, v: f32) -> Result<()> {
        self.put(v)
    }

    fn add_f64(&mut self, v: f64) -> Result<()> {
        self.put(v)
    }

    fn add_bool(&mut self, v: bool) -> Result<()> {
        self.put(v)
    }

    atomic_vector_ops! {
        i8: i8 => identity,
        u8: i16 => U8,
        i16: i16 => identity,
        u16: i32 => U16,
        i32: i32 => identity,
        u32: i64 => U32,
        i64: i64 => identity,
        u64: i64 => U64,
        f32: f32 => identity,
        f64: f64 => identity,
    }

    fn add_matrix2(&mut self, m: &[f32; 4]) -> Result<()> {
        self.put_all(m)
    }

    fn add_matrix3(&mut self, m: &[f32; 9]) -> Result<()> {
        self.put_all(m)
    }

    fn add_matrix4(&mut self, m: &[f32; 16]) -> Result<()> {
        self.put_all(m)
    }

    fn snapshot(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn into_bytes(self: Box<Self>) -> Box<[u8]> {
        self.data.into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        for capacity in [0, 1, 13, 256] {
            let packer = LocalPacker::new(capacity);
            assert_eq!(packer.capacity(), capacity);
            assert_eq!(packer.position(), 0);
            assert_eq!(packer.snapshot().len(), capacity);
            assert!(packer.snapshot().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_put_i32() {
        let mut packer = LocalPacker::new(8);
        packer.add_i32(0x12345678).unwrap();
        assert_eq!(packer.position(), 4);
        assert_eq!(&packer.snapshot()[..4], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(packer.remaining(), 4);
    }

    #[test]
    fn test_align_pads_with_zeros() {
        let mut packer = LocalPacker::new(8);
        packer.add_i8(-1).unwrap();
        packer.align(4).unwrap();
        assert_eq!(packer.position(), 4);
        assert_eq!(&packer.snapshot()[..4], &[0xff, 0, 0, 0]);

        // Already aligned: no-op.
        packer.align(4).unwrap();
        assert_eq!(packer.position(), 4);
    }

    #[test]
    fn test_padding_overwrites_stale_bytes() {
        let mut packer = LocalPacker::new(8);
        packer.add_i64(-1).unwrap();
        packer.rewind();
        packer.add_i8(7).unwrap();
        packer.add_i16(0).unwrap();
        assert_eq!(packer.position(), 4);
        assert_eq!(packer.snapshot(), &[7, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_align_rejects_invalid_boundary() {
        let mut packer = LocalPacker::new(16);
        packer.add_i8(1).unwrap();
        for boundary in [0, 3, 6, 12] {
            let err = packer.align(boundary).unwrap_err();
            assert!(err.is_invalid_argument());
            assert_eq!(packer.position(), 1);
        }
    }

    #[test]
    fn test_align_overflow_is_atomic() {
        let mut packer = LocalPacker::new(6);
        packer.add_i8(1).unwrap();
        packer.add_i8(2).unwrap();
        packer.add_i8(3).unwrap();
        let err = packer.align(8).unwrap_err();
        assert!(err.is_buffer_overflow());
        assert_eq!(packer.position(), 3);
        assert_eq!(packer.snapshot(), &[1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_align_to_huge_boundary() {
        let mut packer = LocalPacker::new(8);
        packer.add_i8(1).unwrap();
        let err = packer.align(1 << (usize::BITS - 1)).unwrap_err();
        assert!(err.is_buffer_overflow());
        assert_eq!(packer.position(), 1);

        packer.rewind();
        packer.align(1 << (usize::BITS - 1)).unwrap();
        assert_eq!(packer.position(), 0);
    }

    #[test]
    fn test_align_to_end_of_buffer() {
        let mut packer = LocalPacker::new(8);
        packer.add_i8(1).unwrap();
        packer.align(8).unwrap();
        assert_eq!(packer.position(), 8);
        assert_eq!(packer.remaining(), 0);
        assert!(packer.add_i8(1).unwrap_err().is_buffer_overflow());
    }

    #[test]
    fn test_seek_and_skip() {
        let mut packer = LocalPacker::new(8);
        packer.seek(5).unwrap();
        assert_eq!(packer.position(), 5);
        packer.skip(-3).unwrap();
        assert_eq!(packer.position(), 2);
        packer.skip(6).unwrap();
        assert_eq!(packer.position(), 8);

        assert!(packer.seek(8).unwrap_err().is_invalid_argument());
        assert!(packer.skip(1).unwrap_err().is_invalid_argument());
        assert_eq!(packer.position(), 8);

        packer.seek(1).unwrap();
        assert!(packer.skip(-3).unwrap_err().is_invalid_argument());
        assert_eq!(packer.position(), 1);
        assert!(packer.skip(isize::MIN).is_err());
        assert!(packer.skip(isize::MAX).is_err());
    }

    #[test]
    fn test_seek_on_empty_buffer() {
        let mut packer = LocalPacker::new(0);
        assert!(packer.seek(0).unwrap_err().is_invalid_argument());
        packer.skip(0).unwrap();
        packer.align(64).unwrap();
        assert_eq!(packer.position(), 0);
    }

    #[test]
    fn test_range_failure_writes_nothing() {
        let mut packer = LocalPacker::new(8);
        packer.add_i8(9).unwrap();
        assert!(packer.add_u16(70000).unwrap_err().is_invalid_argument());
        assert!(packer.add_u8(-1).unwrap_err().is_invalid_argument());
        assert!(packer.add_u32(-1).unwrap_err().is_invalid_argument());
        assert!(packer.add_u64(-1).unwrap_err().is_invalid_argument());
        assert_eq!(packer.position(), 1);
        assert_eq!(packer.snapshot(), &[9, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_vector_is_atomic() {
        let mut packer = LocalPacker::new(16);
        packer.add_i8(1).unwrap();
        let err = packer.add_u16x4([1, 2, 3, 65536]).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(packer.position(), 1);
        assert!(packer.snapshot()[1..].iter().all(|&b| b == 0));

        let err = packer.add_i64x2([1, 2]).unwrap_err();
        assert!(err.is_buffer_overflow());
        assert_eq!(packer.position(), 1);
        assert!(packer.snapshot()[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_vector_matches_sequential_scalars() {
        let mut atomic = LocalPacker::new(64);
        let mut sequential = LocalPacker::new(64);
        for _ in 0..8 {
            let tag = fastrand::i8(..);
            let v = [fastrand::i16(..), fastrand::i16(..), fastrand::i16(..)];

            atomic.add_i8(tag).unwrap();
            atomic.add_i16x3(v).unwrap();

            sequential.add_i8(tag).unwrap();
            for c in v {
                sequential.add_i16(c).unwrap();
            }
        }
        assert_eq!(atomic.position(), 64);
        assert_eq!(atomic.snapshot(), sequential.snapshot());
    }

    #[test]
    fn test_into_bytes() {
        let mut packer = Box::new(LocalPacker::new(4));
        packer.add_u16(0xabcd).unwrap();
        assert_eq!(&*packer.into_bytes(), &[0xcd, 0xab, 0, 0]);
    }
}
