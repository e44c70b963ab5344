//! The packing contract shared by every backend.
//!
//! [`PackBackend`] is implemented by the local buffer packer
//! ([`LocalPacker`](crate::LocalPacker)) and by any delegate backend supplied through a
//! [`BackendFactory`]. A [`FieldPacker`](crate::FieldPacker) picks one implementation at
//! construction and dispatches every operation to it.

use std::convert::identity;

use fieldpack_bytes::align::align_up;
use fieldpack_common::{Result, error::Error};

use crate::scalar::{Field, U8, U16, U32, U64};

/// An object living outside the packer, referenced from the packed record by handle.
pub trait ObjectRef {
    /// The 32-bit handle identifying this object to the native engine.
    fn id(&self) -> i32;
}

/// Creates delegate backends.
///
/// A factory is part of a [`PackerConfig`](crate::PackerConfig) and is invoked once per
/// packer, with the packer's capacity.
pub trait BackendFactory: Send + Sync {
    fn create(&self, capacity: usize) -> Box<dyn PackBackend>;
}

/// Validates a whole composite against the backend's cursor before any component is
/// issued: every component's range, then the aligned total length against the capacity.
fn check_composite<B, F>(backend: &B, values: &[F]) -> Result<()>
where
    B: PackBackend + ?Sized,
    F: Field,
{
    for value in values {
        value.check()?;
    }
    let len = F::KIND.width() * values.len();
    let (pos, capacity) = (backend.position(), backend.capacity());
    let end = align_up(pos, F::KIND.alignment()).and_then(|start| start.checked_add(len));
    match end {
        Some(end) if end <= capacity => Ok(()),
        end => {
            let requested = end.map_or(usize::MAX, |end| end - pos);
            log::debug!("composite overflow: {requested} bytes at position {pos} of {capacity}");
            Err(Error::buffer_overflow(pos, requested, capacity))
        }
    }
}

macro_rules! sequential_vector_ops {
    ($($scalar:ident: $input:ty => $wrap:expr),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Packs a 2-component `" $scalar "` vector."]
                fn [<add_ $scalar x2>](&mut self, v: [$input; 2]) -> Result<()> {
                    check_composite(&*self, &v.map($wrap))?;
                    v.into_iter().try_for_each(|c| self.[<add_ $scalar>](c))
                }

                #[doc = "Packs a 3-component `" $scalar "` vector."]
                fn [<add_ $scalar x3>](&mut self, v: [$input; 3]) -> Result<()> {
                    check_composite(&*self, &v.map($wrap))?;
                    v.into_iter().try_for_each(|c| self.[<add_ $scalar>](c))
                }

                #[doc = "Packs a 4-component `" $scalar "` vector."]
                fn [<add_ $scalar x4>](&mut self, v: [$input; 4]) -> Result<()> {
                    check_composite(&*self, &v.map($wrap))?;
                    v.into_iter().try_for_each(|c| self.[<add_ $scalar>](c))
                }
            )*
        }
    };
}

/// Operations of a field packing backend.
///
/// Every mutating operation either completes fully or fails leaving the cursor and the
/// buffer untouched. Unsigned scalar operations take the next wider signed type so that
/// negative inputs can be expressed, and rejected.
///
/// Only the buffer/cursor operations and the integer encoders are required. Floats,
/// booleans and object references default to forwarding their bit patterns to the
/// integer encoders. Vectors and matrices default to validating every component and the
/// total size up front, then issuing one scalar call per component, so a scalar encoder
/// that is itself atomic makes the composite atomic too. Backends may override any of
/// them, provided the produced bytes are identical.
pub trait PackBackend: Send {
    /// Total size of the buffer in bytes.
    fn capacity(&self) -> usize;

    /// Current write cursor.
    fn position(&self) -> usize;

    /// Pads the cursor with zero bytes up to the next multiple of `boundary`, which must
    /// be a non-zero power of two.
    fn align(&mut self, boundary: usize) -> Result<()>;

    /// Moves the cursor back to the start. Buffer contents are kept.
    fn rewind(&mut self);

    /// Moves the cursor to `pos`, which must be strictly less than the capacity.
    fn seek(&mut self, pos: usize) -> Result<()>;

    /// Moves the cursor by `delta` bytes, forwards or backwards; the result must stay
    /// within `[0, capacity]`.
    fn skip(&mut self, delta: isize) -> Result<()>;

    fn add_i8(&mut self, v: i8) -> Result<()>;

    /// Packs an unsigned byte; `v` must be within `[0, 255]`.
    fn add_u8(&mut self, v: i16) -> Result<()>;

    fn add_i16(&mut self, v: i16) -> Result<()>;

    /// Packs an unsigned 16-bit value; `v` must be within `[0, 65535]`.
    fn add_u16(&mut self, v: i32) -> Result<()>;

    fn add_i32(&mut self, v: i32) -> Result<()>;

    /// Packs an unsigned 32-bit value; `v` must be within `[0, 2^32 - 1]`.
    fn add_u32(&mut self, v: i64) -> Result<()>;

    fn add_i64(&mut self, v: i64) -> Result<()>;

    /// Packs an unsigned 64-bit value; only negative `v` is rejected.
    fn add_u64(&mut self, v: i64) -> Result<()>;

    fn add_f32(&mut self, v: f32) -> Result<()> {
        self.add_i32(v.to_bits() as i32)
    }

    fn add_f64(&mut self, v: f64) -> Result<()> {
        self.add_i64(v.to_bits() as i64)
    }

    fn add_bool(&mut self, v: bool) -> Result<()> {
        self.add_i8(v as i8)
    }

    /// Packs the handle of `obj`, or zero when no object is given.
    fn add_obj(&mut self, obj: Option<&dyn ObjectRef>) -> Result<()> {
        self.add_i32(obj.map_or(0, |obj| obj.id()))
    }

    sequential_vector_ops! {
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

    /// Packs a 2x2 float matrix, elements in storage order.
    fn add_matrix2(&mut self, m: &[f32; 4]) -> Result<()> {
        check_composite(&*self, m)?;
        m.iter().try_for_each(|&e| self.add_f32(e))
    }

    /// Packs a 3x3 float matrix, elements in storage order.
    fn add_matrix3(&mut self, m: &[f32; 9]) -> Result<()> {
        check_composite(&*self, m)?;
        m.iter().try_for_each(|&e| self.add_f32(e))
    }

    /// Packs a 4x4 float matrix, elements in storage order.
    fn add_matrix4(&mut self, m: &[f32; 16]) -> Result<()> {
        check_composite(&*self, m)?;
        m.iter().try_for_each(|&e| self.add_f32(e))
    }

    /// The whole buffer, `capacity` bytes long, regardless of the cursor position.
    fn snapshot(&self) -> &[u8];

    /// Consumes the backend and hands off the whole buffer.
    fn into_bytes(self: Box<Self>) -> Box<[u8]>;
}
