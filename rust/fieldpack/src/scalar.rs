//! Scalar kinds and their canonical little-endian byte representation.

use byteorder::{ByteOrder, LE};
use fieldpack_common::{Result, error::Error};

/// The primitive value kinds that can be packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    /// Object reference, packed as its 32-bit handle.
    Obj,
}

impl ScalarKind {
    /// Number of bytes the value occupies in the packed buffer.
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 | ScalarKind::Bool => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 | ScalarKind::Obj => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
        }
    }

    /// Boundary the cursor is padded to before the value is written.
    ///
    /// Natural alignment: equal to the width for every kind. One-byte kinds never pad.
    pub const fn alignment(self) -> usize {
        self.width()
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "i8",
            ScalarKind::U8 => "u8",
            ScalarKind::I16 => "i16",
            ScalarKind::U16 => "u16",
            ScalarKind::I32 => "i32",
            ScalarKind::U32 => "u32",
            ScalarKind::I64 => "i64",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::Obj => "obj",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single value ready to be stored at a cursor position.
///
/// `check` must be called, and must succeed, before `store`. `store` receives a window
/// of exactly `KIND.width()` bytes.
pub(crate) trait Field: Copy {
    const KIND: ScalarKind;

    #[inline]
    fn check(self) -> Result<()> {
        Ok(())
    }

    fn store(self, dst: &mut [u8]);
}

/// Unsigned 8-bit value carried in a wider signed representation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct U8(pub i16);

/// Unsigned 16-bit value carried in a wider signed representation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct U16(pub i32);

/// Unsigned 32-bit value carried in a wider signed representation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct U32(pub i64);

/// Unsigned 64-bit value carried in a signed 64-bit representation.
///
/// Only negative values are rejected, so the representable range is `[0, i64::MAX]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct U64(pub i64);

#[cold]
fn out_of_range(value: i64, kind: ScalarKind, max: i64) -> Result<()> {
    log::debug!("rejecting {kind} value {value}: outside [0, {max}]");
    Err(Error::value_out_of_range(
        value,
        kind.name(),
        &format!("[0, {max}]"),
    ))
}

#[inline]
fn check_unsigned(value: i64, kind: ScalarKind, max: i64) -> Result<()> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        out_of_range(value, kind, max)
    }
}

impl Field for i8 {
    const KIND: ScalarKind = ScalarKind::I8;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }
}

impl Field for U8 {
    const KIND: ScalarKind = ScalarKind::U8;

    #[inline]
    fn check(self) -> Result<()> {
        check_unsigned(self.0.into(), Self::KIND, u8::MAX.into())
    }

    #[inline]
    fn store(self, dst: &mut [u8]) {
        dst[0] = self.0 as u8;
    }
}

impl Field for i16 {
    const KIND: ScalarKind = ScalarKind::I16;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_i16(dst, self);
    }
}

impl Field for U16 {
    const KIND: ScalarKind = ScalarKind::U16;

    #[inline]
    fn check(self) -> Result<()> {
        check_unsigned(self.0.into(), Self::KIND, u16::MAX.into())
    }

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_u16(dst, self.0 as u16);
    }
}

impl Field for i32 {
    const KIND: ScalarKind = ScalarKind::I32;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_i32(dst, self);
    }
}

impl Field for U32 {
    const KIND: ScalarKind = ScalarKind::U32;

    #[inline]
    fn check(self) -> Result<()> {
        check_unsigned(self.0, Self::KIND, u32::MAX.into())
    }

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_u32(dst, self.0 as u32);
    }
}

impl Field for i64 {
    const KIND: ScalarKind = ScalarKind::I64;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_i64(dst, self);
    }
}

impl Field for U64 {
    const KIND: ScalarKind = ScalarKind::U64;

    #[inline]
    fn check(self) -> Result<()> {
        check_unsigned(self.0, Self::KIND, i64::MAX)
    }

    #[inline]
    fn store(self, dst: &mut [u8]) {
        LE::write_i64(dst, self.0);
    }
}

impl Field for f32 {
    const KIND: ScalarKind = ScalarKind::F32;

    // Raw bit pattern: NaN payloads and negative zero survive unchanged.
    #[inline]
    fn store(self, dst: &mut [u8]) {
        (self.to_bits() as i32).store(dst);
    }
}

impl Field for f64 {
    const KIND: ScalarKind = ScalarKind::F64;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        (self.to_bits() as i64).store(dst);
    }
}

impl Field for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    #[inline]
    fn store(self, dst: &mut [u8]) {
        (self as i8).store(dst);
    }
}
