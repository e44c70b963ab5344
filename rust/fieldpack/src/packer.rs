use fieldpack_common::Result;

use crate::{
    backend::{ObjectRef, PackBackend},
    config::{PackerConfig, PackingMode},
};

macro_rules! forward_vector_ops {
    ($($scalar:ident: $input:ty),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Packs a 2-component `" $scalar "` vector, components in order."]
                pub fn [<add_ $scalar x2>](&mut self, v: [$input; 2]) -> Result<()> {
                    self.backend.[<add_ $scalar x2>](v)
                }

                #[doc = "Packs a 3-component `" $scalar "` vector, components in order."]
                pub fn [<add_ $scalar x3>](&mut self, v: [$input; 3]) -> Result<()> {
                    self.backend.[<add_ $scalar x3>](v)
                }

                #[doc = "Packs a 4-component `" $scalar "` vector, components in order."]
                pub fn [<add_ $scalar x4>](&mut self, v: [$input; 4]) -> Result<()> {
                    self.backend.[<add_ $scalar x4>](v)
                }
            )*
        }
    };
}

/// Serializes typed values into a fixed-length, alignment-correct argument record.
///
/// Values are appended at a write cursor. Every multi-byte value is stored little-endian
/// at its natural alignment; the cursor is padded with zero bytes as needed. The record
/// is always exactly `capacity` bytes long: bytes past the last write stay zero unless
/// the cursor was moved back and they were overwritten.
///
/// Each operation either succeeds completely or fails without touching the cursor or
/// the buffer.
///
/// A packer has a single writer. It can be moved to another thread; sharing one across
/// threads requires external locking, such as a `Mutex<FieldPacker>`.
///
/// # Example
///
/// ```
/// use fieldpack::FieldPacker;
///
/// let mut packer = FieldPacker::new(16);
/// packer.add_i8(1).unwrap();
/// packer.add_f32(1.0).unwrap();
/// packer.add_u16x2([7, 9]).unwrap();
/// assert_eq!(packer.position(), 12);
/// assert_eq!(
///     packer.snapshot(),
///     &[1, 0, 0, 0, 0, 0, 0x80, 0x3f, 7, 0, 9, 0, 0, 0, 0, 0]
/// );
/// ```
pub struct FieldPacker {
    backend: Box<dyn PackBackend>,
    mode: PackingMode,
}

impl FieldPacker {
    /// Creates a packer over a local zero-filled buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> FieldPacker {
        FieldPacker::with_config(capacity, &PackerConfig::local())
    }

    /// Creates a packer whose backend is chosen by `config`.
    ///
    /// With a delegating configuration no local buffer is allocated; every operation,
    /// including [`snapshot`](Self::snapshot), is served by the delegate.
    pub fn with_config(capacity: usize, config: &PackerConfig) -> FieldPacker {
        let mode = config.mode();
        log::debug!("creating {mode:?} field packer, capacity {capacity}");
        FieldPacker {
            backend: config.create_backend(capacity),
            mode,
        }
    }

    pub fn mode(&self) -> PackingMode {
        self.mode
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.backend.position()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity().saturating_sub(self.position())
    }

    /// Pads with zero bytes up to the next multiple of `boundary`.
    ///
    /// Fails with an invalid argument error unless `boundary` is a non-zero power of two,
    /// and with a buffer overflow if the padding does not fit.
    pub fn align(&mut self, boundary: usize) -> Result<()> {
        self.backend.align(boundary)
    }

    /// Moves the cursor back to the start without clearing the buffer.
    pub fn rewind(&mut self) {
        self.backend.rewind()
    }

    /// Moves the cursor to `pos`; requires `pos < capacity`.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.backend.seek(pos)
    }

    /// Moves the cursor by `delta` bytes; the target must lie within `[0, capacity]`.
    pub fn skip(&mut self, delta: isize) -> Result<()> {
        self.backend.skip(delta)
    }

    pub fn add_i8(&mut self, v: i8) -> Result<()> {
        self.backend.add_i8(v)
    }

    /// Packs an unsigned byte given as `i16`; values outside `[0, 255]` are rejected.
    pub fn add_u8(&mut self, v: i16) -> Result<()> {
        self.backend.add_u8(v)
    }

    pub fn add_i16(&mut self, v: i16) -> Result<()> {
        self.backend.add_i16(v)
    }

    /// Packs an unsigned 16-bit value given as `i32`; values outside `[0, 65535]` are
    /// rejected.
    pub fn add_u16(&mut self, v: i32) -> Result<()> {
        self.backend.add_u16(v)
    }

    pub fn add_i32(&mut self, v: i32) -> Result<()> {
        self.backend.add_i32(v)
    }

    /// Packs an unsigned 32-bit value given as `i64`; values outside `[0, 2^32 - 1]`
    /// are rejected.
    pub fn add_u32(&mut self, v: i64) -> Result<()> {
        self.backend.add_u32(v)
    }

    pub fn add_i64(&mut self, v: i64) -> Result<()> {
        self.backend.add_i64(v)
    }

    /// Packs an unsigned 64-bit value given as `i64`.
    ///
    /// Negative values are rejected, which limits the range to `[0, i64::MAX]`.
    pub fn add_u64(&mut self, v: i64) -> Result<()> {
        self.backend.add_u64(v)
    }

    /// Packs the raw IEEE-754 bits of `v`.
    pub fn add_f32(&mut self, v: f32) -> Result<()> {
        self.backend.add_f32(v)
    }

    /// Packs the raw IEEE-754 bits of `v`.
    pub fn add_f64(&mut self, v: f64) -> Result<()> {
        self.backend.add_f64(v)
    }

    /// Packs `v` as a single byte, `1` or `0`.
    pub fn add_bool(&mut self, v: bool) -> Result<()> {
        self.backend.add_bool(v)
    }

    /// Packs the 32-bit handle of `obj`, or zero for `None`.
    pub fn add_obj(&mut self, obj: Option<&dyn ObjectRef>) -> Result<()> {
        self.backend.add_obj(obj)
    }

    forward_vector_ops! {
        i8: i8,
        u8: i16,
        i16: i16,
        u16: i32,
        i32: i32,
        u32: i64,
        i64: i64,
        u64: i64,
        f32: f32,
        f64: f64,
    }

    /// Packs the 4 elements of a 2x2 matrix as floats, in the order given.
    pub fn add_matrix2(&mut self, m: &[f32; 4]) -> Result<()> {
        self.backend.add_matrix2(m)
    }

    /// Packs the 9 elements of a 3x3 matrix as floats, in the order given.
    pub fn add_matrix3(&mut self, m: &[f32; 9]) -> Result<()> {
        self.backend.add_matrix3(m)
    }

    /// Packs the 16 elements of a 4x4 matrix as floats, in the order given.
    pub fn add_matrix4(&mut self, m: &[f32; 16]) -> Result<()> {
        self.backend.add_matrix4(m)
    }

    /// The whole record, `capacity` bytes, independent of the cursor.
    ///
    /// This borrows the live buffer rather than copying it.
    pub fn snapshot(&self) -> &[u8] {
        self.backend.snapshot()
    }

    /// Consumes the packer and hands off the whole record.
    pub fn into_bytes(self) -> Box<[u8]> {
        self.backend.into_bytes()
    }
}

impl std::fmt::Debug for FieldPacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldPacker")
            .field("mode", &self.mode)
            .field("capacity", &self.capacity())
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{LocalPacker, backend::BackendFactory};

    fn assert_send<T: Send>() {}

    fn assert_sync<T: Sync>() {}

    /// Reports a cursor past the end of its buffer.
    struct RunawayBackend(LocalPacker);

    impl PackBackend for RunawayBackend {
        fn capacity(&self) -> usize {
            self.0.capacity()
        }

        fn position(&self) -> usize {
            self.0.capacity() + 4
        }

        fn align(&mut self, boundary: usize) -> Result<()> {
            self.0.align(boundary)
        }

        fn rewind(&mut self) {
            self.0.rewind()
        }

        fn seek(&mut self, pos: usize) -> Result<()> {
            self.0.seek(pos)
        }

        fn skip(&mut self, delta: isize) -> Result<()> {
            self.0.skip(delta)
        }

        fn add_i8(&mut self, v: i8) -> Result<()> {
            self.0.add_i8(v)
        }

        fn add_u8(&mut self, v: i16) -> Result<()> {
            self.0.add_u8(v)
        }

        fn add_i16(&mut self, v: i16) -> Result<()> {
            self.0.add_i16(v)
        }

        fn add_u16(&mut self, v: i32) -> Result<()> {
            self.0.add_u16(v)
        }

        fn add_i32(&mut self, v: i32) -> Result<()> {
            self.0.add_i32(v)
        }

        fn add_u32(&mut self, v: i64) -> Result<()> {
            self.0.add_u32(v)
        }

        fn add_i64(&mut self, v: i64) -> Result<()> {
            self.0.add_i64(v)
        }

        fn add_u64(&mut self, v: i64) -> Result<()> {
            self.0.add_u64(v)
        }

        fn snapshot(&self) -> &[u8] {
            self.0.snapshot()
        }

        fn into_bytes(self: Box<Self>) -> Box<[u8]> {
            Box::new(self.0).into_bytes()
        }
    }

    struct RunawayFactory;

    impl BackendFactory for RunawayFactory {
        fn create(&self, capacity: usize) -> Box<dyn PackBackend> {
            Box::new(RunawayBackend(LocalPacker::new(capacity)))
        }
    }

    struct Handle(i32);

    impl ObjectRef for Handle {
        fn id(&self) -> i32 {
            self.0
        }
    }

    #[test]
    fn test_new_packer_is_local_and_zeroed() {
        let packer = FieldPacker::new(24);
        assert_eq!(packer.mode(), PackingMode::Local);
        assert_eq!(packer.capacity(), 24);
        assert_eq!(packer.remaining(), 24);
        assert_eq!(packer.snapshot(), &[0u8; 24]);
    }

    #[test]
    fn test_packer_can_cross_threads() {
        assert_send::<FieldPacker>();
        assert_sync::<Mutex<FieldPacker>>();

        let mut packer = FieldPacker::new(8);
        packer.add_i16(5).unwrap();
        let shared = Arc::new(Mutex::new(packer));
        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || shared.lock().unwrap().add_i32(-1))
        };
        worker.join().unwrap().unwrap();

        let packer = shared.lock().unwrap();
        assert_eq!(packer.position(), 8);
        assert_eq!(packer.snapshot(), &[5, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_remaining_with_cursor_past_end() {
        let config = PackerConfig::delegating(Arc::new(RunawayFactory));
        let packer = FieldPacker::with_config(8, &config);
        assert_eq!(packer.position(), 12);
        assert_eq!(packer.remaining(), 0);
    }

    #[test]
    fn test_add_obj() {
        let mut packer = FieldPacker::new(12);
        packer.add_bool(true).unwrap();
        packer.add_obj(Some(&Handle(0x0a0b0c0d))).unwrap();
        packer.add_obj(None).unwrap();
        assert_eq!(packer.position(), 12);
        assert_eq!(
            packer.snapshot(),
            &[1, 0, 0, 0, 0x0d, 0x0c, 0x0b, 0x0a, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_debug_output() {
        let mut packer = FieldPacker::new(8);
        packer.add_i16(3).unwrap();
        assert_eq!(
            format!("{packer:?}"),
            "FieldPacker { mode: Local, capacity: 8, position: 2 }"
        );
    }

    #[test]
    fn test_into_bytes_hands_off_full_buffer() {
        let mut packer = FieldPacker::new(6);
        packer.add_u8(200).unwrap();
        let bytes = packer.into_bytes();
        assert_eq!(&*bytes, &[200, 0, 0, 0, 0, 0]);
    }
}
