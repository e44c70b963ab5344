//! Fixed-capacity packing of typed scalar, vector and matrix values into the binary
//! argument records consumed by native compute kernels.
//!
//! The record layout follows natural C alignment: each value is padded to a multiple of
//! its own size (one-byte values are never padded) and stored little-endian. Padding
//! bytes are zero. The record is always the full fixed capacity long.
//!
//! [`FieldPacker`] is the entry point. It packs into a local buffer by default, or
//! forwards everything to a delegate [`PackBackend`] when built from a delegating
//! [`PackerConfig`].

pub mod backend;
pub mod config;
pub mod local;
pub mod packer;
pub mod scalar;

pub use backend::{BackendFactory, ObjectRef, PackBackend};
pub use config::{PackerConfig, PackingMode};
pub use fieldpack_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use local::LocalPacker;
pub use packer::FieldPacker;
pub use scalar::ScalarKind;
