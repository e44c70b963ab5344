//! Core definitions shared by all fieldpack-* crates: the error taxonomy and the
//! `Result` alias.

pub mod error;
pub mod result;

pub use result::Result;
