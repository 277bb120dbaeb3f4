//! folio-vector
//!
//! Dense embedding matrix with exact inner-product search, plus the
//! little-endian file codec it is persisted with.

pub mod codec;
pub mod matrix;

pub use matrix::{l2_normalize, VectorIndex};
