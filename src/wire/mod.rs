//! Wire-level helpers shared by the option and message codecs.
//!
//! Grounded on `examples/original_source/numeric.go` and `hex.go`: small,
//! dependency-free byte-fiddling that doesn't belong on [`crate::message`]
//! or [`crate::option`] directly.

pub mod hex;
pub mod num;
