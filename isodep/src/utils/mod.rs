//! Small helpers shared across the crate.

pub mod hex;

pub use hex::{HexSlice, bytes_to_hex};
