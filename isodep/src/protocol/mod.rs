// isodep/src/protocol/mod.rs
//! Wire formats: RATS, ATS and the block layer.

pub mod ats;
pub mod block;
pub mod parser;
pub mod rats;

pub use ats::parse_ats;
pub use block::{Block, BlockType};
pub use rats::encode_rats;
