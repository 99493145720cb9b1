// isodep/src/lib.rs

//! isodep
//!
//! Reader-side ISO/IEC 14443-4 (ISO-DEP) half-duplex block transmission
//! protocol: RATS/ATS activation, I/R/S block exchange with chaining,
//! waiting-time extensions, retries and deselection.
//!
//! The core is the sans-IO [`IsoDep`] engine, driven by callbacks. The
//! [`session`] module wraps it into blocking (and, with the `async`
//! feature, tokio) request/response drivers over a [`transport::Transport`].
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod session;
#[doc(hidden)]
pub mod test_support;
pub mod timing;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`
// and the protocol newtypes are available to consumers.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
