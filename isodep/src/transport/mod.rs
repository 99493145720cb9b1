// isodep/src/transport/mod.rs

//! Link to the contactless front-end.
//!
//! The engine itself is sans-IO; transports are only used by the
//! [`session`](crate::session) drivers.

pub mod mock;
pub mod traits;

pub use mock::MockTransport;
#[cfg(feature = "async")]
pub use traits::AsyncTransport;
pub use traits::Transport;
