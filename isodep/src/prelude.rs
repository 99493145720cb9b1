// isodep/src/prelude.rs
//! Commonly used types, re-exported for glob import.

pub use crate::config::IsoDepConfig;
pub use crate::engine::{Dispatch, IsoDep, IsoDepHandler};
pub use crate::session::Session;
#[cfg(feature = "async")]
pub use crate::session::AsyncSession;
pub use crate::timing::{Clock, Fc, StdClock};
#[cfg(feature = "async")]
pub use crate::transport::AsyncTransport;
pub use crate::transport::{MockTransport, Transport};
pub use crate::{BlockNumber, EngineState, Error, ErrorKind, Fsd, Result, TagParameters};

pub use crate::utils::{HexSlice, bytes_to_hex};
