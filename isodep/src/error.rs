// isodep/src/error.rs
//! Error type and result alias.

use derive_more::Display;
use thiserror::Error;

use crate::types::EngineState;

/// Common error type.
///
/// Caller misuse (`AlreadyInitialized`, `InvalidState`, `InvalidArgument`,
/// and buffer sizing `OutOfMemory`) is returned synchronously from the
/// public API. Protocol failures are delivered through
/// [`IsoDepHandler::error`](crate::engine::IsoDepHandler::error).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `init` was called twice.
    #[error("engine already initialized")]
    AlreadyInitialized,

    /// Operation not allowed in the current engine state.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// State the operation needs.
        expected: EngineState,
        /// State the engine was in.
        actual: EngineState,
    },

    /// Rejected caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied buffer is too small.
    #[error("out of memory: need {required} bytes, have {available}")]
    OutOfMemory {
        /// Bytes needed.
        required: usize,
        /// Capacity of the buffer.
        available: usize,
    },

    /// Malformed frame from the tag.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Well-formed frame that is out of sequence.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// Retries ran out waiting for the tag.
    #[error("operation timed out")]
    Timeout,

    /// The transport failed and retries ran out.
    #[error("transmission error: {0}")]
    Transmission(String),
}

/// Coarse classification of [`Error`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::AlreadyInitialized`].
    AlreadyInitialized,
    /// See [`Error::InvalidState`].
    InvalidState,
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::OutOfMemory`].
    OutOfMemory,
    /// See [`Error::Syntax`].
    Syntax,
    /// See [`Error::Semantic`].
    Semantic,
    /// See [`Error::Timeout`].
    Timeout,
    /// See [`Error::Transmission`].
    Transmission,
}

impl Error {
    /// Variant without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Semantic(_) => ErrorKind::Semantic,
            Self::Timeout => ErrorKind::Timeout,
            Self::Transmission(_) => ErrorKind::Transmission,
        }
    }

    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub(crate) fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
