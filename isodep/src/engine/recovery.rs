// isodep/src/engine/recovery.rs
//! Retry bookkeeping for timeouts and transport errors.

use derive_more::Display;

use crate::config::IsoDepConfig;

/// Kind of the last frame sent for which a response is still awaited.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameKind {
    /// Nothing outstanding.
    #[default]
    None,
    /// RATS awaiting ATS.
    Rats,
    /// S(DESELECT) awaiting its response.
    Deselect,
    /// S(WTX) response awaiting the tag.
    WtxResponse,
    /// Last (or only) I-block of a message.
    I,
    /// Chained I-block, or R(ACK) during inbound chaining.
    IChaining,
}

impl FrameKind {
    /// Retry budget for this frame kind; `None` for kinds that never retry.
    pub fn retry_limit(self, config: &IsoDepConfig) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Rats => Some(config.rats_retry),
            Self::Deselect => Some(config.deselect_retry),
            Self::WtxResponse => Some(config.wtx_retry),
            Self::I => Some(config.nak_retry),
            Self::IChaining => Some(config.ack_retry),
        }
    }
}

/// What the supervisor decided after a timeout or transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing outstanding.
    Idle,
    /// Retransmit for `FrameKind`; `attempt` is 1-based.
    Retry { kind: FrameKind, attempt: u8 },
    /// Budget exhausted.
    GiveUp(FrameKind),
}

/// Error recovery bookkeeping for the outstanding frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorRecovery {
    last_frame: FrameKind,
    retries: u8,
    wtxm: u8,
}

impl ErrorRecovery {
    /// Forget the outstanding frame.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Note that a frame of `kind` went out. Starting a new kind restarts
    /// the retry count.
    pub fn record(&mut self, kind: FrameKind) {
        if self.last_frame != kind {
            self.retries = 0;
        }
        self.last_frame = kind;
    }

    /// Note an S(WTX) response with its multiplier.
    pub fn record_wtx(&mut self, wtxm: u8) {
        self.record(FrameKind::WtxResponse);
        self.wtxm = wtxm;
    }

    /// Kind of the outstanding frame.
    pub fn last_frame(&self) -> FrameKind {
        self.last_frame
    }

    /// Retries spent on the outstanding frame.
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Multiplier of the last S(WTX) response.
    pub fn wtxm(&self) -> u8 {
        self.wtxm
    }

    /// Count one timeout/error event against the outstanding frame.
    pub fn next_attempt(&mut self, config: &IsoDepConfig) -> Recovery {
        let Some(limit) = self.last_frame.retry_limit(config) else {
            return Recovery::Idle;
        };
        self.retries = self.retries.saturating_add(1);
        if self.retries > limit {
            Recovery::GiveUp(self.last_frame)
        } else {
            Recovery::Retry {
                kind: self.last_frame,
                attempt: self.retries,
            }
        }
    }
}
