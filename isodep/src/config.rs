// isodep/src/config.rs
//! Engine configuration: retry budgets per outstanding frame kind.

/// Retry budgets used by the error recovery supervisor.
///
/// Each value is the number of retransmissions allowed for that frame kind
/// before the exchange is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IsoDepConfig {
    /// RATS retransmissions.
    pub rats_retry: u8,
    /// R(NAK) sent after a lost I-block response. Also bounds stale-ACK
    /// retransmissions during chaining.
    pub nak_retry: u8,
    /// R(ACK) retransmissions while receiving a chained message.
    pub ack_retry: u8,
    /// S(WTX) response retransmissions.
    pub wtx_retry: u8,
    /// S(DESELECT) retransmissions.
    pub deselect_retry: u8,
}

impl Default for IsoDepConfig {
    fn default() -> Self {
        Self {
            rats_retry: 1,
            nak_retry: 2,
            ack_retry: 2,
            wtx_retry: 2,
            deselect_retry: 2,
        }
    }
}

impl IsoDepConfig {
    /// Same as `Default`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the RATS retry budget.
    pub fn with_rats_retry(mut self, n: u8) -> Self {
        self.rats_retry = n;
        self
    }

    /// Set the R(NAK) budget for unanswered I-blocks.
    pub fn with_nak_retry(mut self, n: u8) -> Self {
        self.nak_retry = n;
        self
    }

    /// Set the budget for unanswered chained blocks and R(ACK)s.
    pub fn with_ack_retry(mut self, n: u8) -> Self {
        self.ack_retry = n;
        self
    }

    /// Set the S(WTX) response retry budget.
    pub fn with_wtx_retry(mut self, n: u8) -> Self {
        self.wtx_retry = n;
        self
    }

    /// Set the S(DESELECT) retry budget.
    pub fn with_deselect_retry(mut self, n: u8) -> Self {
        self.deselect_retry = n;
        self
    }
}
