// isodep/src/types.rs
//! Shared protocol types.

use derive_more::Display;
use std::convert::TryFrom;

use crate::constants::{BLOCK_NUM_MASK, FSD_TABLE, HISTORICAL_MAX_LEN};
use crate::timing::Fc;
use crate::Error;

/// Engine lifecycle state.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// No buffers attached yet.
    Uninitialized,
    /// Buffers attached, no tag selected.
    Initialized,
    /// A tag answered RATS and is ready for exchanges.
    Selected,
    /// A request/response round is in flight.
    Transfer,
}

impl Default for EngineState {
    fn default() -> Self {
        EngineState::Uninitialized
    }
}

/// Frame size for the reader, selected by its FSDI code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fsd {
    /// 16 bytes (FSDI 0).
    Fsd16 = 0,
    /// 24 bytes (FSDI 1).
    Fsd24 = 1,
    /// 32 bytes (FSDI 2).
    Fsd32 = 2,
    /// 40 bytes (FSDI 3).
    Fsd40 = 3,
    /// 48 bytes (FSDI 4).
    Fsd48 = 4,
    /// 64 bytes (FSDI 5).
    Fsd64 = 5,
    /// 96 bytes (FSDI 6).
    Fsd96 = 6,
    /// 128 bytes (FSDI 7).
    Fsd128 = 7,
    /// 256 bytes (FSDI 8).
    Fsd256 = 8,
}

impl Fsd {
    /// Every frame size, ordered by FSDI.
    pub const ALL: [Fsd; 9] = [
        Fsd::Fsd16,
        Fsd::Fsd24,
        Fsd::Fsd32,
        Fsd::Fsd40,
        Fsd::Fsd48,
        Fsd::Fsd64,
        Fsd::Fsd96,
        Fsd::Fsd128,
        Fsd::Fsd256,
    ];

    /// FSDI code sent in the RATS parameter byte.
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Frame size in bytes.
    pub fn value(self) -> usize {
        FSD_TABLE[self as usize] as usize
    }
}

impl TryFrom<u8> for Fsd {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        Fsd::ALL
            .get(selector as usize)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("FSDI {} out of range 0-8", selector)))
    }
}

/// Alternating-bit sequence number for I- and R-blocks.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
#[display(fmt = "{}", _0)]
pub struct BlockNumber(u8);

impl BlockNumber {
    /// Block number after activation.
    pub const ZERO: Self = Self(0);

    /// Block number carried in a PCB.
    pub fn from_pcb(pcb: u8) -> Self {
        Self(pcb & BLOCK_NUM_MASK)
    }

    /// The number as the PCB bit value (0 or 1).
    pub fn bit(self) -> u8 {
        self.0
    }

    /// The other block number.
    pub fn toggled(self) -> Self {
        Self(self.0 ^ 0x01)
    }

    /// Flip in place.
    pub fn toggle(&mut self) {
        *self = self.toggled();
    }
}

/// Tag capabilities and timing negotiated from the ATS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagParameters {
    /// Frame size accepted by the tag (header + payload, CRC excluded).
    pub fsc: usize,
    /// Frame waiting time.
    pub fwt: Fc,
    /// Start-up frame guard time.
    pub sfgt: Fc,
    /// Supported PCD to PICC divisors as a bitmap (2 = fc/64, 4 = fc/32, 8 = fc/16).
    pub pl_divisor: u8,
    /// Supported PICC to PCD divisors, same encoding as `pl_divisor`.
    pub lp_divisor: u8,
    /// Both directions must use the same divisor.
    pub equal_divisor: bool,
    /// The tag accepts a DID byte.
    pub did_supported: bool,
    /// The tag accepts a NAD byte.
    pub nad_supported: bool,
    /// DID assigned in the RATS.
    pub did: u8,
    historical: [u8; HISTORICAL_MAX_LEN],
    historical_len: usize,
}

impl TagParameters {
    /// Historical bytes from the ATS (at most 15).
    pub fn historical(&self) -> &[u8] {
        &self.historical[..self.historical_len]
    }

    /// Store historical bytes, truncating to 15.
    pub fn set_historical(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(HISTORICAL_MAX_LEN);
        self.historical = [0u8; HISTORICAL_MAX_LEN];
        self.historical[..len].copy_from_slice(&bytes[..len]);
        self.historical_len = len;
    }

    /// Whether outbound blocks carry a DID byte.
    pub fn uses_did(&self) -> bool {
        self.did_supported && self.did != 0
    }

    /// Bytes of PCB (+ DID) prepended to every outbound block.
    pub fn header_len(&self) -> usize {
        if self.uses_did() { 2 } else { 1 }
    }

    /// Historical bytes as spaced hex, for logging.
    pub fn historical_hex(&self) -> String {
        crate::utils::bytes_to_hex(self.historical())
    }
}
