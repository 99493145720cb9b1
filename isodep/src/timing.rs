// isodep/src/timing.rs
//! Frame timing: carrier-cycle durations, FWT/SFGT derivation and the
//! clock used to enforce the start-up frame guard time.

use std::time::Duration;

use derive_more::{Add, Display};

use crate::constants::{
    CARRIER_HZ, FWT_ACTIVATION, FWT_DEACTIVATION, FWT_DELTA, NFCA_FRAME_TIME, SFGT_DEFAULT,
};

/// A duration counted in carrier cycles (1/fc, fc = 13.56 MHz).
#[derive(Debug, Display, Add, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[display(fmt = "{} fc", _0)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fc(pub u32);

impl Fc {
    /// Wrap a cycle count.
    pub const fn new(cycles: u32) -> Self {
        Self(cycles)
    }

    /// Raw cycle count.
    pub fn cycles(self) -> u32 {
        self.0
    }

    /// Multiply by a WTX multiplier, saturating.
    pub fn scaled(self, factor: u8) -> Self {
        Self(self.0.saturating_mul(u32::from(factor)))
    }

    /// Convert to wall time, rounding up to the next microsecond.
    pub fn to_duration(self) -> Duration {
        let micros = (u64::from(self.0) * 1_000_000).div_ceil(CARRIER_HZ);
        Duration::from_micros(micros)
    }

    /// Whole milliseconds, rounded up.
    pub fn to_millis_ceil(self) -> u64 {
        (u64::from(self.0) * 1000).div_ceil(CARRIER_HZ)
    }
}

/// FWT for a given FWI: 256 * 16 * 2^FWI.
pub fn fwi_to_fwt(fwi: u8) -> Fc {
    Fc(256 * 16 * (1u32 << fwi))
}

/// SFGT for a given SFGI; SFGI = 0 yields the default guard time.
pub fn sfgi_to_sfgt(sfgi: u8) -> Fc {
    if sfgi == 0 {
        Fc(SFGT_DEFAULT)
    } else {
        fwi_to_fwt(sfgi) + Fc(384 * (1u32 << sfgi))
    }
}

/// Deadline for the ATS after a RATS.
pub fn rats_fdt() -> Fc {
    Fc(FWT_ACTIVATION + FWT_DELTA + NFCA_FRAME_TIME)
}

/// Deadline for the response to an S(DESELECT).
pub fn deselect_fdt() -> Fc {
    Fc(FWT_DEACTIVATION)
}

/// Deadline for the response to an I- or R-block.
pub fn block_fdt(fwt: Fc) -> Fc {
    fwt + Fc(FWT_DELTA + NFCA_FRAME_TIME)
}

/// Deadline after answering an S(WTX) request with multiplier `wtxm`.
pub fn wtx_fdt(fwt: Fc, wtxm: u8) -> Fc {
    fwt.scaled(wtxm) + Fc(FWT_DELTA + NFCA_FRAME_TIME)
}

/// Abstraction over a monotonic clock.
///
/// The engine only needs to know how much time passed since the ATS was
/// received.
pub trait Clock {
    type Instant: Copy;

    fn now(&self) -> Self::Instant;
    fn elapsed(&self, earlier: Self::Instant) -> Duration;
}

/// Standard library clock wrapper.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn elapsed(&self, earlier: Self::Instant) -> Duration {
        earlier.elapsed()
    }
}
