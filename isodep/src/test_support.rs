//! Test support helpers shared by unit tests, the `tests/` directory and
//! benches: a controllable clock, a handler that records every callback,
//! and ATS builders.
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::IsoDepConfig;
use crate::engine::{IsoDep, IsoDepHandler};
use crate::timing::{Clock, Fc};
use crate::types::{Fsd, TagParameters};
use crate::Error;

/// Clock that only moves when told to. Clones share the same time.
#[doc(hidden)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward for every clone.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.now.get()
    }

    fn elapsed(&self, earlier: Duration) -> Duration {
        self.now.get().saturating_sub(earlier)
    }
}

/// Handler that keeps every callback for later assertions.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct RecordingHandler {
    /// Frames from `ready_to_send`, with their FDT.
    pub sent: Vec<(Vec<u8>, Fc)>,
    /// Tags from `selected`.
    pub selected: Vec<TagParameters>,
    /// Count of `deselected` calls.
    pub deselected: usize,
    /// Messages from `received`.
    pub received: Vec<Vec<u8>>,
    /// Errors from `error`.
    pub errors: Vec<Error>,
}

impl RecordingHandler {
    /// Most recent outbound frame.
    pub fn last_sent(&self) -> Option<&[u8]> {
        self.sent.last().map(|(f, _)| f.as_slice())
    }

    /// FDT of the most recent outbound frame.
    pub fn last_fdt(&self) -> Option<Fc> {
        self.sent.last().map(|(_, fdt)| *fdt)
    }
}

impl IsoDepHandler for RecordingHandler {
    fn ready_to_send(&mut self, frame: &[u8], fdt: Fc) {
        self.sent.push((frame.to_vec(), fdt));
    }

    fn selected(&mut self, tag: &TagParameters) {
        self.selected.push(*tag);
    }

    fn deselected(&mut self) {
        self.deselected += 1;
    }

    fn data_received(&mut self, data: &[u8]) {
        self.received.push(data.to_vec());
    }

    fn error(&mut self, err: Error) {
        self.errors.push(err);
    }
}

/// Engine type used throughout the tests.
#[doc(hidden)]
pub type TestEngine = IsoDep<RecordingHandler, Vec<u8>, ManualClock>;

/// Build an ATS: `TL T0` followed by `rest` (interface and historical
/// bytes). TL is computed.
#[doc(hidden)]
pub fn ats_bytes(t0: u8, rest: &[u8]) -> Vec<u8> {
    let mut ats = Vec::with_capacity(2 + rest.len());
    ats.push((2 + rest.len()) as u8);
    ats.push(t0);
    ats.extend_from_slice(rest);
    ats
}

/// Engine that went through RATS/ATS with the given ATS and whose SFGT has
/// already elapsed. The recorded frames are cleared.
#[doc(hidden)]
pub fn selected_engine_with_ats(ats: &[u8], config: IsoDepConfig) -> TestEngine {
    selected_engine_with_buffers(ats, config, 256, 256)
}

/// Like [`selected_engine_with_ats`] with explicit buffer sizes.
#[doc(hidden)]
pub fn selected_engine_with_buffers(
    ats: &[u8],
    config: IsoDepConfig,
    tx_capacity: usize,
    rx_capacity: usize,
) -> TestEngine {
    let clock = ManualClock::new();
    let mut engine =
        IsoDep::with_clock(RecordingHandler::default(), config, clock.clone());
    engine
        .init(vec![0; tx_capacity], vec![0; rx_capacity])
        .expect("init test engine");
    engine.rats_send(Fsd::Fsd16, 0).expect("send RATS");
    engine.on_frame_received(ats).expect("feed ATS");
    assert!(
        engine.handler().errors.is_empty(),
        "ATS rejected: {:?}",
        engine.handler().errors
    );
    clock.advance(Duration::from_secs(1));
    engine.handler_mut().sent.clear();
    engine.handler_mut().selected.clear();
    engine
}

/// Shorthand for an ATS made only of `TL T0`.
#[doc(hidden)]
pub fn selected_engine(t0: u8, config: IsoDepConfig) -> TestEngine {
    selected_engine_with_ats(&ats_bytes(t0, &[]), config)
}
