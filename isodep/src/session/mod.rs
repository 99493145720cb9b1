// isodep/src/session/mod.rs

//! Request/response drivers on top of the callback engine.
//!
//! [`Session`] owns an [`IsoDep`] engine and a [`Transport`] and turns the
//! engine's callbacks into plain blocking calls: every outbound frame is
//! exchanged through the transport and the answer (or timeout) is fed back
//! until the engine reports an outcome.

#[cfg(feature = "async")]
pub mod async_session;

#[cfg(feature = "async")]
pub use async_session::AsyncSession;

use crate::config::IsoDepConfig;
use crate::engine::{Dispatch, IsoDep, IsoDepHandler};
use crate::timing::{Clock, Fc, StdClock};
use crate::transport::Transport;
use crate::types::{EngineState, Fsd, TagParameters};
use crate::{Error, Result};

/// Default transmit buffer size; enough for the largest frame (FSD 256).
pub const DEFAULT_TX_CAPACITY: usize = 256;
/// Default reassembly buffer size for chained responses.
pub const DEFAULT_RX_CAPACITY: usize = 4096;

/// Engine outcome collected by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Selected(TagParameters),
    Deselected,
    Data(Vec<u8>),
    Failed(Error),
}

/// Next thing a driver has to do.
pub(crate) enum Step {
    Exchange(Vec<u8>, Fc),
    Done(Outcome),
}

/// Handler that parks the engine's output for the driver loop.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    outbound: Option<(Vec<u8>, Fc)>,
    outcome: Option<Outcome>,
}

impl IsoDepHandler for Recorder {
    fn ready_to_send(&mut self, frame: &[u8], fdt: Fc) {
        self.outbound = Some((frame.to_vec(), fdt));
    }

    fn selected(&mut self, tag: &TagParameters) {
        self.outcome = Some(Outcome::Selected(*tag));
    }

    fn deselected(&mut self) {
        self.outcome = Some(Outcome::Deselected);
    }

    fn data_received(&mut self, data: &[u8]) {
        self.outcome = Some(Outcome::Data(data.to_vec()));
    }

    fn error(&mut self, err: Error) {
        self.outcome = Some(Outcome::Failed(err));
    }
}

impl Recorder {
    pub(crate) fn next_step(&mut self) -> Result<Step> {
        if let Some(outcome) = self.outcome.take() {
            self.outbound = None;
            return Ok(Step::Done(outcome));
        }
        match self.outbound.take() {
            Some((frame, fdt)) => Ok(Step::Exchange(frame, fdt)),
            None => Err(Error::semantic("engine stalled without a frame to send")),
        }
    }
}

/// Feed one transport result back into the engine.
pub(crate) fn feed<C: Clock>(
    engine: &mut IsoDep<Recorder, Vec<u8>, C>,
    answer: Result<Vec<u8>>,
) -> Result<()> {
    match answer {
        Ok(frame) if frame.is_empty() => {
            log::warn!("transport returned an empty frame");
            engine.on_transport_error();
            Ok(())
        }
        Ok(frame) => engine.on_frame_received(&frame),
        Err(Error::Timeout) => {
            engine.on_timeout();
            Ok(())
        }
        Err(err) => {
            log::warn!("transport error: {}", err);
            engine.on_transport_error();
            Ok(())
        }
    }
}

pub(crate) fn unexpected(outcome: Outcome) -> Error {
    match outcome {
        Outcome::Failed(err) => err,
        other => Error::semantic(format!("unexpected engine outcome: {:?}", other)),
    }
}

/// Blocking ISO-DEP session over a [`Transport`].
pub struct Session<T, C: Clock = StdClock> {
    engine: IsoDep<Recorder, Vec<u8>, C>,
    transport: T,
}

impl<T: Transport> Session<T, StdClock> {
    /// Create a session with default buffer sizes.
    pub fn new(transport: T, config: IsoDepConfig) -> Result<Self> {
        Self::with_clock(transport, config, StdClock)
    }
}

impl<T: Transport, C: Clock> Session<T, C> {
    /// Create a session with default buffer sizes and a custom clock.
    pub fn with_clock(transport: T, config: IsoDepConfig, clock: C) -> Result<Self> {
        Self::with_buffers(
            transport,
            config,
            clock,
            DEFAULT_TX_CAPACITY,
            DEFAULT_RX_CAPACITY,
        )
    }

    /// Create a session with explicit transmit/reassembly buffer sizes.
    pub fn with_buffers(
        transport: T,
        config: IsoDepConfig,
        clock: C,
        tx_capacity: usize,
        rx_capacity: usize,
    ) -> Result<Self> {
        let mut engine = IsoDep::with_clock(Recorder::default(), config, clock);
        engine.init(vec![0; tx_capacity], vec![0; rx_capacity])?;
        Ok(Self { engine, transport })
    }

    /// RATS/ATS exchange. Returns the negotiated tag parameters.
    pub fn activate(&mut self, fsd: Fsd, did: u8) -> Result<TagParameters> {
        self.engine.rats_send(fsd, did)?;
        match self.run()? {
            Outcome::Selected(tag) => Ok(tag),
            other => Err(unexpected(other)),
        }
    }

    /// Send an APDU and return the complete response.
    pub fn transceive(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        if let Dispatch::Deferred(delay) = self.engine.transmit(apdu)? {
            std::thread::sleep(delay);
            self.engine.send_deferred()?;
        }
        match self.run()? {
            Outcome::Data(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }

    /// Send S(DESELECT) and wait for the tag to confirm it.
    pub fn deselect(&mut self) -> Result<()> {
        self.engine.deselect()?;
        match self.run()? {
            Outcome::Deselected => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Engine lifecycle state.
    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    /// Parameters of the selected tag.
    pub fn tag(&self) -> Option<&TagParameters> {
        self.engine.tag()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn run(&mut self) -> Result<Outcome> {
        loop {
            match self.engine.handler_mut().next_step()? {
                Step::Done(outcome) => return Ok(outcome),
                Step::Exchange(frame, fdt) => {
                    let answer = self.transport.transceive(&frame, fdt.to_duration());
                    feed(&mut self.engine, answer)?;
                }
            }
        }
    }
}
