// isodep/src/session/async_session.rs

//! Tokio flavour of [`Session`](super::Session).

use crate::config::IsoDepConfig;
use crate::engine::{Dispatch, IsoDep};
use crate::session::{
    DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY, Outcome, Recorder, Step, feed, unexpected,
};
use crate::timing::{Clock, StdClock};
use crate::transport::AsyncTransport;
use crate::types::{EngineState, Fsd, TagParameters};
use crate::Result;

/// ISO-DEP session over an [`AsyncTransport`].
///
/// The SFGT wait before the first frame uses `tokio::time::sleep`.
pub struct AsyncSession<T, C: Clock = StdClock> {
    engine: IsoDep<Recorder, Vec<u8>, C>,
    transport: T,
}

impl<T: AsyncTransport> AsyncSession<T, StdClock> {
    /// Create a session with default buffer sizes.
    pub fn new(transport: T, config: IsoDepConfig) -> Result<Self> {
        Self::with_clock(transport, config, StdClock)
    }
}

impl<T: AsyncTransport, C: Clock> AsyncSession<T, C> {
    /// Create a session with default buffer sizes and a custom clock.
    pub fn with_clock(transport: T, config: IsoDepConfig, clock: C) -> Result<Self> {
        let mut engine = IsoDep::with_clock(Recorder::default(), config, clock);
        engine.init(vec![0; DEFAULT_TX_CAPACITY], vec![0; DEFAULT_RX_CAPACITY])?;
        Ok(Self { engine, transport })
    }

    /// RATS/ATS exchange. Returns the negotiated tag parameters.
    pub async fn activate(&mut self, fsd: Fsd, did: u8) -> Result<TagParameters> {
        self.engine.rats_send(fsd, did)?;
        match self.run().await? {
            Outcome::Selected(tag) => Ok(tag),
            other => Err(unexpected(other)),
        }
    }

    /// Send an APDU and return the complete response.
    pub async fn transceive(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        if let Dispatch::Deferred(delay) = self.engine.transmit(apdu)? {
            tokio::time::sleep(delay).await;
            self.engine.send_deferred()?;
        }
        match self.run().await? {
            Outcome::Data(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }

    /// Send S(DESELECT) and wait for the tag to confirm it.
    pub async fn deselect(&mut self) -> Result<()> {
        self.engine.deselect()?;
        match self.run().await? {
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

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn run(&mut self) -> Result<Outcome> {
        loop {
            match self.engine.handler_mut().next_step()? {
                Step::Done(outcome) => return Ok(outcome),
                Step::Exchange(frame, fdt) => {
                    let answer = self.transport.transceive(&frame, fdt.to_duration()).await;
                    feed(&mut self.engine, answer)?;
                }
            }
        }
    }
}
