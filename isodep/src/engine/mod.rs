// isodep/src/engine/mod.rs

//! The ISO-DEP engine.
//!
//! [`IsoDep`] is a non-blocking, callback-driven state machine. It never
//! performs I/O itself: outbound frames are handed to
//! [`IsoDepHandler::ready_to_send`] and the radio layer feeds responses back
//! through [`IsoDep::on_frame_received`], [`IsoDep::on_timeout`] and
//! [`IsoDep::on_transport_error`].
//!
//! The engine is not reentrant. All methods take `&mut self`; callers that
//! share an engine between execution contexts must serialize access.

pub mod chaining;
pub mod handler;
pub mod recovery;

use std::time::Duration;

use crate::config::IsoDepConfig;
use crate::protocol::block::{self, Block};
use crate::protocol::{encode_rats, parse_ats};
use crate::timing::{self, Clock, Fc, StdClock};
use crate::types::{BlockNumber, EngineState, Fsd, TagParameters};
use crate::utils::HexSlice;
use crate::{Error, Result};

pub use chaining::{FrameBuffer, TransmitSession};
pub use handler::IsoDepHandler;
pub use recovery::{ErrorRecovery, FrameKind, Recovery};

/// Outcome of [`IsoDep::transmit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The first frame went to the transport.
    Sent,
    /// The start-up frame guard time has not elapsed yet. Call
    /// [`IsoDep::send_deferred`] after the given delay.
    Deferred(Duration),
}

#[derive(Debug)]
struct Buffers<B> {
    tx: FrameBuffer<B>,
    rx: FrameBuffer<B>,
}

/// ISO/IEC 14443-4 reader-side protocol engine.
///
/// `B` is the caller-owned storage for the transmit and reassembly buffers
/// (`Vec<u8>`, `[u8; N]`, `&mut [u8]`, ...). `C` supplies the time base for
/// the start-up frame guard time.
pub struct IsoDep<H, B = Vec<u8>, C: Clock = StdClock> {
    state: EngineState,
    config: IsoDepConfig,
    handler: H,
    clock: C,
    buffers: Option<Buffers<B>>,
    tag: Option<TagParameters>,
    requested_did: u8,
    fsd: Option<Fsd>,
    block_number: BlockNumber,
    recovery: ErrorRecovery,
    session: Option<TransmitSession>,
    ats_expected: bool,
    ats_received_at: Option<C::Instant>,
    first_transfer: bool,
    deferred: bool,
}

impl<H, B> IsoDep<H, B, StdClock>
where
    H: IsoDepHandler,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Create an uninitialized engine using the system clock.
    pub fn new(handler: H, config: IsoDepConfig) -> Self {
        Self::with_clock(handler, config, StdClock)
    }
}

impl<H, B, C> IsoDep<H, B, C>
where
    H: IsoDepHandler,
    B: AsRef<[u8]> + AsMut<[u8]>,
    C: Clock,
{
    /// Create an uninitialized engine with an explicit clock.
    pub fn with_clock(handler: H, config: IsoDepConfig, clock: C) -> Self {
        Self {
            state: EngineState::Uninitialized,
            config,
            handler,
            clock,
            buffers: None,
            tag: None,
            requested_did: 0,
            fsd: None,
            block_number: BlockNumber::ZERO,
            recovery: ErrorRecovery::default(),
            session: None,
            ats_expected: false,
            ats_received_at: None,
            first_transfer: false,
            deferred: false,
        }
    }

    /// Attach the transmit and reassembly buffers.
    ///
    /// Both must hold at least 16 bytes.
    pub fn init(&mut self, tx_buf: B, rx_buf: B) -> Result<()> {
        let (tx_len, rx_len) = (tx_buf.as_ref().len(), rx_buf.as_ref().len());
        if tx_len < crate::constants::FSD_MIN {
            log::error!(
                "tx buffer too small: {} bytes, minimum {}",
                tx_len,
                crate::constants::FSD_MIN
            );
            return Err(Error::invalid_argument(format!(
                "tx buffer of {} bytes is below the 16 byte minimum",
                tx_len
            )));
        }
        if rx_len < crate::constants::FSD_MIN {
            log::error!(
                "rx buffer too small: {} bytes, minimum {}",
                rx_len,
                crate::constants::FSD_MIN
            );
            return Err(Error::invalid_argument(format!(
                "rx buffer of {} bytes is below the 16 byte minimum",
                rx_len
            )));
        }
        if self.state != EngineState::Uninitialized {
            log::error!("ISO-DEP engine already initialized");
            return Err(Error::AlreadyInitialized);
        }

        self.buffers = Some(Buffers {
            tx: FrameBuffer::new(tx_buf),
            rx: FrameBuffer::new(rx_buf),
        });
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Send RATS and wait for the ATS.
    pub fn rats_send(&mut self, fsd: Fsd, did: u8) -> Result<()> {
        self.expect_state(&[EngineState::Initialized, EngineState::Selected])?;

        let rats = encode_rats(fsd, did)?;
        let buffers = self.buffers_mut()?;
        if buffers.tx.capacity() < fsd.value() {
            log::error!(
                "FSD {} exceeds tx buffer of {} bytes",
                fsd.value(),
                buffers.tx.capacity()
            );
            return Err(Error::OutOfMemory {
                required: fsd.value(),
                available: buffers.tx.capacity(),
            });
        }
        buffers.tx.storage_mut()[..rats.len()].copy_from_slice(&rats);
        buffers.tx.set_len(rats.len());

        self.state = EngineState::Transfer;
        self.clear_transmission();
        self.requested_did = did;
        self.fsd = Some(fsd);
        self.ats_expected = true;
        self.recovery.record(FrameKind::Rats);

        log::debug!("sending RATS (FSD {}, DID {})", fsd.value(), did);
        self.emit(timing::rats_fdt());
        Ok(())
    }

    /// Send an application message, chaining it over several I-blocks when
    /// it exceeds the tag's frame size.
    pub fn transmit(&mut self, data: &[u8]) -> Result<Dispatch> {
        if let Err(err) = self.expect_state(&[EngineState::Selected]) {
            log::error!("transmit rejected: tag not selected or transfer ongoing");
            return Err(err);
        }
        if data.is_empty() {
            return Err(Error::invalid_argument("empty transmit payload"));
        }
        let available = self.buffers_mut()?.rx.capacity();
        if data.len() > available {
            log::error!(
                "message of {} bytes exceeds rx buffer of {} bytes",
                data.len(),
                available
            );
            return Err(Error::OutOfMemory {
                required: data.len(),
                available,
            });
        }

        self.state = EngineState::Transfer;
        self.clear_transmission();
        // The exchange is half-duplex: the rx buffer holds the outbound
        // message until the first response block arrives.
        self.buffers_mut()?.rx.append(data)?;
        self.session = Some(TransmitSession::new(data.len()));

        if self.first_transfer {
            self.first_transfer = false;
            if let Some(delay) = self.guard_time_remaining() {
                log::debug!("waiting {:?} before the first frame after ATS", delay);
                self.deferred = true;
                return Ok(Dispatch::Deferred(delay));
            }
        }

        self.start_sending()?;
        Ok(Dispatch::Sent)
    }

    /// Send the first frame of a transmission that returned
    /// [`Dispatch::Deferred`].
    pub fn send_deferred(&mut self) -> Result<()> {
        self.expect_state(&[EngineState::Transfer])?;
        if !self.deferred {
            return Err(Error::invalid_argument("no deferred frame pending"));
        }
        self.deferred = false;
        self.start_sending()
    }

    /// Send S(DESELECT).
    pub fn deselect(&mut self) -> Result<()> {
        self.expect_state(&[EngineState::Selected])?;
        self.state = EngineState::Transfer;
        self.clear_transmission();

        let did = self.did();
        let buffers = self.buffers_mut()?;
        let len = block::encode_s_deselect(buffers.tx.storage_mut(), did)?;
        buffers.tx.set_len(len);
        self.recovery.record(FrameKind::Deselect);

        log::debug!("sending S(DESELECT)");
        self.emit(timing::deselect_fdt());
        Ok(())
    }

    /// Drop any in-flight exchange or deferred first frame and return to
    /// `Initialized`. No frame is sent and no callback fires.
    pub fn abort(&mut self) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            return Err(Error::InvalidState {
                expected: EngineState::Initialized,
                actual: self.state,
            });
        }
        log::debug!("aborting ISO-DEP exchange in state {}", self.state);
        self.clear_transmission();
        self.first_transfer = false;
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Feed a frame received from the tag.
    ///
    /// Frames are only accepted while an exchange is in flight. Protocol
    /// failures are reported through [`IsoDepHandler::error`]; the returned
    /// `Result` only covers caller misuse.
    pub fn on_frame_received(&mut self, frame: &[u8]) -> Result<()> {
        if frame.is_empty() {
            log::error!("received empty frame");
            return Err(Error::invalid_argument("empty frame"));
        }
        self.expect_state(&[EngineState::Transfer])?;
        if self.deferred {
            return Err(Error::invalid_argument(
                "frame received before the first frame was sent",
            ));
        }
        log::trace!("<- {}", HexSlice(frame));

        let outcome = if self.ats_expected {
            self.ats_expected = false;
            parse_ats(frame).map(|tag| self.on_ats(tag))
        } else {
            self.dispatch(frame)
        };

        if let Err(err) = outcome {
            self.fail(err);
        }
        Ok(())
    }

    /// The transport's frame delay timer expired without a response.
    pub fn on_timeout(&mut self) {
        self.recover(true);
    }

    /// The transport reported a failed exchange (CRC, collision, ...).
    pub fn on_transport_error(&mut self) {
        self.recover(false);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Parameters from the most recent successful ATS.
    pub fn tag(&self) -> Option<&TagParameters> {
        self.tag.as_ref()
    }

    /// FSD requested in the most recent RATS.
    pub fn fsd(&self) -> Option<Fsd> {
        self.fsd
    }

    /// Block number of the next I-block to send.
    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    /// Retry configuration.
    pub fn config(&self) -> &IsoDepConfig {
        &self.config
    }

    /// Frame kind the engine is waiting on a response for.
    pub fn last_frame(&self) -> FrameKind {
        self.recovery.last_frame()
    }

    /// Whether the first frame of a transmission is waiting on the SFGT.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// The event handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable access to the event handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    fn expect_state(&self, allowed: &[EngineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected: allowed[0],
                actual: self.state,
            })
        }
    }

    fn buffers_mut(&mut self) -> Result<&mut Buffers<B>> {
        let actual = self.state;
        self.buffers.as_mut().ok_or(Error::InvalidState {
            expected: EngineState::Initialized,
            actual,
        })
    }

    fn params(&self) -> TagParameters {
        self.tag.unwrap_or_default()
    }

    fn did(&self) -> Option<u8> {
        self.tag
            .as_ref()
            .filter(|tag| tag.uses_did())
            .map(|tag| tag.did)
    }

    fn guard_time_remaining(&self) -> Option<Duration> {
        let received = self.ats_received_at?;
        let guard = self.params().sfgt.to_duration();
        let elapsed = self.clock.elapsed(received);
        (elapsed < guard).then(|| guard - elapsed)
    }

    fn clear_transmission(&mut self) {
        if let Some(buffers) = self.buffers.as_mut() {
            buffers.rx.clear();
        }
        self.session = None;
        self.recovery.reset();
        self.ats_expected = false;
        self.deferred = false;
    }

    fn emit(&mut self, fdt: Fc) {
        if let Some(buffers) = self.buffers.as_ref() {
            log::trace!("-> {} (fdt {})", HexSlice(buffers.tx.as_slice()), fdt);
            self.handler.ready_to_send(buffers.tx.as_slice(), fdt);
        }
    }

    /// Report a protocol failure and fall back to `Initialized`.
    fn fail(&mut self, err: Error) {
        log::error!("ISO-DEP exchange failed: {}", err);
        self.clear_transmission();
        self.state = EngineState::Initialized;
        self.handler.error(err);
    }

    /// Send the first chunk of a new transmission. Encoding failures here
    /// are returned to the caller rather than reported via callback.
    fn start_sending(&mut self) -> Result<()> {
        if let Err(err) = self.send_chunk() {
            self.clear_transmission();
            self.state = EngineState::Initialized;
            return Err(err);
        }
        Ok(())
    }

    fn send_chunk(&mut self) -> Result<()> {
        self.encode_chunk(true)
    }

    /// Re-encode and resend the chunk in flight, unchanged.
    fn resend_chunk(&mut self) -> Result<()> {
        self.encode_chunk(false)
    }

    /// Encode the next (or, with `advance == false`, the current) chunk of
    /// the message staged in the rx buffer into an I-block.
    fn encode_chunk(&mut self, advance: bool) -> Result<()> {
        let tag = self.params();
        let did = self.did();
        let block_number = self.block_number;

        let Buffers { tx, rx } = self.buffers.as_mut().ok_or(Error::InvalidState {
            expected: EngineState::Selected,
            actual: self.state,
        })?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::semantic("no transmission in progress"))?;

        let (range, chaining) = if advance {
            let frame_size = tag.fsc.min(tx.capacity());
            let max_payload = frame_size.saturating_sub(tag.header_len()).max(1);
            session.advance(max_payload)
        } else {
            session.current()
        };
        let len = block::encode_i_block(
            tx.storage_mut(),
            block_number,
            chaining,
            did,
            &rx.as_slice()[range],
        )?;
        tx.set_len(len);
        log::debug!(
            "sending I-block {} ({} bytes{})",
            block_number,
            len,
            if chaining { ", chaining" } else { "" }
        );

        self.recovery.record(FrameKind::I);
        self.emit(timing::block_fdt(tag.fwt));
        Ok(())
    }

    fn send_r_block(&mut self, nak: bool) -> Result<()> {
        let fwt = self.params().fwt;
        let did = self.did();
        let block_number = self.block_number;
        let buffers = self.buffers_mut()?;
        let len = block::encode_r_block(buffers.tx.storage_mut(), block_number, nak, did)?;
        buffers.tx.set_len(len);

        log::debug!("sending R({})", if nak { "NAK" } else { "ACK" });
        self.emit(timing::block_fdt(fwt));
        Ok(())
    }

    fn on_ats(&mut self, mut tag: TagParameters) {
        tag.did = self.requested_did;
        log::debug!(
            "ATS: fsc {} fwt {} sfgt {} did {} nad {} historical [{}]",
            tag.fsc,
            tag.fwt,
            tag.sfgt,
            tag.did_supported,
            tag.nad_supported,
            tag.historical_hex()
        );

        self.tag = Some(tag);
        self.ats_received_at = Some(self.clock.now());
        self.block_number = BlockNumber::ZERO;
        self.first_transfer = true;
        self.recovery.reset();
        self.state = EngineState::Selected;
        self.handler.selected(&tag);
    }

    fn dispatch(&mut self, frame: &[u8]) -> Result<()> {
        match Block::decode(frame)? {
            Block::Information {
                block_number,
                chaining,
                payload,
            } => self.handle_i_block(block_number, chaining, payload),
            Block::ReceiveReady { block_number, nak } => self.handle_r_block(block_number, nak),
            Block::Wtx { wtxm } => self.handle_wtx(wtxm),
            Block::Deselect => {
                self.handle_deselect();
                Ok(())
            }
        }
    }

    fn handle_i_block(
        &mut self,
        block_number: BlockNumber,
        chaining: bool,
        payload: &[u8],
    ) -> Result<()> {
        log::debug!("I-block {} received ({} bytes)", block_number, payload.len());
        if let Some(session) = self.session.take() {
            if session.remaining() > 0 {
                return Err(Error::semantic(format!(
                    "I-block received with {} bytes still to send",
                    session.remaining()
                )));
            }
            // First response block: the staged message is no longer needed
            self.buffers_mut()?.rx.clear();
        }
        self.buffers_mut()?.rx.append(payload)?;

        if block_number == self.block_number {
            self.block_number.toggle();
        }

        if chaining {
            log::debug!("chaining bit set, acknowledging");
            self.recovery.record(FrameKind::IChaining);
            return self.send_r_block(false);
        }

        self.recovery.record(FrameKind::I);
        self.state = EngineState::Selected;
        if let Some(buffers) = self.buffers.as_ref() {
            self.handler.data_received(buffers.rx.as_slice());
        }
        Ok(())
    }

    fn handle_r_block(&mut self, block_number: BlockNumber, nak: bool) -> Result<()> {
        if nak {
            log::debug!("R(NAK) received");
            return Err(Error::semantic("R(NAK) received from tag"));
        }
        log::debug!("R(ACK) {} received", block_number);

        let chaining = self.session.as_ref().is_some_and(|s| s.is_chaining());
        if !chaining {
            return Err(Error::semantic("R(ACK) received while not chaining"));
        }

        if block_number == self.block_number {
            self.block_number.toggle();
            return self.send_chunk();
        }

        let limit = self.config.nak_retry;
        let count = self
            .session
            .as_mut()
            .map(|s| s.note_retransmit())
            .unwrap_or(u8::MAX);
        if count > limit {
            return Err(Error::semantic(format!(
                "stale R(ACK) after {} retransmissions",
                limit
            )));
        }
        log::warn!("stale R(ACK) {}, resending block ({}/{})", block_number, count, limit);
        self.resend_chunk()
    }

    fn handle_wtx(&mut self, wtxm: u8) -> Result<()> {
        let fwt = self.params().fwt;
        let did = self.did();
        let buffers = self.buffers_mut()?;
        let len = block::encode_s_wtx(buffers.tx.storage_mut(), wtxm, did)?;
        buffers.tx.set_len(len);
        self.recovery.record_wtx(wtxm);

        log::debug!("S(WTX) request, WTXM {}", wtxm);
        self.emit(timing::wtx_fdt(fwt, wtxm));
        Ok(())
    }

    fn handle_deselect(&mut self) {
        log::debug!("S(DESELECT) response received");
        self.clear_transmission();
        self.state = EngineState::Initialized;
        self.handler.deselected();
    }

    fn recover(&mut self, timeout: bool) {
        if self.state != EngineState::Transfer || self.deferred {
            log::debug!("ignoring transport event in state {}", self.state);
            return;
        }

        let fwt = self.params().fwt;
        let outcome = match self.recovery.next_attempt(&self.config) {
            Recovery::Idle => Ok(()),
            Recovery::Retry { kind, attempt } => {
                log::warn!(
                    "{} waiting for response to {}, retry {}",
                    if timeout { "timeout" } else { "transmission error" },
                    kind,
                    attempt
                );
                match kind {
                    FrameKind::Rats => {
                        self.emit(timing::rats_fdt());
                        Ok(())
                    }
                    FrameKind::I => self.send_r_block(true),
                    FrameKind::IChaining => self.send_r_block(false),
                    FrameKind::WtxResponse => {
                        let wtxm = self.recovery.wtxm();
                        self.emit(timing::wtx_fdt(fwt, wtxm));
                        Ok(())
                    }
                    FrameKind::Deselect => {
                        self.emit(timing::deselect_fdt());
                        Ok(())
                    }
                    FrameKind::None => Ok(()),
                }
            }
            Recovery::GiveUp(kind) => Err(if timeout {
                Error::Timeout
            } else {
                Error::Transmission(format!("no valid response to {}", kind))
            }),
        };

        if let Err(err) = outcome {
            self.fail(err);
        }
    }
}
