// isodep/src/protocol/block.rs
//! I-, R- and S-block encoding and decoding.

use crate::constants::{
    BLOCK_FIXED_BIT, I_BLOCK, I_BLOCK_CHAINING_BIT, PCB_DID_BIT, R_BLOCK, R_BLOCK_INDICATOR,
    R_BLOCK_NAK_BIT, S_BLOCK, S_BLOCK_INDICATOR, S_BLOCK_WTX_MASK, WTXM_MASK, WTXM_MAX, WTXM_MIN,
};
use crate::protocol::parser::{byte_at, ensure_len, header_len};
use crate::types::BlockNumber;
use crate::{Error, Result};

/// Block category as encoded in the PCB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Information block.
    I,
    /// Receive-ready block (ACK/NAK).
    R,
    /// Supervisory block.
    S,
}

impl BlockType {
    /// Classify a PCB. A PCB without the fixed bit is a sequencing error.
    pub fn classify(pcb: u8) -> Result<Self> {
        if pcb & BLOCK_FIXED_BIT == 0 {
            return Err(Error::semantic(format!(
                "PCB {:#04x} lacks the block fixed bit",
                pcb
            )));
        }
        if pcb & S_BLOCK_INDICATOR != 0 {
            Ok(Self::S)
        } else if pcb & R_BLOCK_INDICATOR != 0 {
            Ok(Self::R)
        } else {
            Ok(Self::I)
        }
    }
}

/// A decoded inbound block. DID and NAD bytes have already been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    /// I-block.
    Information {
        /// Block number from the PCB.
        block_number: BlockNumber,
        /// More blocks of this message follow.
        chaining: bool,
        /// INF field.
        payload: &'a [u8],
    },
    /// R-block.
    ReceiveReady {
        /// Block number from the PCB.
        block_number: BlockNumber,
        /// NAK rather than ACK.
        nak: bool,
    },
    /// S(WTX) request.
    Wtx {
        /// Requested multiplier, already range checked.
        wtxm: u8,
    },
    /// S(DESELECT) response.
    Deselect,
}

impl<'a> Block<'a> {
    /// Decode a full block received from the tag.
    pub fn decode(frame: &'a [u8]) -> Result<Self> {
        let pcb = byte_at(frame, 0, "block")?;
        match BlockType::classify(pcb)? {
            BlockType::I => {
                let start = header_len(pcb, true);
                ensure_len(frame, start, "I-block")?;
                Ok(Block::Information {
                    block_number: BlockNumber::from_pcb(pcb),
                    chaining: pcb & I_BLOCK_CHAINING_BIT != 0,
                    payload: &frame[start..],
                })
            }
            BlockType::R => {
                let start = header_len(pcb, false);
                if frame.len() != start {
                    return Err(Error::syntax(format!(
                        "R-block must be {} bytes, got {}",
                        start,
                        frame.len()
                    )));
                }
                Ok(Block::ReceiveReady {
                    block_number: BlockNumber::from_pcb(pcb),
                    nak: pcb & R_BLOCK_NAK_BIT != 0,
                })
            }
            BlockType::S => Self::decode_supervisory(pcb, frame),
        }
    }

    fn decode_supervisory(pcb: u8, frame: &'a [u8]) -> Result<Self> {
        let start = header_len(pcb, false);
        ensure_len(frame, start, "S-block")?;
        let inf = &frame[start..];

        match pcb & S_BLOCK_WTX_MASK {
            0x00 => {
                if !inf.is_empty() {
                    return Err(Error::syntax("S(DESELECT) carries unexpected INF bytes"));
                }
                Ok(Block::Deselect)
            }
            S_BLOCK_WTX_MASK => {
                if inf.len() != 1 {
                    return Err(Error::syntax(format!(
                        "S(WTX) INF must be 1 byte, got {}",
                        inf.len()
                    )));
                }
                let wtxm = inf[0] & WTXM_MASK;
                if !(WTXM_MIN..=WTXM_MAX).contains(&wtxm) {
                    return Err(Error::syntax(format!("WTXM {} out of range 1-59", wtxm)));
                }
                Ok(Block::Wtx { wtxm })
            }
            other => Err(Error::syntax(format!(
                "unsupported S-block kind {:#04x}",
                other
            ))),
        }
    }
}

/// Write PCB and, when `did` is given, the DID byte. Returns the INF offset.
fn write_header(buf: &mut [u8], mut pcb: u8, did: Option<u8>) -> Result<usize> {
    let len = if did.is_some() { 2 } else { 1 };
    ensure_capacity(buf, len)?;
    if let Some(did) = did {
        pcb |= PCB_DID_BIT;
        buf[1] = did;
    }
    buf[0] = pcb;
    Ok(len)
}

fn ensure_capacity(buf: &[u8], required: usize) -> Result<()> {
    if buf.len() < required {
        return Err(Error::OutOfMemory {
            required,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Encode an I-block into `buf`, returning the frame length.
pub fn encode_i_block(
    buf: &mut [u8],
    block_number: BlockNumber,
    chaining: bool,
    did: Option<u8>,
    payload: &[u8],
) -> Result<usize> {
    let mut pcb = I_BLOCK | block_number.bit();
    if chaining {
        pcb |= I_BLOCK_CHAINING_BIT;
    }
    let start = write_header(buf, pcb, did)?;
    let end = start + payload.len();
    ensure_capacity(buf, end)?;
    buf[start..end].copy_from_slice(payload);
    Ok(end)
}

/// Encode an R(ACK) or R(NAK) block.
pub fn encode_r_block(
    buf: &mut [u8],
    block_number: BlockNumber,
    nak: bool,
    did: Option<u8>,
) -> Result<usize> {
    let mut pcb = R_BLOCK | block_number.bit();
    if nak {
        pcb |= R_BLOCK_NAK_BIT;
    }
    write_header(buf, pcb, did)
}

/// Encode an S(WTX) response echoing `wtxm`.
pub fn encode_s_wtx(buf: &mut [u8], wtxm: u8, did: Option<u8>) -> Result<usize> {
    let start = write_header(buf, S_BLOCK | S_BLOCK_WTX_MASK, did)?;
    ensure_capacity(buf, start + 1)?;
    buf[start] = wtxm;
    Ok(start + 1)
}

/// Encode an S(DESELECT) request.
pub fn encode_s_deselect(buf: &mut [u8], did: Option<u8>) -> Result<usize> {
    write_header(buf, S_BLOCK, did)
}
