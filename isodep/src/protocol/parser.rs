// isodep/src/protocol/parser.rs
//! Bounds-checked helpers shared by the decoders.

use crate::{Error, Result};

/// Ensure the slice has at least `min` bytes.
pub fn ensure_len(data: &[u8], min: usize, what: &str) -> Result<()> {
    if data.len() < min {
        return Err(Error::syntax(format!(
            "{} too short: expected at least {} bytes, got {}",
            what,
            min,
            data.len()
        )));
    }
    Ok(())
}

/// Read a single byte at `idx` with bounds checking.
pub fn byte_at(data: &[u8], idx: usize, what: &str) -> Result<u8> {
    ensure_len(data, idx + 1, what)?;
    Ok(data[idx])
}

/// Number of header bytes (PCB, optional DID, optional NAD) in front of INF.
pub fn header_len(pcb: u8, allow_nad: bool) -> usize {
    let mut len = 1;
    if pcb & crate::constants::PCB_DID_BIT != 0 {
        len += 1;
    }
    if allow_nad && pcb & crate::constants::PCB_NAD_BIT != 0 {
        len += 1;
    }
    len
}
