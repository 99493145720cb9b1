// isodep/src/protocol/rats.rs
//! RATS command encoding.

use crate::constants::{DID_MAX, RATS_CMD, RATS_DID_MASK, RATS_FSDI_MASK, RATS_FSDI_OFFSET, RATS_LEN};
use crate::types::Fsd;
use crate::{Error, Result};

/// Reject DIDs outside 0-14 (15 is reserved).
pub fn validate_did(did: u8) -> Result<()> {
    if did > DID_MAX {
        return Err(Error::invalid_argument(format!(
            "DID {} out of range 0-{}",
            did, DID_MAX
        )));
    }
    Ok(())
}

/// Encode the two-byte RATS command.
pub fn encode_rats(fsd: Fsd, did: u8) -> Result<[u8; RATS_LEN]> {
    validate_did(did)?;
    let param =
        (did & RATS_DID_MASK) | ((fsd.selector() << RATS_FSDI_OFFSET) & RATS_FSDI_MASK);
    Ok([RATS_CMD, param])
}
