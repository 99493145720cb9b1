// isodep/src/protocol/ats.rs

//! Answer To Select parsing.
//!
//! Layout: `TL T0 [TA] [TB] [TC] [historical bytes...]`. Absent interface
//! bytes take the defaults from the NFC Forum Digital Protocol.

use crate::constants::{
    ATS_INDEX_RFU, ATS_MAX_LEN, ATS_MIN_LEN, ATS_T0_FSCI_MASK, ATS_T0_TA_PRESENT,
    ATS_T0_TB_PRESENT, ATS_T0_TC_PRESENT, ATS_TA_DIVISOR_LP, ATS_TA_DIVISOR_LP_OFFSET,
    ATS_TA_DIVISOR_PL, ATS_TA_DIVISOR_PL_OFFSET, ATS_TA_EQUAL_DIVISOR, ATS_TB_FWI_DEFAULT,
    ATS_TB_FWI_MASK, ATS_TB_FWI_OFFSET, ATS_TB_SFGI_MASK, ATS_TC_DID, ATS_TC_NAD, CRC_LEN,
    FSD_TABLE,
};
use crate::protocol::parser::byte_at;
use crate::timing::{fwi_to_fwt, sfgi_to_sfgt};
use crate::types::TagParameters;
use crate::{Error, Result};

/// Map FSCI to FSC in bytes, excluding the CRC. RFU codes read as 256.
pub fn fsci_to_fsc(fsci: u8) -> usize {
    let idx = (fsci as usize).min(FSD_TABLE.len() - 1);
    FSD_TABLE[idx] as usize - CRC_LEN
}

/// Parse an ATS into tag parameters. The DID is left at 0; the caller
/// fills in the value it requested in the RATS.
pub fn parse_ats(data: &[u8]) -> Result<TagParameters> {
    if data.len() < ATS_MIN_LEN {
        return Err(Error::syntax(format!(
            "ATS too short: {} bytes",
            data.len()
        )));
    }

    let tl = data[0] as usize;
    if tl != data.len() || data.len() > ATS_MAX_LEN {
        return Err(Error::syntax(format!(
            "ATS length {} does not match TL {}",
            data.len(),
            tl
        )));
    }

    let t0 = data[1];
    let mut index = 2usize;
    let mut tag = TagParameters::default();
    tag.fsc = fsci_to_fsc(t0 & ATS_T0_FSCI_MASK);

    if t0 & ATS_T0_TA_PRESENT != 0 {
        let ta = byte_at(data, index, "ATS TA")?;
        tag.equal_divisor = ta & ATS_TA_EQUAL_DIVISOR != 0;
        tag.pl_divisor = (ta & ATS_TA_DIVISOR_PL) << ATS_TA_DIVISOR_PL_OFFSET;
        tag.lp_divisor = (ta & ATS_TA_DIVISOR_LP) >> ATS_TA_DIVISOR_LP_OFFSET;
        index += 1;
    }

    let (mut fwi, mut sfgi) = (ATS_TB_FWI_DEFAULT, 0);
    if t0 & ATS_T0_TB_PRESENT != 0 {
        let tb = byte_at(data, index, "ATS TB")?;
        fwi = (tb & ATS_TB_FWI_MASK) >> ATS_TB_FWI_OFFSET;
        sfgi = tb & ATS_TB_SFGI_MASK;
        index += 1;
    }
    if fwi == ATS_INDEX_RFU {
        fwi = ATS_TB_FWI_DEFAULT;
    }
    if sfgi == ATS_INDEX_RFU {
        sfgi = 0;
    }
    tag.fwt = fwi_to_fwt(fwi);
    tag.sfgt = sfgi_to_sfgt(sfgi);

    if t0 & ATS_T0_TC_PRESENT != 0 {
        let tc = byte_at(data, index, "ATS TC")?;
        tag.did_supported = tc & ATS_TC_DID != 0;
        tag.nad_supported = tc & ATS_TC_NAD != 0;
        index += 1;
    } else {
        tag.did_supported = true;
        tag.nad_supported = false;
    }

    if index < data.len() {
        tag.set_historical(&data[index..]);
    }

    Ok(tag)
}
