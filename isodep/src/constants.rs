// isodep/src/constants.rs
//! Protocol constants for ISO/IEC 14443-4 as profiled by the NFC Forum
//! Digital Protocol specification.
//!
//! All times are expressed in carrier cycles (1/fc, fc = 13.56 MHz).

/// Bit that must be set in every I-, R- and S-block PCB.
pub const BLOCK_FIXED_BIT: u8 = 0x02;

// PCB base patterns

/// I-block PCB with no flags and block number 0.
pub const I_BLOCK: u8 = 0x02;
/// R-block PCB (ACK) with block number 0.
pub const R_BLOCK: u8 = 0xA2;
/// S-block PCB for DESELECT.
pub const S_BLOCK: u8 = 0xC2;

// Indicator bits used to tell S- and R-blocks apart from I-blocks

/// Set in S-block PCBs.
pub const S_BLOCK_INDICATOR: u8 = 0x40;
/// Set in R- and S-block PCBs, clear in I-blocks.
pub const R_BLOCK_INDICATOR: u8 = 0x80;

/// Block number bit (I- and R-blocks).
pub const BLOCK_NUM_MASK: u8 = 0x01;

// PCB flag bits

/// A DID byte follows the PCB.
pub const PCB_DID_BIT: u8 = 0x08;
/// A NAD byte follows the PCB (and DID, if present).
pub const PCB_NAD_BIT: u8 = 0x04;
/// More I-blocks of the same message follow.
pub const I_BLOCK_CHAINING_BIT: u8 = 0x10;
/// R-block is a NAK rather than an ACK.
pub const R_BLOCK_NAK_BIT: u8 = 0x10;
/// S-block kind bits: 0b00 DESELECT, 0b11 WTX.
pub const S_BLOCK_WTX_MASK: u8 = 0x30;

/// WTXM is carried in the low six bits of the S(WTX) INF byte.
pub const WTXM_MASK: u8 = 0x3F;
/// Smallest valid waiting time extension multiplier.
pub const WTXM_MIN: u8 = 1;
/// Largest valid waiting time extension multiplier.
pub const WTXM_MAX: u8 = 59;

/// Size of the CRC_A trailer that the tag counts inside FSC.
pub const CRC_LEN: usize = 2;

/// Smallest frame size a reader must accept; also the minimum buffer size.
pub const FSD_MIN: usize = 16;

/// FSD/FSC value indexed by FSDI/FSCI.
pub const FSD_TABLE: [u16; 9] = [16, 24, 32, 40, 48, 64, 96, 128, 256];

// RATS command layout

/// RATS start byte.
pub const RATS_CMD: u8 = 0xE0;
/// DID in the RATS parameter byte.
pub const RATS_DID_MASK: u8 = 0x0F;
/// FSDI in the RATS parameter byte.
pub const RATS_FSDI_MASK: u8 = 0xF0;
/// Shift of FSDI within the RATS parameter byte.
pub const RATS_FSDI_OFFSET: u8 = 4;
/// Length of a RATS frame without CRC.
pub const RATS_LEN: usize = 2;

/// Highest DID a reader may assign.
pub const DID_MAX: u8 = 14;

// ATS layout

/// Shortest ATS: TL and T0.
pub const ATS_MIN_LEN: usize = 2;
/// Longest ATS the engine accepts, TL included.
pub const ATS_MAX_LEN: usize = 20;
/// FSCI in T0.
pub const ATS_T0_FSCI_MASK: u8 = 0x0F;
/// T0 flag: TA follows.
pub const ATS_T0_TA_PRESENT: u8 = 0x10;
/// T0 flag: TB follows.
pub const ATS_T0_TB_PRESENT: u8 = 0x20;
/// T0 flag: TC follows.
pub const ATS_T0_TC_PRESENT: u8 = 0x40;
/// TA flag: both directions must use the same divisor.
pub const ATS_TA_EQUAL_DIVISOR: u8 = 0x80;
/// TA bits for the supported PCD to PICC divisors.
pub const ATS_TA_DIVISOR_PL: u8 = 0x07;
/// Shift applied to the PCD to PICC divisor bits.
pub const ATS_TA_DIVISOR_PL_OFFSET: u8 = 1;
/// TA bits for the supported PICC to PCD divisors.
pub const ATS_TA_DIVISOR_LP: u8 = 0x70;
/// Shift applied to the PICC to PCD divisor bits.
pub const ATS_TA_DIVISOR_LP_OFFSET: u8 = 3;
/// FWI in TB.
pub const ATS_TB_FWI_MASK: u8 = 0xF0;
/// Shift of FWI within TB.
pub const ATS_TB_FWI_OFFSET: u8 = 4;
/// SFGI in TB.
pub const ATS_TB_SFGI_MASK: u8 = 0x0F;
/// FWI assumed when TB is absent.
pub const ATS_TB_FWI_DEFAULT: u8 = 4;
/// TC flag: the tag supports DID.
pub const ATS_TC_DID: u8 = 0x02;
/// TC flag: the tag supports NAD.
pub const ATS_TC_NAD: u8 = 0x01;

/// FWI and SFGI value 15 is reserved for future use.
pub const ATS_INDEX_RFU: u8 = 15;

/// Historical bytes kept from an ATS.
pub const HISTORICAL_MAX_LEN: usize = 15;

/// SFGT used when the ATS announces SFGI = 0.
pub const SFGT_DEFAULT: u32 = 6780;

/// Activation frame waiting time (RATS -> ATS).
pub const FWT_ACTIVATION: u32 = 71_680;

/// Deactivation frame waiting time (S(DESELECT) -> response).
pub const FWT_DEACTIVATION: u32 = 71_680;

/// Additional tolerance added on top of every FWT.
pub const FWT_DELTA: u32 = 49_152;

/// NFC-A frame transfer margin.
pub const NFCA_FRAME_TIME: u32 = 164 * 1356;

/// Carrier frequency in Hz.
pub const CARRIER_HZ: u64 = 13_560_000;
