//! Hex rendering for frame tracing.

use std::fmt;

/// Lowercase hex, one space between bytes.
///
/// `&[0xe0, 0x80]` -> `"e0 80"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    HexSlice(bytes).to_string()
}

/// Formats a byte slice as spaced lowercase hex without allocating, so it
/// can be passed straight to `log::trace!`.
#[derive(Debug, Clone, Copy)]
pub struct HexSlice<'a>(pub &'a [u8]);

impl fmt::Display for HexSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
