// isodep/src/transport/traits.rs
//! Transport traits used by the session drivers.

use std::time::Duration;

use crate::Result;

/// Half-duplex frame exchange with a PICC.
///
/// Implementations send `frame` (CRC appended by the front-end) and wait at
/// most `timeout` for the answer. A missing answer must be reported as
/// [`Error::Timeout`](crate::Error::Timeout); any other error is treated as
/// a transmission failure (CRC, collision, framing).
pub trait Transport {
    /// Send `frame` and return the answer received within `timeout`.
    fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        (**self).transceive(frame, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        (**self).transceive(frame, timeout)
    }
}

/// Async counterpart of [`Transport`].
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncTransport: Send {
    /// Send `frame` and return the answer received within `timeout`.
    async fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>>;
}
