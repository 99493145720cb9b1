// isodep/src/engine/handler.rs
//! Engine callback trait.

use crate::timing::Fc;
use crate::types::TagParameters;
use crate::Error;

/// Callbacks from the engine to the radio layer and the application.
///
/// `ready_to_send` is the only required method: the implementation must
/// transmit `frame` and report back through
/// [`IsoDep::on_frame_received`](crate::engine::IsoDep::on_frame_received),
/// [`IsoDep::on_timeout`](crate::engine::IsoDep::on_timeout) or
/// [`IsoDep::on_transport_error`](crate::engine::IsoDep::on_transport_error)
/// once the exchange completes or `fdt` elapses.
pub trait IsoDepHandler {
    /// Transmit a frame and wait at most `fdt` for the answer.
    fn ready_to_send(&mut self, frame: &[u8], fdt: Fc);

    /// ATS accepted; the tag is selected.
    fn selected(&mut self, _tag: &TagParameters) {}

    /// The tag acknowledged S(DESELECT).
    fn deselected(&mut self) {}

    /// A complete (possibly reassembled) message arrived.
    fn data_received(&mut self, _data: &[u8]) {}

    /// The exchange failed; the engine is back in `Initialized`.
    fn error(&mut self, _err: Error) {}
}

impl<T: IsoDepHandler + ?Sized> IsoDepHandler for &mut T {
    fn ready_to_send(&mut self, frame: &[u8], fdt: Fc) {
        (**self).ready_to_send(frame, fdt)
    }

    fn selected(&mut self, tag: &TagParameters) {
        (**self).selected(tag)
    }

    fn deselected(&mut self) {
        (**self).deselected()
    }

    fn data_received(&mut self, data: &[u8]) {
        (**self).data_received(data)
    }

    fn error(&mut self, err: Error) {
        (**self).error(err)
    }
}

impl<T: IsoDepHandler + ?Sized> IsoDepHandler for Box<T> {
    fn ready_to_send(&mut self, frame: &[u8], fdt: Fc) {
        (**self).ready_to_send(frame, fdt)
    }

    fn selected(&mut self, tag: &TagParameters) {
        (**self).selected(tag)
    }

    fn deselected(&mut self) {
        (**self).deselected()
    }

    fn data_received(&mut self, data: &[u8]) {
        (**self).data_received(data)
    }

    fn error(&mut self, err: Error) {
        (**self).error(err)
    }
}
