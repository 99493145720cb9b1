// isodep/src/engine/chaining.rs
//! Outbound chunking state and the caller-owned frame buffers.

use std::ops::Range;

use crate::{Error, Result};

/// Fixed-capacity byte buffer over caller-owned storage.
///
/// The storage is never grown; `len` tracks how much of it is in use.
#[derive(Debug)]
pub struct FrameBuffer<B> {
    data: B,
    len: usize,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> FrameBuffer<B> {
    /// Wrap `data`; the buffer starts empty.
    pub fn new(data: B) -> Self {
        Self { data, len: 0 }
    }

    /// Size of the underlying storage.
    pub fn capacity(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Bytes in use.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are in use.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The bytes in use.
    pub fn as_slice(&self) -> &[u8] {
        &self.data.as_ref()[..self.len]
    }

    /// Drop the contents, keeping the storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Whole storage, for encoders that write from offset 0.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    /// Mark the first `len` bytes as the frame; clamped to capacity.
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.capacity());
    }

    /// Append bytes, failing without modification when they do not fit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let required = self.len + bytes.len();
        if required > self.capacity() {
            return Err(Error::OutOfMemory {
                required,
                available: self.capacity(),
            });
        }
        let start = self.len;
        self.data.as_mut()[start..required].copy_from_slice(bytes);
        self.len = required;
        Ok(())
    }

    /// Give the storage back to the caller.
    pub fn into_inner(self) -> B {
        self.data
    }
}

/// Progress of one outbound message split into I-blocks.
///
/// Only offsets are tracked; the message itself stays in the engine's
/// caller-owned buffer.
#[derive(Debug, Clone, Default)]
pub struct TransmitSession {
    len: usize,
    sent: usize,
    current: Range<usize>,
    chaining: bool,
    retransmits: u8,
}

impl TransmitSession {
    /// Start a session for a message of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Total message length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the message is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes handed out so far, including the chunk in flight.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.len - self.sent
    }

    /// Whether the chunk in flight has the chaining bit set.
    pub fn is_chaining(&self) -> bool {
        self.chaining
    }

    /// Take the next chunk of at most `max_payload` bytes. Returns its range
    /// within the message and whether more chunks follow it.
    pub fn advance(&mut self, max_payload: usize) -> (Range<usize>, bool) {
        let remaining = self.remaining();
        let (take, chaining) = if remaining > max_payload {
            (max_payload, true)
        } else {
            (remaining, false)
        };
        self.current = self.sent..self.sent + take;
        self.sent += take;
        self.chaining = chaining;
        self.retransmits = 0;
        (self.current.clone(), chaining)
    }

    /// The chunk most recently returned by [`advance`](Self::advance).
    pub fn current(&self) -> (Range<usize>, bool) {
        (self.current.clone(), self.chaining)
    }

    /// Count a retransmission of the current chunk; returns the new count.
    pub fn note_retransmit(&mut self) -> u8 {
        self.retransmits = self.retransmits.saturating_add(1);
        self.retransmits
    }
}
