// isodep/src/transport/mock.rs
//! Scripted transport for tests and demos.

use std::collections::VecDeque;
use std::time::Duration;

use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Scripted transport for tests. Answers are replayed in order; an empty
/// queue behaves like a silent tag.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Every frame handed to `transceive`, with the timeout it was given.
    pub sent: Vec<(Vec<u8>, Duration)>,
    responses: VecDeque<Result<Vec<u8>>>,
}

impl MockTransport {
    /// Mock with no queued answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a mock with raw answer frames.
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut mock = Self::new();
        for resp in responses {
            mock.push_response(resp);
        }
        mock
    }

    /// Queue one answer frame.
    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push_back(Ok(resp));
    }

    /// Queue a silent tag.
    pub fn push_timeout(&mut self) {
        self.responses.push_back(Err(Error::Timeout));
    }

    /// Queue a link failure (anything but `Timeout`).
    pub fn push_error(&mut self, err: Error) {
        self.responses.push_back(Err(err));
    }

    /// Answers not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.len()
    }

    /// Outbound frames without their timeouts.
    pub fn sent_frames(&self) -> Vec<&[u8]> {
        self.sent.iter().map(|(f, _)| f.as_slice()).collect()
    }

    fn next(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.sent.push((frame.to_vec(), timeout));
        self.responses.pop_front().unwrap_or(Err(Error::Timeout))
    }
}

impl Transport for MockTransport {
    fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.next(frame, timeout)
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl crate::transport::traits::AsyncTransport for MockTransport {
    async fn transceive(&mut self, frame: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        self.next(frame, timeout)
    }
}
