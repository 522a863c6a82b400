use alloc::vec;
use alloc::vec::Vec;

use defmt_or_log::{debug, info, warn};

use super::transport::ResponseSink;

/// Accumulates the body of the exchange in flight.
///
/// Owned by the cloud client and handed to the transport for the duration
/// of each request. Only one exchange may write into it at a time.
#[derive(Debug)]
pub struct ResponseBuffer {
    storage: Vec<u8>,
    // write offset of the exchange in flight
    cursor: usize,
    len: usize,
    overflowed: bool,
}

impl ResponseBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            cursor: 0,
            len: 0,
            overflowed: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Reallocates storage, dropping whatever was accumulated. Only valid
    /// between exchanges.
    pub fn resize(&mut self, new_capacity: usize) {
        self.storage = vec![0; new_capacity];
        self.cursor = 0;
        self.len = 0;
        self.overflowed = false;
        info!("Response buffer resized to {} bytes", new_capacity);
    }

    /// Bytes received since the last `on_connected`, bounded by the tracked
    /// length rather than by any terminator in the data.
    pub fn contents(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// Contents as text, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.contents()).ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the current exchange delivered more than fits. The stored
    /// contents are then clipped to capacity.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn clear(&mut self) {
        self.storage.fill(0);
        self.cursor = 0;
        self.len = 0;
        self.overflowed = false;
    }
}

impl ResponseSink for ResponseBuffer {
    fn on_connected(&mut self) {
        debug!("HTTP exchange connected");
        self.clear();
    }

    fn on_chunk(&mut self, chunk: &[u8]) {
        debug!("HTTP data chunk, len={}", chunk.len());
        let room = self.capacity() - self.cursor;
        let take = chunk.len().min(room);
        if take < chunk.len() {
            warn!(
                "Response exceeds {} byte buffer, dropping {} bytes",
                self.capacity(),
                chunk.len() - take
            );
            self.overflowed = true;
        }

        self.storage[self.cursor..self.cursor + take].copy_from_slice(&chunk[..take]);
        self.cursor += take;
        self.len = self.cursor;
    }

    fn on_finished(&mut self) {
        debug!("HTTP exchange finished, {} bytes", self.len);
        // contents stay readable; a chunk without a fresh connect starts over
        self.cursor = 0;
    }
}
