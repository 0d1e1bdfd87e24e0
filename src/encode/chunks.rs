use std::sync::{Arc, Mutex, MutexGuard};

use crate::encode::sink::ChunkCallback;

/// Ordered accumulation of encoded chunks.
///
/// Clones share storage, so the buffer can be handed to a sink callback and read back after the
/// sink stops.
#[derive(Clone, Debug, Default)]
pub struct ChunkBuffer {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ChunkBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` after every chunk received so far. Empty chunks are ignored.
    pub fn append(&self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.lock().push(chunk);
    }

    /// Callback appending into this buffer, for [`RecordingSink::start`](crate::RecordingSink::start).
    pub fn callback(&self) -> ChunkCallback {
        let buffer = self.clone();
        Box::new(move |chunk| buffer.append(chunk))
    }

    /// Number of chunks received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Return `true` when no chunk has been received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sum of all chunk sizes.
    pub fn total_bytes(&self) -> usize {
        self.lock().iter().map(Vec::len).sum()
    }

    /// Concatenate every chunk in delivery order and empty the buffer.
    pub fn take_concat(&self) -> Vec<u8> {
        let chunks = std::mem::take(&mut *self.lock());
        let mut out = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }

    /// Drop everything received so far.
    pub fn discard(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.chunks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
