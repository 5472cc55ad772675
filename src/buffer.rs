//! A single fed chunk of wire bytes, plus a cursor into it.
//!
//! `Bytes` is already the refcounted buffer the rest of the crate slices
//! spans out of — cloning one bumps its reference count. What `InputBuffer`
//! adds on top is just the read cursor `feed()` advances.

use bytes::Bytes;

#[derive(Debug, Clone)]
pub(crate) struct InputBuffer {
    pub bytes: Bytes,
    pub pos: usize,
}

impl InputBuffer {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Rewind the cursor by one byte so it can be read again. Used when a
    /// sub-machine's terminating `\n` also needs to satisfy the outer
    /// message-end check.
    pub fn rewind_one(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }
}
