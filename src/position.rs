//! Zero-copy string spans.
//!
//! A [`PositionArray`] is how this crate avoids ever copying a RESP
//! payload: rather than assembling a contiguous `Vec<u8>` as bytes arrive,
//! it records `Bytes` slices directly into whichever input buffer held
//! them. Each slice shares the same underlying allocation as the buffer it
//! came from (a cheap `Arc` clone via [`bytes::Bytes::slice`]), so a single
//! logical string may be represented by several slices when its bytes
//! arrived across more than one `feed()` call.

use bytes::Bytes;

use crate::config::POSITION_ARRAY_CHUNK;

/// An ordered sequence of zero-copy spans representing one logical byte
/// string that may be scattered across several input buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionArray {
    spans: Vec<Bytes>,
    str_len: usize,
}

impl PositionArray {
    /// An empty position array with no backing storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span, growing the backing vector by
    /// [`POSITION_ARRAY_CHUNK`] at a time the first time it's needed.
    pub fn push(&mut self, span: Bytes) {
        if self.spans.is_empty() {
            self.spans.reserve(POSITION_ARRAY_CHUNK);
        }
        self.str_len += span.len();
        self.spans.push(span);
    }

    /// Total length of the logical string across all spans.
    pub fn str_len(&self) -> usize {
        self.str_len
    }

    /// Individual spans, in order.
    pub fn spans(&self) -> &[Bytes] {
        &self.spans
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Copy every span's bytes into one freshly allocated, contiguous
    /// buffer. Only used where an owned, contiguous slice is genuinely
    /// required (e.g. parsing a command name); elsewhere callers iterate
    /// [`Self::spans`] directly to stay zero-copy.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.str_len);
        for span in &self.spans {
            out.extend_from_slice(span);
        }
        out
    }

    /// Byte-exact equality against a contiguous reference, short-circuiting
    /// on length mismatch before touching any span.
    pub fn eq_bytes(&self, data: &[u8]) -> bool {
        if self.str_len != data.len() {
            return false;
        }
        let mut offset = 0;
        for span in &self.spans {
            let end = offset + span.len();
            if &span[..] != &data[offset..end] {
                return false;
            }
            offset = end;
        }
        true
    }

    fn clear(&mut self) {
        self.spans.clear();
        self.str_len = 0;
    }
}

/// Reset a position array to empty, reusing its backing allocation. Used
/// when a [`crate::value::RedisData`] node is checked out of the free-list.
pub(crate) fn reset(arr: &mut PositionArray) {
    arr.clear();
}
