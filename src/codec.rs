//! Glue between the incremental [`Reader`] and `tokio_util`'s framing traits.
//!
//! `RespCodec` is a [`Decoder`] only — generating RESP output is out of
//! scope here, and the demo front-end (`main.rs`)
//! forwards a ready message's captured wire-byte spans verbatim rather than
//! re-serializing the decoded value, so no `Encoder` is needed here.
//!
//! `tokio_util`'s `FramedRead` hands `decode` the whole of whatever has
//! accumulated in its internal `BytesMut` since the last successful decode.
//! Each call first drains any message still sitting in the `Reader`'s
//! current buffer (pipelined messages need no new bytes at all), and only
//! then claims the newly accumulated `src` as the next buffer to feed.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::RespError;
use crate::reader::{ParseOutcome, Reader};
use crate::value::RedisData;

/// A decoded top-level message together with the zero-copy spans that make
/// up its on-the-wire bytes.
pub type Frame = (Box<RedisData>, Vec<Bytes>);

#[derive(Debug, Default)]
pub struct RespCodec {
    reader: Reader,
}

impl RespCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RespCodec {
    type Item = Frame;
    type Error = RespError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let ParseOutcome::Ready = self.reader.parse()? {
            return Ok(self.reader.take());
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.reader.feed(src.split().freeze());
        match self.reader.parse()? {
            ParseOutcome::Ready => Ok(self.reader.take()),
            ParseOutcome::Incomplete => Ok(None),
        }
    }
}
