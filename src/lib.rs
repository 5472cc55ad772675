//! An incremental, restartable parser for the RESP (Redis Serialization
//! Protocol) wire format.
//!
//! The crate's public surface is small and deliberately shaped around one
//! data flow: feed it whatever bytes a socket read produced, via
//! [`Reader::feed`], then drive it with [`Reader::parse`] until it reports
//! [`reader::ParseOutcome::Ready`], at which point [`Reader::take`] hands
//! back the fully decoded [`value::RedisData`] tree and the exact span of
//! wire bytes it came from. None of that requires the whole message to have
//! arrived in one buffer, and none of it copies payload bytes — see the
//! module docs on [`reader`] and [`position`] for how.
//!
//! [`codec::RespCodec`] adapts the same state machine to `tokio_util`'s
//! [`Decoder`](tokio_util::codec::Decoder) trait for use with `Framed`/
//! `FramedRead`, which is what the `respincr-proxy` binary target uses.

pub mod codec;
pub mod config;
pub mod error;
pub mod position;
pub mod reader;
mod task;
pub mod value;

mod buffer;

pub use error::RespError;
pub use reader::{ParseOutcome, Reader};
pub use value::{Context, RedisData, RedisDataKind};
