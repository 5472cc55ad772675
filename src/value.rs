//! The decoded RESP value tree and its free-list.
//!
//! A [`RedisData`] node carries an intrusive `next` link so that, once
//! released, it can sit on a [`Context`]'s singly linked free-list and be
//! handed back out by a later allocation without touching the system
//! allocator. This is the steady-state, allocation-free path the core is
//! built around: on a long-lived connection the same handful of nodes
//! circulate between "decoded and handed to the caller" and "released back
//! to the pool" for the lifetime of the socket.

use crate::position::{self, PositionArray};

/// One decoded RESP value. Array children are boxed so that a released
/// subtree can be threaded directly onto the free-list without reboxing.
#[derive(Debug)]
pub struct RedisData {
    next: Option<Box<RedisData>>,
    pub kind: RedisDataKind,
}

/// The tagged variant described in the data model: a RESP value is exactly
/// one of these five shapes, plus `Unknown` for a task-local placeholder
/// before its type byte has been read.
#[derive(Debug)]
pub enum RedisDataKind {
    Unknown,
    Array(Vec<Box<RedisData>>),
    BulkString { spans: PositionArray, is_null: bool },
    Integer(i64),
    SimpleString(PositionArray),
    Error(PositionArray),
}

impl RedisData {
    fn reset(&mut self, kind: RedisDataKind) {
        self.kind = kind;
    }
}

impl PartialEq for RedisData {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq for RedisDataKind {
    fn eq(&self, other: &Self) -> bool {
        use RedisDataKind::*;
        match (self, other) {
            (Unknown, Unknown) => true,
            (Array(a), Array(b)) => a == b,
            (
                BulkString {
                    spans: sa,
                    is_null: na,
                },
                BulkString {
                    spans: sb,
                    is_null: nb,
                },
            ) => na == nb && (*na || sa == sb),
            (Integer(a), Integer(b)) => a == b,
            (SimpleString(a), SimpleString(b)) => a == b,
            (Error(a), Error(b)) => a == b,
            _ => false,
        }
    }
}

/// Owner of the decoded-value free-list: a singly linked list of recycled
/// nodes plus a count, with insert-head/remove-head operations. A `Reader`
/// owns one `Context` for its whole lifetime.
#[derive(Debug, Default)]
pub struct Context {
    free_head: Option<Box<RedisData>>,
    free_len: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recycled nodes currently sitting on the free-list.
    pub fn free_len(&self) -> usize {
        self.free_len
    }

    /// Pop a node off the free-list and reset it to `kind`, or allocate a
    /// fresh one if the list is empty.
    pub fn alloc(&mut self, kind: RedisDataKind) -> Box<RedisData> {
        match self.free_head.take() {
            Some(mut node) => {
                self.free_head = node.next.take();
                self.free_len -= 1;
                node.reset(kind);
                node
            }
            None => Box::new(RedisData { next: None, kind }),
        }
    }

    /// Recursively release `value` and everything beneath it back onto the
    /// free-list. Position arrays are dropped outright rather than pooled
    /// (see `position::reset`'s doc comment for why).
    pub fn release(&mut self, mut value: Box<RedisData>) {
        match std::mem::replace(&mut value.kind, RedisDataKind::Unknown) {
            RedisDataKind::Array(children) => {
                for child in children {
                    self.release(child);
                }
            }
            RedisDataKind::BulkString { mut spans, .. } => position::reset(&mut spans),
            RedisDataKind::SimpleString(mut spans) | RedisDataKind::Error(mut spans) => {
                position::reset(&mut spans)
            }
            RedisDataKind::Unknown | RedisDataKind::Integer(_) => {}
        }
        value.next = self.free_head.take();
        self.free_len += 1;
        self.free_head = Some(value);
    }
}
