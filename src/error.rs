//! Failure taxonomy for the RESP reader.
//!
//! The reader's only fallible outcome is a syntactic protocol violation:
//! the core does not validate semantic command correctness, does not cap
//! message size, and assumes allocation never fails (a genuine allocator
//! failure panics, as it would anywhere else in the crate).

use thiserror::Error;

/// Fatal parse failures. Once `Reader::parse` returns one of these, the
/// reader is left in a non-reusable state — RESP has no sync markers, so
/// there is no way to resume cleanly after a framing error.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RespError {
    /// The byte following `*`, `$`, `:`, `+` or `-` at a value boundary was
    /// none of the five recognized type bytes.
    #[error("unknown RESP type byte {0:#04x}")]
    UnknownType(u8),

    /// A byte expected to be an ASCII decimal digit (while accumulating an
    /// array count, bulk string length, or integer value) was not.
    #[error("expected a decimal digit, found {0:#04x}")]
    ExpectedDigit(u8),

    /// A byte expected to be `\n` (terminating a `\r`) was not.
    #[error("expected '\\n' after '\\r', found {0:#04x}")]
    ExpectedLf(u8),

    /// A bulk string declared a length less than -1.
    #[error("invalid bulk string length {0}")]
    BadBulkStringLen(i64),

    /// Array nesting exceeded the bounded task stack depth (8 levels of
    /// nesting beyond the outer message).
    #[error("array nesting exceeds the maximum supported depth")]
    NestingTooDeep,
}
