//! The bounded, non-recursive stack of in-progress array frames.
//!
//! Decoding a nested RESP array recursively in the natural way would recurse
//! once per nesting level on the Rust call stack, with no tail-call
//! guarantee. Instead every level of nesting gets its own [`ParseTask`]
//! frame on an explicit, bounded [`TaskStack`] `Vec`, and what would be
//! recursive calls become loop iterations driven by
//! [`TaskStack::complete_top_frame`].
//!
//! Frame 0 is a permanent sentinel representing the message itself: it is
//! never popped, only ever has its `data` field filled in (directly, for a
//! bare top-level scalar) or fed a finished value from the frame above it
//! (for a top-level array). Every other frame is always an array frame —
//! scalar children of an array are built in-place in the array's own frame
//! via `current_child`, never pushed as frames of their own, since only
//! arrays can contain further values.

use crate::config::MAX_TASK_STACK_DEPTH;
use crate::error::RespError;
use crate::value::{Context, RedisData, RedisDataKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskKind {
    Unknown,
    Array,
}

/// One level of the stack: either the permanent bottom sentinel, or one
/// array's worth of bookkeeping for its in-progress children.
#[derive(Debug)]
pub(crate) struct ParseTask {
    pub kind: TaskKind,
    pub data: Option<Box<RedisData>>,
    pub current_child: Option<Box<RedisData>>,
    pub declared_elements: i64,
}

impl ParseTask {
    fn fresh() -> Self {
        Self {
            kind: TaskKind::Unknown,
            data: None,
            current_child: None,
            declared_elements: -1,
        }
    }
}

/// Outcome of attaching a just-completed value to its enclosing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PopOutcome {
    /// The outermost frame now holds the fully decoded message.
    MessageComplete,
    /// The enclosing array still has more children to read.
    ContinueSiblings,
}

#[derive(Debug)]
pub(crate) struct TaskStack {
    frames: Vec<ParseTask>,
}

impl TaskStack {
    pub fn new() -> Self {
        Self {
            frames: vec![ParseTask::fresh()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> &ParseTask {
        self.frames.last().expect("stack is never empty")
    }

    pub fn top_mut(&mut self) -> &mut ParseTask {
        self.frames.last_mut().expect("stack is never empty")
    }

    /// Enter a nested array: push a fresh frame for it. Fails if this would
    /// exceed the bounded depth (outer message plus 8 nested levels).
    pub fn push(&mut self) -> Result<(), RespError> {
        if self.frames.len() >= MAX_TASK_STACK_DEPTH {
            return Err(RespError::NestingTooDeep);
        }
        self.frames.push(ParseTask::fresh());
        Ok(())
    }

    /// Begin a nested array: push a frame for it, allocate its (empty)
    /// `Array` value up front, and mark the frame's kind so later scalar
    /// children know to land in `current_child` rather than `data`.
    pub fn begin_array(&mut self, ctx: &mut Context) -> Result<(), RespError> {
        self.push()?;
        let top = self.top_mut();
        top.kind = TaskKind::Array;
        top.data = Some(ctx.alloc(RedisDataKind::Array(Vec::new())));
        Ok(())
    }

    /// Record the array header's declared element count on the current top
    /// frame and reserve room for that many children.
    pub fn set_declared_elements(&mut self, declared: i64) {
        let top = self.top_mut();
        top.declared_elements = declared;
        if declared > 0 {
            if let Some(data) = top.data.as_mut() {
                if let RedisDataKind::Array(children) = &mut data.kind {
                    children.reserve(declared as usize);
                }
            }
        }
    }

    /// Begin a scalar value (bulk string, integer, simple string or error):
    /// allocate it and place it wherever the current top frame expects its
    /// next value — `data` if the frame is the bare sentinel, `current_child`
    /// if it's an array still collecting children.
    pub fn begin_scalar(&mut self, ctx: &mut Context, kind: RedisDataKind) {
        let top = self.top_mut();
        match top.kind {
            TaskKind::Unknown => top.data = Some(ctx.alloc(kind)),
            TaskKind::Array => top.current_child = Some(ctx.alloc(kind)),
        }
    }

    /// The scalar currently under construction in the top frame, wherever
    /// `begin_scalar` placed it.
    pub fn active_scalar_mut(&mut self) -> &mut RedisData {
        let top = self.top_mut();
        match top.kind {
            TaskKind::Unknown => top.data.as_mut().expect("begin_scalar was called first"),
            TaskKind::Array => top
                .current_child
                .as_mut()
                .expect("begin_scalar was called first"),
        }
    }

    /// The scalar built by `begin_scalar` has just read its terminating
    /// `\n`: either it *is* the whole message (bare top-level scalar), or it
    /// is one child of the enclosing array, possibly the last one.
    pub fn complete_current_scalar(&mut self) -> PopOutcome {
        match self.top().kind {
            TaskKind::Unknown => self.complete_top_frame(),
            TaskKind::Array => {
                let child = self
                    .top_mut()
                    .current_child
                    .take()
                    .expect("begin_scalar was called first");
                self.complete_array_child(child)
            }
        }
    }

    /// Reset the stack to a single fresh sentinel frame, releasing whatever
    /// partially built tree the in-progress frames held. Used when a reader
    /// is torn down mid-message.
    pub fn clear(&mut self, ctx: &mut Context) {
        for mut frame in self.frames.drain(..) {
            if let Some(data) = frame.data.take() {
                ctx.release(data);
            }
            if let Some(child) = frame.current_child.take() {
                ctx.release(child);
            }
        }
        self.frames.push(ParseTask::fresh());
    }

    /// A scalar child just finished inside the current (array) top frame.
    /// Attaches it as the array's next element and, if that was the array's
    /// last declared element, cascades completion upward.
    pub fn complete_array_child(&mut self, child: Box<RedisData>) -> PopOutcome {
        self.attach_to_top(child)
    }

    /// The current top frame is itself fully built — either a nested array
    /// that just read its last child, or an array whose header declared
    /// zero or fewer elements and so has no children to wait for. Removes
    /// it (unless it is the permanent bottom sentinel) and attaches its
    /// value to whatever is now on top, cascading as needed.
    pub fn complete_top_frame(&mut self) -> PopOutcome {
        if self.frames.len() == 1 {
            return PopOutcome::MessageComplete;
        }
        let finished = self.frames.pop().expect("len checked above");
        let value = finished
            .data
            .expect("a completed array frame always holds its value");
        self.attach_to_top(value)
    }

    fn attach_to_top(&mut self, value: Box<RedisData>) -> PopOutcome {
        let top = self.frames.last_mut().expect("stack is never empty");
        match top.kind {
            TaskKind::Unknown => {
                top.data = Some(value);
                PopOutcome::MessageComplete
            }
            TaskKind::Array => {
                let declared = top.declared_elements;
                let len = {
                    let array = top
                        .data
                        .as_mut()
                        .expect("array frame always allocates its value up front");
                    match &mut array.kind {
                        RedisDataKind::Array(children) => {
                            children.push(value);
                            children.len()
                        }
                        _ => unreachable!("array-kind frame must hold RedisDataKind::Array"),
                    }
                };
                if len as i64 >= declared {
                    self.complete_top_frame()
                } else {
                    PopOutcome::ContinueSiblings
                }
            }
        }
    }

    /// Take the finished value out of the (always-present) bottom sentinel
    /// frame, leaving it empty and ready for the next message.
    pub fn take_message(&mut self) -> Option<Box<RedisData>> {
        self.frames[0].data.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_max_depth() {
        let mut stack = TaskStack::new();
        for _ in 0..MAX_TASK_STACK_DEPTH - 1 {
            stack.push().unwrap();
        }
        assert_eq!(stack.push(), Err(RespError::NestingTooDeep));
    }

    #[test]
    fn scalar_message_completes_the_bottom_frame_directly() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.top_mut().data = Some(ctx.alloc(RedisDataKind::Integer(42)));
        let outcome = stack.complete_top_frame();
        assert_eq!(outcome, PopOutcome::MessageComplete);
        let msg = stack.take_message().unwrap();
        assert_eq!(msg.kind, RedisDataKind::Integer(42));
    }

    #[test]
    fn array_child_completion_cascades_when_last_element() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.push().unwrap();
        {
            let top = stack.top_mut();
            top.kind = TaskKind::Array;
            top.declared_elements = 1;
            top.data = Some(ctx.alloc(RedisDataKind::Array(Vec::new())));
        }
        let child = ctx.alloc(RedisDataKind::Integer(1));
        let outcome = stack.complete_array_child(child);
        assert_eq!(outcome, PopOutcome::MessageComplete);
        assert_eq!(stack.depth(), 1);
        let msg = stack.take_message().unwrap();
        match msg.kind {
            RedisDataKind::Array(children) => assert_eq!(children.len(), 1),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn array_child_completion_continues_for_more_siblings() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.push().unwrap();
        {
            let top = stack.top_mut();
            top.kind = TaskKind::Array;
            top.declared_elements = 2;
            top.data = Some(ctx.alloc(RedisDataKind::Array(Vec::new())));
        }
        let child = ctx.alloc(RedisDataKind::Integer(1));
        let outcome = stack.complete_array_child(child);
        assert_eq!(outcome, PopOutcome::ContinueSiblings);
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn empty_array_header_completes_immediately() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.push().unwrap();
        {
            let top = stack.top_mut();
            top.kind = TaskKind::Array;
            top.declared_elements = 0;
            top.data = Some(ctx.alloc(RedisDataKind::Array(Vec::new())));
        }
        assert_eq!(stack.complete_top_frame(), PopOutcome::MessageComplete);
        let msg = stack.take_message().unwrap();
        match msg.kind {
            RedisDataKind::Array(children) => assert!(children.is_empty()),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn begin_scalar_lands_on_the_sentinel_for_a_bare_top_level_value() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.begin_scalar(&mut ctx, RedisDataKind::Integer(0));
        assert_eq!(stack.active_scalar_mut().kind, RedisDataKind::Integer(0));
        let outcome = stack.complete_current_scalar();
        assert_eq!(outcome, PopOutcome::MessageComplete);
        assert_eq!(
            stack.take_message().unwrap().kind,
            RedisDataKind::Integer(0)
        );
    }

    #[test]
    fn begin_array_then_begin_scalar_builds_a_nested_child() {
        let mut ctx = Context::new();
        let mut stack = TaskStack::new();
        stack.begin_array(&mut ctx).unwrap();
        stack.set_declared_elements(1);
        stack.begin_scalar(&mut ctx, RedisDataKind::Integer(7));
        let outcome = stack.complete_current_scalar();
        assert_eq!(outcome, PopOutcome::MessageComplete);
        match stack.take_message().unwrap().kind {
            RedisDataKind::Array(children) => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].kind, RedisDataKind::Integer(7));
            }
            _ => panic!("expected array"),
        }
    }
}
