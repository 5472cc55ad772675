//! Tunable limits for the reader.
//!
//! These are compile-time constants rather than a runtime-loaded config
//! object: the only two knobs the reader actually has are fixed
//! architectural bounds, not deployment-time tuning.

/// Outer message frame plus up to this many levels of nested arrays.
/// Index 0 is the outer message, indices 1..=8 are nested array levels.
pub const MAX_TASK_STACK_DEPTH: usize = 9;

/// Initial capacity reserved for a [`crate::position::PositionArray`]'s
/// backing vector. `Vec`'s own doubling growth strategy makes this advisory
/// only, not a hard chunk size.
pub const POSITION_ARRAY_CHUNK: usize = 8;
