//! Native stack headroom for the recursive passes.
//!
//! The parser, resolver, evaluator and printer all recurse once per nesting
//! level of the tree. Each wraps its recursive entry point in
//! [`ensure_sufficient_stack`], which moves onto a freshly allocated segment
//! whenever less than [`RED_ZONE`] bytes remain, so nesting depth is limited by
//! memory and by `MAX_CALL_DEPTH`, never by the size of the thread's stack.

/// Stack kept free before recursing; below it the stack is grown.
pub const RED_ZONE: usize = 128 * 1024;

/// Stack allocated per growth step.
pub const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
