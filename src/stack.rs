//! Stack growth for the recursive walks.
//!
//! Parser, resolver, interpreter, printer and the syntax tree's destructor
//! all recurse once per nesting level of the program. Each of them routes
//! its recursion through [`ensure_sufficient_stack`], so a deeply nested but
//! valid program grows the stack instead of aborting the process. Unbounded
//! recursion in a Lox program is still cut off by the interpreter's call
//! depth limit.

/// If less than this much stack remains, grow before recursing.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
