//! Thread-local resolution stack for runtime cycle detection.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 256;

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
}

/// Marks a token name as resolution-in-progress for the current thread.
///
/// Re-entering a name already on the stack fails immediately with
/// `DiError::Circular` carrying the full path; the marker is removed on drop,
/// including during unwinds from panicking user factories.
struct StackFrame {
    name: &'static str,
}

impl StackFrame {
    fn enter(name: &'static str) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|&n| n == name) {
                let mut path = stack.clone();
                path.push(name);
                return Err(DiError::Circular(path));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(stack.len()));
            }
            stack.push(name);
            Ok(StackFrame { name })
        })
    }
}

impl Drop for StackFrame {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(popped, Some(self.name));
        });
    }
}

/// Runs `f` with `name` marked in-flight on this thread's resolution stack.
pub(crate) fn with_cycle_guard<T, F>(name: &'static str, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _frame = StackFrame::enter(name)?;
    f()
}
