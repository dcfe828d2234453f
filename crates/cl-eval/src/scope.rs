//! The lexical environment threaded through evaluation: a persistent chain
//! of lookup frames (spec §4.3), path-depth tracking, and call
//! cancellation/depth limits.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cl_value::Value;

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::struct_::Struct;

const MAX_CALL_DEPTH: usize = 100;
const MAX_PATH_LEN: usize = 500;

/// Shared, thread-safe call state: cancellation and recursion depth. Kept
/// in its own `Arc` (rather than folded into the `Rc`-based scope chain)
/// because cancellation must be triggerable from another thread while
/// evaluation itself runs on one.
pub struct CallContext {
    cancelled: AtomicBool,
    depth: AtomicUsize,
}

impl CallContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
            depth: AtomicUsize::new(0),
        })
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn check(&self) -> EvalResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(EvalError::new(EvalErrorKind::ContextCancelled, None))
        } else {
            Ok(())
        }
    }

    pub fn enter_call(&self) -> EvalResult<()> {
        let prev = self.depth.fetch_add(1, Ordering::SeqCst);
        if prev >= MAX_CALL_DEPTH {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(EvalError::new(EvalErrorKind::CallDepthExceeded, None));
        }
        Ok(())
    }

    pub fn exit_call(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Where a `Scope` frame's bindings come from. Spec §4.3 names four
/// lookup sources; `Names` and `Struct` collapse what the spec treats as
/// "schema contract lookup" into `Struct`'s own field resolution, since
/// both resolve an identifier against an object's fields the same way.
/// The `$` root-document binding (spec §4.6's `AssignRoot`) isn't a
/// separate source: `Struct::scope_lookup` resolves it to the struct's
/// own value through the same self-reference frame sibling fields use.
pub enum ScopeLookup {
    /// A fixed set of named bindings: the root scope's built-in type
    /// names, or a function call's argument bindings.
    Names(Vec<(String, Value)>),
    /// A struct's own fields, resolved lazily and possibly self-referentially.
    Struct(Arc<Struct>),
    /// A single `for`-comprehension binding (key and/or value).
    Value(Vec<(String, Value)>),
}

impl ScopeLookup {
    fn get(&self, scope: &Scope, key: &str) -> EvalResult<Option<Value>> {
        match self {
            ScopeLookup::Names(entries) | ScopeLookup::Value(entries) => {
                Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
            }
            ScopeLookup::Struct(s) => s.scope_lookup(scope, key),
        }
    }
}

struct RootFrame {
    call_ctx: Arc<CallContext>,
    lookup: ScopeLookup,
}

struct NestedFrame {
    parent: Scope,
    lookup: ScopeLookup,
    path_len: usize,
}

/// A persistent, cheaply-cloned chain of lookup frames. `Rc`-based since
/// evaluation is single-threaded; see [`CallContext`] for the one piece of
/// state that does cross threads.
#[derive(Clone)]
pub enum Scope {
    Root(Rc<RootFrame>),
    Nested(Rc<NestedFrame>),
}

impl Scope {
    pub fn root(call_ctx: Arc<CallContext>, builtins: Vec<(String, Value)>) -> Self {
        Scope::Root(Rc::new(RootFrame {
            call_ctx,
            lookup: ScopeLookup::Names(builtins),
        }))
    }

    pub fn call_ctx(&self) -> &Arc<CallContext> {
        match self {
            Scope::Root(r) => &r.call_ctx,
            Scope::Nested(n) => n.parent.call_ctx(),
        }
    }

    fn path_len(&self) -> usize {
        match self {
            Scope::Root(_) => 0,
            Scope::Nested(n) => n.path_len,
        }
    }

    /// Push a new lookup frame, inheriting this scope's tracked path length.
    pub fn push(&self, lookup: ScopeLookup) -> Self {
        Scope::Nested(Rc::new(NestedFrame {
            parent: self.clone(),
            lookup,
            path_len: self.path_len(),
        }))
    }

    /// Extend the tracked path by one segment, erroring past the 500-char
    /// fuse (spec §4.3).
    pub fn push_path(&self, segment: &str) -> EvalResult<Self> {
        let new_len = self.path_len() + segment.len() + 1;
        if new_len > MAX_PATH_LEN {
            return Err(EvalError::new(EvalErrorKind::PathTooDeep, None));
        }
        Ok(Scope::Nested(Rc::new(NestedFrame {
            parent: self.clone(),
            lookup: ScopeLookup::Names(Vec::new()),
            path_len: new_len,
        })))
    }

    /// Resolve an identifier by walking outward from this frame.
    pub fn get(&self, key: &str) -> EvalResult<Option<Value>> {
        match self {
            Scope::Root(root) => root.lookup.get(self, key),
            Scope::Nested(frame) => {
                if let Some(v) = frame.lookup.get(self, key)? {
                    return Ok(Some(v));
                }
                frame.parent.get(key)
            }
        }
    }

    pub fn check_cancelled(&self) -> EvalResult<()> {
        self.call_ctx().check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lookup_falls_back_to_parent() {
        let root = Scope::root(CallContext::new(), vec![("string".into(), Value::string("kind"))]);
        let nested = root.push(ScopeLookup::Names(vec![("x".into(), Value::Bool(true))]));
        assert_eq!(nested.get("x").unwrap(), Some(Value::Bool(true)));
        assert_eq!(nested.get("string").unwrap(), Some(Value::string("kind")));
        assert_eq!(nested.get("missing").unwrap(), None);
    }

    #[test]
    fn path_fuse_trips_past_500_chars() {
        let root = Scope::root(CallContext::new(), Vec::new());
        let mut scope = root;
        let long_segment = "x".repeat(100);
        for _ in 0..4 {
            scope = scope.push_path(&long_segment).unwrap();
        }
        assert!(scope.push_path(&long_segment).is_err());
    }

    #[test]
    fn call_context_enforces_depth_limit() {
        let ctx = CallContext::new();
        for _ in 0..MAX_CALL_DEPTH {
            ctx.enter_call().unwrap();
        }
        assert!(ctx.enter_call().is_err());
    }
}
