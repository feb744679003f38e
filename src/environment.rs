//! Lexically-scoped environments (spec.md §4.B). An `Environment` is a
//! first-class, reference-counted name table with a parent link; `define`
//! writes into the current frame only, `lookup` walks up the parent chain,
//! and `clone` takes the snapshot copy that backs closure capture.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::JsprError;
use crate::value::Value;

struct Frame {
    names: IndexMap<String, Value>,
    parent: Option<Environment>,
}

/// A lexical scope. Cheap to clone (reference-counted); two `Environment`
/// handles obtained by cloning the same `Environment` value alias the same
/// frame, while [`Environment::clone_frame`] produces a genuinely distinct
/// frame (the "snapshot-clone" spec.md requires for closures).
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// A fresh environment with no parent — used for the root context.
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            names: IndexMap::new(),
            parent: None,
        })))
    }

    /// Bind `name` in the current frame, overwriting any existing binding
    /// *in this frame*. Never affects parent frames.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().names.insert(name.into(), value);
    }

    /// Search the current frame, then parents. `None` is the Undefined
    /// sentinel from spec.md §4.B.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        if let Some(v) = frame.names.get(name) {
            return Some(v.clone());
        }
        match &frame.parent {
            Some(parent) => parent.lookup(name),
            None => None,
        }
    }

    /// `lookup`, raising `env-name-error` on failure.
    pub fn require(&self, name: &str) -> Result<Value, JsprError> {
        self.lookup(name)
            .ok_or_else(|| JsprError::kind("env-name-error", [Value::string(name)]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// A new, empty frame parented to `self`. Ephemeral: typically discarded
    /// when the sub-expression it was created for returns.
    pub fn new_child(&self) -> Environment {
        Environment(Rc::new(RefCell::new(Frame {
            names: IndexMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// A frame whose parent is *this frame's* parent and whose table is a
    /// shallow copy of this frame's table — the snapshot a [`Closure`]
    /// captures (spec.md §3 "Closures capture the environment by
    /// snapshot-clone").
    ///
    /// [`Closure`]: crate::callable::ClosureInner
    pub fn clone_frame(&self) -> Environment {
        let frame = self.0.borrow();
        Environment(Rc::new(RefCell::new(Frame {
            names: frame.names.clone(),
            parent: frame.parent.clone(),
        })))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Attribute-lookup on an environment value: a single dotted-path
    /// segment is just a name lookup (spec.md §4.A).
    pub fn get_attr(&self, key: &str) -> Result<Value, JsprError> {
        self.require(key)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let env = Environment::new();
        env.define("x", Value::Int(1));
        assert_eq!(env.lookup("x"), Some(Value::Int(1)));
        assert_eq!(env.lookup("y"), None);
    }

    #[test]
    fn child_sees_parent_but_not_vice_versa() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));
        let child = parent.new_child();
        assert_eq!(child.lookup("x"), Some(Value::Int(1)));
        child.define("y", Value::Int(2));
        assert_eq!(parent.lookup("y"), None);
    }

    #[test]
    fn define_in_child_does_not_rebind_parent() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));
        let child = parent.new_child();
        child.define("x", Value::Int(99));
        assert_eq!(parent.lookup("x"), Some(Value::Int(1)));
        assert_eq!(child.lookup("x"), Some(Value::Int(99)));
    }

    #[test]
    fn clone_frame_shares_parent_but_not_table() {
        let parent = Environment::new();
        parent.define("shared", Value::Int(1));
        let env = parent.new_child();
        env.define("a", Value::Int(10));
        let snapshot = env.clone_frame();

        // Mutating the original frame after the snapshot must not affect it.
        env.define("a", Value::Int(20));
        env.define("b", Value::Int(30));

        assert_eq!(snapshot.lookup("a"), Some(Value::Int(10)));
        assert_eq!(snapshot.lookup("b"), None);
        // Parent chain is shared, so changes to the parent are still visible.
        parent.define("shared", Value::Int(2));
        assert_eq!(snapshot.lookup("shared"), Some(Value::Int(2)));
    }
}
