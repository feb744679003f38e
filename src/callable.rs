//! Callables (spec.md §4.F): the tagged sum of argument-evaluation policies
//! a call site can dispatch to. `Function` and `SpecialForm` wrap host Rust
//! closures; `Closure`, `Macro`, and `Module` are pure JSPR data built by the
//! kernel forms `lambda`, `macro`, and whatever constructs a module value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::environment::Environment;
use crate::error::{JsprError, JsprResult};
use crate::value::{Arguments, Value};

/// A host-provided implementation backing `Function`/`SpecialForm`. Both
/// kinds share this signature; what differs is whether the dispatcher
/// (`crate::eval::calling`) evaluates `args` before the call.
///
/// The `Environment` passed through is the frame the call executed in — for
/// `Function` this is the child frame its own arguments were evaluated in,
/// for `SpecialForm` it's the caller's frame verbatim. Most native
/// functions ignore it; a few (`apply`, `eval`) need it to invoke or inspect
/// a first-class `Environment` value.
pub type NativeFn = Rc<dyn Fn(&Arguments, &Environment) -> JsprResult<Value>>;

/// The ingredients shared by `Closure` and `Macro`: a parameter name list, a
/// body expression, and the captured environment snapshot (spec.md §3
/// "Closures capture the environment by snapshot-clone").
pub struct ClosureInner {
    pub params: Vec<String>,
    pub body: Value,
    pub env: Environment,
    /// Filled in by `let`/`be` when binding an anonymously-built closure to
    /// a name, so recursive self-reference and debug output have something
    /// to show (spec.md §4.H `let`/`be`: "if the value is a closure with
    /// empty name, records the name on it").
    pub name: RefCell<String>,
}

impl fmt::Debug for ClosureInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<closure {:?} {:?}>", self.name.borrow(), self.params)
    }
}

/// `(name, entries)` — a fixed string-keyed namespace. Attribute lookup
/// returns the entry or fails `mod-name-error` (spec.md §4.F).
#[derive(Debug)]
pub struct ModuleInner {
    pub name: String,
    pub entries: IndexMap<String, Value>,
}

impl ModuleInner {
    pub fn get_attr(&self, key: &str) -> JsprResult<Value> {
        self.entries.get(key).cloned().ok_or_else(|| {
            JsprError::kind(
                "mod-name-error",
                [Value::string(self.name.clone()), Value::string(key)],
            )
        })
    }
}

#[derive(Clone)]
pub enum Callable {
    Function(NativeFn),
    SpecialForm(NativeFn),
    Closure(Rc<ClosureInner>),
    Macro(Rc<ClosureInner>),
    Module(Rc<ModuleInner>),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(_) => write!(f, "<function>"),
            Callable::SpecialForm(_) => write!(f, "<special-form>"),
            Callable::Closure(c) => write!(f, "{c:?}"),
            Callable::Macro(c) => write!(f, "<macro {:?}>", c.name.borrow()),
            Callable::Module(m) => write!(f, "<module {:?}>", m.name),
        }
    }
}

impl Callable {
    pub fn native_function(f: impl Fn(&Arguments, &Environment) -> JsprResult<Value> + 'static) -> Callable {
        Callable::Function(Rc::new(f))
    }

    pub fn native_special_form(
        f: impl Fn(&Arguments, &Environment) -> JsprResult<Value> + 'static,
    ) -> Callable {
        Callable::SpecialForm(Rc::new(f))
    }

    /// Reference-identity comparison backing `Value::PartialEq`; two
    /// distinct closures with identical bodies are not equal.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::SpecialForm(a), Callable::SpecialForm(b)) => Rc::ptr_eq(a, b),
            (Callable::Closure(a), Callable::Closure(b)) => Rc::ptr_eq(a, b),
            (Callable::Macro(a), Callable::Macro(b)) => Rc::ptr_eq(a, b),
            (Callable::Module(a), Callable::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, Callable::Module(_))
    }

    /// Dispatch a call (spec.md §4.E/§4.F). `eval_fn` is the reducer's
    /// `eval` entry point, threaded in rather than imported directly to
    /// avoid a hard module cycle between `callable` and `eval`.
    pub fn invoke(
        &self,
        args: Arguments,
        caller_env: &Environment,
        eval_fn: &dyn Fn(&Value, &Environment) -> JsprResult<Value>,
    ) -> JsprResult<Value> {
        match self {
            Callable::Function(f) => {
                let child = caller_env.new_child();
                let evaluated = eval_args(&args, &child, eval_fn)?;
                // The native body runs against the caller's own frame, not
                // the scratch frame used to evaluate its arguments — `let`
                // needs to bind into the frame the caller will keep using.
                f(&evaluated, caller_env)
            }
            Callable::SpecialForm(f) => f(&args, caller_env),
            Callable::Closure(closure) => {
                let child = caller_env.new_child();
                let evaluated = eval_args(&args, &child, eval_fn)?;
                let bound = bind_params(closure, &evaluated)?;
                let inner = run_env(closure);
                inner.define("__recurse__", Value::Callable(Callable::Closure(closure.clone())));
                for (name, value) in closure.params.iter().zip(bound) {
                    inner.define(name.clone(), value);
                }
                eval_fn(&closure.body, &inner)
            }
            Callable::Macro(closure) => {
                // Raw arguments: no eval_args step (spec.md §4.E "Macro:
                // receives raw arguments").
                let bound = bind_params(closure, &args)?;
                let inner = run_env(closure);
                inner.define("__recurse__", Value::Callable(Callable::Macro(closure.clone())));
                for (name, value) in closure.params.iter().zip(bound) {
                    inner.define(name.clone(), value);
                }
                let new_code = eval_fn(&closure.body, &inner)?;
                eval_fn(&new_code, caller_env)
            }
            Callable::Module(module) => match args {
                Arguments::Keyword(kw) if kw.len() == 1 => module.get_attr(kw.first_key()),
                _ => Err(JsprError::kind(
                    "not-callable",
                    [Value::string(module.name.clone())],
                )),
            },
        }
    }
}

fn run_env(closure: &Rc<ClosureInner>) -> Environment {
    closure.env.new_child()
}

/// Evaluate each argument expression in `env`, preserving the positional vs.
/// keyword shape.
fn eval_args(
    args: &Arguments,
    env: &Environment,
    eval_fn: &dyn Fn(&Value, &Environment) -> JsprResult<Value>,
) -> JsprResult<Arguments> {
    match args {
        Arguments::Positional(items) => {
            let evaluated = items
                .iter()
                .map(|item| eval_fn(item, env))
                .collect::<JsprResult<Vec<_>>>()?;
            Ok(Arguments::Positional(evaluated))
        }
        Arguments::Keyword(kw) => {
            let evaluated = kw
                .iter()
                .map(|(k, v)| Ok((k.clone(), eval_fn(v, env)?)))
                .collect::<JsprResult<Vec<_>>>()?;
            Ok(Arguments::Keyword(crate::value::KeywordSequence::new(evaluated)))
        }
    }
}

/// `unpack-kwlist` against `closure.params` (spec.md §4.F): a `Keyword`
/// call's first pair feeds the first parameter regardless of its key name,
/// remaining parameters are looked up by name among the rest; a positional
/// call must match arity exactly.
fn bind_params(closure: &Rc<ClosureInner>, args: &Arguments) -> JsprResult<Vec<Value>> {
    match args {
        Arguments::Positional(items) => {
            if items.len() != closure.params.len() {
                return Err(JsprError::kind(
                    "invalid-args",
                    [
                        Value::string(closure.name.borrow().clone()),
                        Value::Int(closure.params.len() as i64),
                        Value::Int(items.len() as i64),
                    ],
                ));
            }
            Ok(items.clone())
        }
        Arguments::Keyword(kw) => {
            if closure.params.is_empty() {
                return Ok(Vec::new());
            }
            let mut bound = Vec::with_capacity(closure.params.len());
            bound.push(kw.first_arg().clone());
            for key in &closure.params[1..] {
                let value = kw.try_get(key).ok_or_else(|| {
                    JsprError::kind(
                        "invalid-args",
                        [Value::string(closure.name.borrow().clone()), Value::string(key.clone())],
                    )
                })?;
                bound.push(value.clone());
            }
            Ok(bound)
        }
    }
}
