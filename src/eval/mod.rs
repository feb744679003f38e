//! The Reducer (spec.md §4.D): `eval` dispatches on a [`Value`]'s runtime
//! shape — atom, reference string, sequence (a call form), or single-entry
//! mapping (a call or a definition). This is the one recursive entry point
//! every callable kind and kernel form threads back through.

pub mod calling;
pub mod quoting;

use indexmap::IndexMap;
use tracing::trace;

use crate::callable::Callable;
use crate::environment::Environment;
use crate::error::{JsprError, JsprResult};
use crate::key_normalizer;
use crate::value::{Arguments, KeywordSequence, Value};

pub use quoting::{interpolate, quasiquote};

/// Evaluate `expr` in `env`. See spec.md §4.D for the full dispatch table.
pub fn eval(expr: &Value, env: &Environment) -> JsprResult<Value> {
    match expr {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(expr.clone()),
        Value::String(s) => eval_string(s, env),
        Value::Sequence(items) => eval_sequence(items, env),
        Value::Mapping(m) => eval_mapping(m, env),
        // Runtime-only kinds never appear as parsed input; if one flows back
        // through eval (e.g. a quoted environment value), it evaluates to
        // itself.
        Value::Callable(_) | Value::Environment(_) | Value::KeywordSequence(_) => Ok(expr.clone()),
    }
}

fn eval_string(s: &str, env: &Environment) -> JsprResult<Value> {
    if s.starts_with('.') {
        resolve_path(s, env)
    } else {
        Ok(Value::string(interpolate(s, env)?))
    }
}

fn eval_sequence(items: &[Value], env: &Environment) -> JsprResult<Value> {
    let Some(head) = items.first() else {
        return Ok(Value::sequence(Vec::new()));
    };

    if is_single_entry_mapping(head) {
        return eval_keyword_call(items, env);
    }

    let (callee, raw_args) = match head {
        Value::String(name) => (resolve_path(name, env)?, &items[1..]),
        _ => (eval(head, env)?, &items[1..]),
    };
    let callable = require_callable(&callee)?;
    trace!(args = raw_args.len(), "calling positional form");
    callable.invoke(Arguments::Positional(raw_args.to_vec()), env, &eval)
}

/// A sequence whose head (and, by invariant, every element) is a
/// single-entry mapping: keyword-call sugar (spec.md §3/§4.D).
fn eval_keyword_call(items: &[Value], env: &Environment) -> JsprResult<Value> {
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        let Some(m) = item.as_mapping() else {
            return Err(JsprError::kind("invalid-kw-apply", [item.clone()]));
        };
        if m.len() != 1 {
            return Err(JsprError::kind("invalid-kw-apply", [item.clone()]));
        }
        let (k, v) = m.iter().next().expect("len checked above");
        pairs.push(key_normalizer::normalize(k, v.clone())?);
    }
    let kw = KeywordSequence::new(pairs);
    let callee = resolve_path(kw.first_key(), env)?;
    let callable = require_callable(&callee)?;
    trace!(callee = kw.first_key(), "calling keyword form");
    callable.invoke(Arguments::Keyword(kw), env, &eval)
}

fn eval_mapping(m: &IndexMap<String, Value>, env: &Environment) -> JsprResult<Value> {
    if m.len() != 1 {
        return Err(JsprError::kind(
            "invalid-bare-map",
            [Value::Int(m.len() as i64)],
        ));
    }
    let (k, v) = m.iter().next().expect("len checked above");
    let (k, v) = key_normalizer::normalize(k, v.clone())?;

    if let Some(rest) = k.strip_prefix('-') {
        // Auto-sequence: `{-fn: args}` is sugar for `['fn', args...]`,
        // modeled as a single-pair keyword call (spec.md §4.D, glossary
        // "Auto-sequence").
        let kw = KeywordSequence::new(vec![(rest.to_string(), v)]);
        let callee = resolve_path(kw.first_key(), env)?;
        let callable = require_callable(&callee)?;
        return callable.invoke(Arguments::Keyword(kw), env, &eval);
    }
    if let Some(name) = k.strip_suffix('=') {
        let value = eval(&v, env)?;
        env.define(name, value.clone());
        return Ok(value);
    }
    Err(JsprError::kind("invalid-bare-map", [Value::string(k)]))
}

fn is_single_entry_mapping(v: &Value) -> bool {
    matches!(v, Value::Mapping(m) if m.len() == 1)
}

fn require_callable(v: &Value) -> JsprResult<Callable> {
    match v {
        Value::Callable(c) => Ok(c.clone()),
        other => Err(JsprError::kind("invalid-apply", [other.clone()])),
    }
}

/// Resolve a callee or reference name (spec.md §4.A/§4.D/glossary
/// "Reference string"). A leading `.` is the dotted-path trigger: the first
/// segment is an environment lookup, remaining segments chain through the
/// attribute-lookup protocol. Without a leading `.` — the common case for a
/// call head — the whole string (dots and all, e.g. `seq.len`, `//`) is a
/// single literal environment key: kernel forms are registered under their
/// full dotted/symbolic name, not as nested modules.
pub fn resolve_path(raw: &str, env: &Environment) -> JsprResult<Value> {
    match raw.strip_prefix('.') {
        Some(rest) => {
            let mut segments = rest.split('.');
            let first = segments.next().unwrap_or("");
            let mut value = env.require(first)?;
            for segment in segments {
                value = get_attr(&value, segment)?;
            }
            Ok(value)
        }
        None => env.require(raw),
    }
}

/// The attribute-lookup protocol (spec.md §4.A): modules and environments
/// support it natively, plain mappings fall back to key indexing, anything
/// else fails `no-such-attr`.
pub fn get_attr(value: &Value, key: &str) -> JsprResult<Value> {
    match value {
        Value::Environment(e) => e.get_attr(key),
        Value::Callable(c) if c.is_module() => match c {
            Callable::Module(m) => m.get_attr(key),
            _ => unreachable!(),
        },
        Value::Mapping(m) => m.get(key).cloned().ok_or_else(|| {
            JsprError::kind("no-such-attr", [value.clone(), Value::string(key.to_string())])
        }),
        _ => Err(JsprError::kind(
            "no-such-attr",
            [value.clone(), Value::string(key.to_string())],
        )),
    }
}
