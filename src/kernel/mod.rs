//! The kernel (spec.md §4.H): registration of every built-in special form
//! and function. `load_kernel` is the sole public entry point, mirroring
//! `original_source/jspr/kernel.py`'s `load_kernel(env)`.

mod collections;
mod ops;

use std::cell::RefCell;
use std::rc::Rc;

use crate::callable::{Callable, ClosureInner};
use crate::environment::Environment;
use crate::error::{JsprError, JsprResult};
use crate::eval::calling::unpack_kwlist;
use crate::eval::{eval, quasiquote};
use crate::value::{Arguments, Value};

pub fn load_kernel(env: &Environment) {
    env.define("__env__", Value::Callable(Callable::native_special_form(get_current_env)));
    env.define("__eval__", Value::Callable(Callable::native_function(dunder_eval)));
    env.define(
        "__eval_do_seq__",
        Value::Callable(Callable::native_function(dunder_eval_do_seq)),
    );

    env.define("if", Value::Callable(Callable::native_special_form(if_sf)));
    env.define("cond", Value::Callable(Callable::native_special_form(cond_sf)));
    env.define("do", Value::Callable(Callable::native_special_form(do_sf)));
    env.define("let", Value::Callable(Callable::native_function(let_fn)));
    env.define("ref", Value::Callable(Callable::native_special_form(ref_sf)));
    env.define("lambda", Value::Callable(Callable::native_special_form(lambda_sf)));
    env.define("macro", Value::Callable(Callable::native_special_form(macro_sf)));
    env.define("quote", Value::Callable(Callable::native_special_form(quote_sf)));
    env.define(
        "quasiquote",
        Value::Callable(Callable::native_special_form(quasiquote_sf)),
    );
    env.define("seq", Value::Callable(Callable::native_special_form(seq_sf)));
    env.define("map", Value::Callable(Callable::native_special_form(map_sf)));
    env.define("apply", Value::Callable(Callable::native_function(apply_fn)));
    env.define("eval", Value::Callable(Callable::native_function(eval_fn)));
    env.define("raise", Value::Callable(Callable::native_function(raise_fn)));
    env.define("assert", Value::Callable(Callable::native_special_form(assert_sf)));
    env.define("test", Value::Callable(Callable::native_special_form(test_sf)));
    env.define("or", Value::Callable(Callable::native_special_form(or_sf)));
    env.define("and", Value::Callable(Callable::native_special_form(and_sf)));
    env.define("xor", Value::Callable(Callable::native_special_form(xor_sf)));

    ops::register(env);
    collections::register(env);
}

fn get_current_env(_args: &Arguments, env: &Environment) -> JsprResult<Value> {
    Ok(Value::Environment(env.clone()))
}

/// `__eval__(expr, with: env)`: like the `eval`/`with` kernel function, but
/// named with the reflective double-underscore convention
/// `original_source/jspr/kernel.py` uses for `dunder_eval`.
fn dunder_eval(args: &Arguments, _caller_env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("__eval__", args, &["with"])?;
    let target_env = require_environment(&vals[1])?;
    eval(&vals[0], &target_env)
}

fn dunder_eval_do_seq(args: &Arguments, _caller_env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("__eval_do_seq__", args, &["with"])?;
    let target_env = require_environment(&vals[1])?;
    eval_do_seq(&vals[0], &target_env)
}

fn require_environment(v: &Value) -> JsprResult<Environment> {
    match v {
        Value::Environment(e) => Ok(e.clone()),
        other => Err(JsprError::kind("invalid-eval-env", [other.clone()])),
    }
}

/// Evaluate each element of a literal sequence in a fresh child of `env`,
/// returning the last result (or `null` if empty) — the shared body behind
/// `do` and the CLI's top-level document evaluation (spec.md §4.H `do`,
/// §6 CLI).
pub fn eval_do_seq(items_expr: &Value, env: &Environment) -> JsprResult<Value> {
    let items = items_expr
        .as_sequence()
        .ok_or_else(|| JsprError::kind("invalid-do", [items_expr.clone()]))?;
    let child = env.new_child();
    let mut last = Value::Null;
    for item in items {
        last = eval(item, &child)?;
    }
    Ok(last)
}

fn if_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("if", args, &["then", "else"])?;
    let subenv = env.new_child();
    match eval(&vals[0], &subenv)? {
        Value::Bool(true) => eval(&vals[1], &subenv),
        Value::Bool(false) => eval(&vals[2], &subenv),
        other => Err(JsprError::kind("invalid-if-condition", [other])),
    }
}

fn cond_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("cond", args)?;
    let branches = raw
        .as_sequence()
        .ok_or_else(|| JsprError::kind("invalid-cond-branch", [raw.clone()]))?;
    for branch in branches {
        let pair = branch
            .as_sequence()
            .ok_or_else(|| JsprError::kind("invalid-cond-branch", [branch.clone()]))?;
        if pair.len() != 2 {
            return Err(JsprError::kind("invalid-cond-branch", [branch.clone()]));
        }
        let branch_env = env.new_child();
        match eval(&pair[0], &branch_env)? {
            Value::Bool(true) => return eval(&pair[1], &branch_env),
            Value::Bool(false) => continue,
            other => return Err(JsprError::kind("invalid-cond-condition", [other])),
        }
    }
    Err(JsprError::kind("cond-no-match", []))
}

fn do_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("do", args)?;
    eval_do_seq(raw, env)
}

/// `let`/`be` (spec.md §4.H): a `Function`, so both the name and the value
/// arrive already evaluated. Binds in `caller_env` — not the ephemeral
/// child the dispatcher used to evaluate those two arguments — since the
/// binding must be visible to the rest of the enclosing `do` sequence.
fn let_fn(args: &Arguments, caller_env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("let", args, &["be"])?;
    let name = vals[0]
        .as_str()
        .ok_or_else(|| JsprError::kind("invalid-varname", [vals[0].clone()]))?
        .to_string();
    let value = vals[1].clone();
    if let Value::Callable(Callable::Closure(closure)) = &value {
        if closure.name.borrow().is_empty() {
            *closure.name.borrow_mut() = name.clone();
        }
    }
    caller_env.define(name, value.clone());
    Ok(value)
}

fn ref_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("ref", args)?;
    let name_value = eval(raw, env)?;
    let name = name_value
        .as_str()
        .ok_or_else(|| JsprError::kind("invalid-varname", [name_value.clone()]))?;
    env.require(name)
}

fn build_closure(name: &str, args: &Arguments, env: &Environment) -> JsprResult<Rc<ClosureInner>> {
    let vals = unpack_kwlist(name, args, &["is"])?;
    let arglist = vals[0]
        .as_sequence()
        .ok_or_else(|| JsprError::kind("invalid-args", [vals[0].clone()]))?;
    let params = arglist
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| JsprError::kind("invalid-args", [v.clone()]))
        })
        .collect::<JsprResult<Vec<_>>>()?;
    Ok(Rc::new(ClosureInner {
        params,
        body: vals[1].clone(),
        env: env.clone_frame(),
        name: RefCell::new(String::new()),
    }))
}

fn lambda_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let closure = build_closure("lambda", args, env)?;
    Ok(Value::Callable(Callable::Closure(closure)))
}

fn macro_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let closure = build_closure("macro", args, env)?;
    Ok(Value::Callable(Callable::Macro(closure)))
}

fn quote_sf(args: &Arguments, _env: &Environment) -> JsprResult<Value> {
    Ok(crate::eval::calling::unary("quote", args)?.clone())
}

fn quasiquote_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("quasiquote", args)?;
    quasiquote(raw, env)
}

fn seq_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("seq", args)?;
    let items = raw
        .as_sequence()
        .ok_or_else(|| JsprError::kind("invalid-seq", [raw.clone()]))?;
    let evaluated = items.iter().map(|item| eval(item, env)).collect::<JsprResult<Vec<_>>>()?;
    Ok(Value::sequence(evaluated))
}

fn map_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("map", args)?;
    let entries = raw
        .as_mapping()
        .ok_or_else(|| JsprError::kind("invalid-map", [raw.clone()]))?;
    let mut out = indexmap::IndexMap::with_capacity(entries.len());
    for (k, v) in entries {
        out.insert(k.clone(), eval(v, env)?);
    }
    Ok(Value::mapping(out))
}

/// `apply(f, argvec)`: both arguments arrive pre-evaluated (`Function`
/// policy); `argvec` becomes the callee's argument shape directly, so if
/// `f` is itself a `Function`/`Closure` its elements are evaluated a second
/// time — the same double-reduction `original_source/jspr/kernel.py`'s
/// `apply_fn` exhibits, inherent to treating already-reduced data as a
/// fresh call's arguments.
fn apply_fn(args: &Arguments, caller_env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("apply", args, &["with"])?;
    let (func, argvec) = (&vals[0], &vals[1]);
    let callable = match func {
        Value::Callable(c) => c.clone(),
        _ => return Err(JsprError::kind("invalid-apply-func", [func.clone(), argvec.clone()])),
    };
    let call_args = match argvec {
        Value::Sequence(items) => Arguments::Positional(items.as_ref().clone()),
        Value::KeywordSequence(kw) => Arguments::Keyword(kw.as_ref().clone()),
        _ => return Err(JsprError::kind("invalid-apply-args", [func.clone(), argvec.clone()])),
    };
    callable.invoke(call_args, caller_env, &eval)
}

/// `eval(expr, with: env)`: `expr` arrives already evaluated once (the
/// `Function` policy runs it in the caller's environment); evaluating it
/// again inside `env` is what lets a value that looks like code become code
/// a second time, matching `eval_fn` in `original_source/jspr/kernel.py`.
fn eval_fn(args: &Arguments, _caller_env: &Environment) -> JsprResult<Value> {
    let vals = unpack_kwlist("eval", args, &["with"])?;
    let target_env = require_environment(&vals[1])?;
    eval(&vals[0], &target_env)
}

fn raise_fn(args: &Arguments, _env: &Environment) -> JsprResult<Value> {
    let payload = crate::eval::calling::unary("raise", args)?;
    Err(JsprError::new(payload.clone()))
}

fn assert_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let raw = crate::eval::calling::unary("assert", args)?;
    match eval(raw, env)? {
        Value::Bool(true) => Ok(Value::Bool(true)),
        Value::Bool(false) => Err(JsprError::kind("assertion-failed", [raw.clone()])),
        other => Err(JsprError::kind("invalid-assert-condition", [other])),
    }
}

fn raw_operand_exprs(args: &Arguments) -> Vec<Value> {
    match args {
        Arguments::Positional(items) => items.clone(),
        Arguments::Keyword(kw) => kw.pairs().iter().map(|(_, v)| v.clone()).collect(),
    }
}

fn or_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    for expr in raw_operand_exprs(args) {
        match eval(&expr, env)? {
            Value::Bool(true) => return Ok(Value::Bool(true)),
            Value::Bool(false) => continue,
            other => return Err(JsprError::kind("invalid-or-condition", [other])),
        }
    }
    Ok(Value::Bool(false))
}

fn and_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    for expr in raw_operand_exprs(args) {
        match eval(&expr, env)? {
            Value::Bool(false) => return Ok(Value::Bool(false)),
            Value::Bool(true) => continue,
            other => return Err(JsprError::kind("invalid-and-condition", [other])),
        }
    }
    Ok(Value::Bool(true))
}

fn xor_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let mut acc = false;
    for expr in raw_operand_exprs(args) {
        match eval(&expr, env)? {
            Value::Bool(b) => acc ^= b,
            other => return Err(JsprError::kind("invalid-xor-condition", [other])),
        }
    }
    Ok(Value::Bool(acc))
}

/// `test` (spec.md §4.H): an infix comparison chain encoded as a
/// `KeywordSequence` — `{<callee>: initial, eq/neq/gt/...: rhs, ...}`.
fn test_sf(args: &Arguments, env: &Environment) -> JsprResult<Value> {
    let Arguments::Keyword(kw) = args else {
        return Err(JsprError::kind("invalid-test-args", []));
    };
    let pairs = kw.pairs();
    if pairs.is_empty() {
        return Err(JsprError::kind("invalid-test-args", []));
    }
    let mut lhs = eval(&pairs[0].1, env)?;
    for (op, rhs_expr) in &pairs[1..] {
        match op.as_str() {
            "and" => {
                let cur = lhs
                    .as_bool()
                    .ok_or_else(|| JsprError::kind("invalid-test-and-condition", [lhs.clone()]))?;
                if !cur {
                    lhs = Value::Bool(false);
                    break;
                }
                lhs = eval(rhs_expr, env)?;
            }
            "or" => {
                let cur = lhs
                    .as_bool()
                    .ok_or_else(|| JsprError::kind("invalid-test-or-condition", [lhs.clone()]))?;
                if cur {
                    lhs = Value::Bool(true);
                    break;
                }
                lhs = eval(rhs_expr, env)?;
            }
            "eq" | "equal-to" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(lhs == rhs);
            }
            "neq" | "not-equal-to" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(lhs != rhs);
            }
            "gt" | "greater-than" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(ops::compare_values(&lhs, &rhs)?.is_gt());
            }
            "lt" | "less-than" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(ops::compare_values(&lhs, &rhs)?.is_lt());
            }
            "gte" | "at-least" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(!ops::compare_values(&lhs, &rhs)?.is_lt());
            }
            "lte" | "at-most" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(!ops::compare_values(&lhs, &rhs)?.is_gt());
            }
            "in" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(collections::membership("invalid-test-in", &lhs, &rhs)?);
            }
            "not-in" => {
                let rhs = eval(rhs_expr, env)?;
                lhs = Value::Bool(!collections::membership("invalid-test-not-in", &lhs, &rhs)?);
            }
            _ => return Err(JsprError::kind("invalid-test-oper", [Value::string(op.clone())])),
        }
    }
    match lhs {
        Value::Bool(_) => Ok(lhs),
        other => Err(JsprError::kind("invalid-test-value", [other])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_env() -> Environment {
        let env = Environment::new();
        load_kernel(&env);
        env
    }

    #[test]
    fn simple_add() {
        let env = fresh_env();
        let expr = Value::sequence(vec![Value::string("+"), Value::Int(3), Value::Int(4)]);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(7));
    }

    #[test]
    fn cond_picks_first_true_branch() {
        let env = fresh_env();
        let branches = Value::sequence(vec![
            Value::sequence(vec![Value::Bool(false), Value::Int(7)]),
            Value::sequence(vec![Value::Bool(true), Value::Int(91)]),
        ]);
        let expr = Value::sequence(vec![Value::string("cond"), branches]);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(91));
    }

    #[test]
    fn cond_no_match_raises() {
        let env = fresh_env();
        let branches = Value::sequence(vec![Value::sequence(vec![Value::Bool(false), Value::Int(1)])]);
        let expr = Value::sequence(vec![Value::string("cond"), branches]);
        let err = eval(&expr, &env).unwrap_err();
        match err.payload() {
            Value::Sequence(items) => assert_eq!(items[0], Value::string("cond-no-match")),
            _ => panic!("expected sequence payload"),
        }
    }

    #[test]
    fn lambda_closure_roundtrip() {
        let env = fresh_env();
        let mut def = indexmap::IndexMap::new();
        def.insert(
            "fun=".to_string(),
            Value::sequence(vec![
                Value::string("lambda"),
                Value::sequence(vec![Value::string("a")]),
                Value::string(".a"),
            ]),
        );
        let call = Value::sequence(vec![Value::string("fun"), Value::Int(9)]);
        let do_seq = Value::sequence(vec![
            Value::string("do"),
            Value::sequence(vec![Value::mapping(def), call]),
        ]);
        assert_eq!(eval(&do_seq, &env).unwrap(), Value::Int(9));
    }

    #[test]
    fn macro_fixpoint_evaluates_body_in_caller_env() {
        let env = fresh_env();
        let mut m_def = indexmap::IndexMap::new();
        m_def.insert(
            "m=".to_string(),
            Value::sequence(vec![
                Value::string("macro"),
                Value::sequence(Vec::new()),
                Value::sequence(vec![Value::string("quote"), Value::string(".value")]),
            ]),
        );
        let mut value_def = indexmap::IndexMap::new();
        value_def.insert("value=".to_string(), Value::Int(8));
        let call = Value::sequence(vec![Value::string("m")]);
        let do_seq = Value::sequence(vec![
            Value::string("do"),
            Value::sequence(vec![Value::mapping(m_def), Value::mapping(value_def), call]),
        ]);
        assert_eq!(eval(&do_seq, &env).unwrap(), Value::Int(8));
    }

    #[test]
    fn auto_sequence_dash_sugar() {
        let env = fresh_env();
        let mut m = indexmap::IndexMap::new();
        m.insert(
            "-do".to_string(),
            Value::sequence(vec![Value::Int(1), Value::Int(2), Value::Int(9)]),
        );
        assert_eq!(eval(&Value::mapping(m), &env).unwrap(), Value::Int(9));
    }
}
