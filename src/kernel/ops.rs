//! Arithmetic and comparison built-ins (spec.md §4.H): `+ - * / // = != <>
//! neq compare lt gt gte lte same`, each a `Function` taking `(left,
//! <keyword>: right)`. Keyword aliases follow
//! `original_source/jspr/kernel.py`'s `_make_binop` naming where a
//! counterpart exists there (`and` for `+`/`=`/`!=`, `minus` for `-`, `by`
//! for `*`/`/`/`//`); the comparison-only additions use `than`/`to`, which
//! have no precedent to follow since they don't appear in `original_source`.

use std::cmp::Ordering;

use crate::callable::Callable;
use crate::environment::Environment;
use crate::error::{JsprError, JsprResult};
use crate::eval::calling::unpack_kwlist;
use crate::value::{Arguments, Value};

pub fn register(env: &Environment) {
    define_binop(env, &["+", "add"], "and", add_values);
    define_binop(env, &["-", "sub"], "minus", sub_values);
    define_binop(env, &["*", "mul"], "by", mul_values);
    define_binop(env, &["/", "div"], "by", truediv_values);
    define_binop(env, &["//", "floordiv"], "by", floordiv_values);
    define_binop(env, &["=", "eq"], "and", |a, b| Ok(Value::Bool(a == b)));
    define_binop(env, &["!=", "<>", "neq"], "and", |a, b| Ok(Value::Bool(a != b)));
    define_binop(env, &["same"], "to", |a, b| Ok(Value::Bool(a == b)));
    define_binop(env, &["compare"], "to", |a, b| Ok(Value::string(compare_tag(compare_values(a, b)?))));
    define_binop(env, &["gt"], "than", |a, b| Ok(Value::Bool(compare_values(a, b)?.is_gt())));
    define_binop(env, &["lt"], "than", |a, b| Ok(Value::Bool(compare_values(a, b)?.is_lt())));
    define_binop(env, &["gte"], "than", |a, b| Ok(Value::Bool(!compare_values(a, b)?.is_lt())));
    define_binop(env, &["lte"], "than", |a, b| Ok(Value::Bool(!compare_values(a, b)?.is_gt())));
}

fn define_binop(
    env: &Environment,
    names: &[&'static str],
    keyword: &'static str,
    op: fn(&Value, &Value) -> JsprResult<Value>,
) {
    for name in names {
        let name = *name;
        env.define(
            name,
            Value::Callable(Callable::native_function(move |args, _env| {
                let vals = unpack_kwlist(name, args, &[keyword])?;
                op(&vals[0], &vals[1])
            })),
        );
    }
}

enum Num {
    Int(i64),
    Float(f64),
}

fn as_number(v: &Value) -> Option<Num> {
    match v {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn to_f64(n: &Num) -> f64 {
    match n {
        Num::Int(i) => *i as f64,
        Num::Float(f) => *f,
    }
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> JsprResult<Value> {
    match (as_number(a), as_number(b)) {
        (Some(Num::Int(x)), Some(Num::Int(y))) => Ok(Value::Int(int_op(x, y))),
        (Some(x), Some(y)) => Ok(Value::Float(float_op(to_f64(&x), to_f64(&y)))),
        _ => Err(JsprError::kind("invalid-args", [a.clone(), b.clone()])),
    }
}

fn add_values(a: &Value, b: &Value) -> JsprResult<Value> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Ok(Value::string(format!("{x}{y}")));
    }
    numeric_binop(a, b, |x, y| x.wrapping_add(y), |x, y| x + y)
}

fn sub_values(a: &Value, b: &Value) -> JsprResult<Value> {
    numeric_binop(a, b, |x, y| x.wrapping_sub(y), |x, y| x - y)
}

fn mul_values(a: &Value, b: &Value) -> JsprResult<Value> {
    numeric_binop(a, b, |x, y| x.wrapping_mul(y), |x, y| x * y)
}

fn truediv_values(a: &Value, b: &Value) -> JsprResult<Value> {
    let (x, y) = (as_number(a), as_number(b));
    match (x, y) {
        (Some(x), Some(y)) => Ok(Value::Float(to_f64(&x) / to_f64(&y))),
        _ => Err(JsprError::kind("invalid-args", [a.clone(), b.clone()])),
    }
}

fn floordiv_values(a: &Value, b: &Value) -> JsprResult<Value> {
    numeric_binop(a, b, |x, y| (x as f64 / y as f64).floor() as i64, |x, y| (x / y).floor())
}

fn compare_tag(ord: Ordering) -> &'static str {
    match ord {
        Ordering::Less => "lt",
        Ordering::Equal => "eq",
        Ordering::Greater => "gt",
    }
}

/// Total order over comparable values (spec.md §4.H "`compare` semantics").
pub fn compare_values(a: &Value, b: &Value) -> JsprResult<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => partial_cmp_or_err(a, b, *x as f64, *y),
        (Value::Float(x), Value::Int(y)) => partial_cmp_or_err(a, b, *x, *y as f64),
        (Value::Float(x), Value::Float(y)) => partial_cmp_or_err(a, b, *x, *y),
        (Value::Sequence(x), Value::Sequence(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                let ord = compare_values(xi, yi)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        (Value::Mapping(x), Value::Mapping(y)) => {
            let mut xk: Vec<&String> = x.keys().collect();
            let mut yk: Vec<&String> = y.keys().collect();
            xk.sort();
            yk.sort();
            let key_order = xk.cmp(&yk);
            if key_order != Ordering::Equal {
                return Ok(key_order);
            }
            for k in xk {
                let ord = compare_values(&x[k], &y[k])?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(Ordering::Equal)
        }
        _ => Err(JsprError::kind("invalid-compare", [a.clone(), b.clone()])),
    }
}

fn partial_cmp_or_err(a: &Value, b: &Value, x: f64, y: f64) -> JsprResult<Ordering> {
    x.partial_cmp(&y)
        .ok_or_else(|| JsprError::kind("invalid-compare", [a.clone(), b.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_ints() {
        let env = Environment::new();
        register(&env);
        let callable = match env.lookup("+").unwrap() {
            Value::Callable(c) => c,
            _ => panic!("expected callable"),
        };
        let args = Arguments::Positional(vec![Value::Int(3), Value::Int(4)]);
        let result = callable.invoke(args, &env, &|v, _| Ok(v.clone())).unwrap();
        assert_eq!(result, Value::Int(7));
    }

    #[test]
    fn compare_total_order_is_antisymmetric() {
        assert_eq!(compare_values(&Value::Int(1), &Value::Int(2)).unwrap(), Ordering::Less);
        assert_eq!(compare_values(&Value::Int(2), &Value::Int(1)).unwrap(), Ordering::Greater);
        assert_eq!(compare_values(&Value::Int(1), &Value::Int(1)).unwrap(), Ordering::Equal);
    }

    #[test]
    fn incomparable_values_raise_invalid_compare() {
        let err = compare_values(&Value::Null, &Value::Int(1)).unwrap_err();
        match err.payload() {
            Value::Sequence(items) => assert_eq!(items[0], Value::string("invalid-compare")),
            _ => panic!("expected sequence payload"),
        }
    }
}
