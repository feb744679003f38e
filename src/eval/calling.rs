//! Calling-convention helpers (spec.md §4.E): `unary` and `unpack-kwlist`,
//! used throughout the kernel to destructure a [`Arguments`] without caring
//! whether the call site used positional or keyword-sequence sugar.

use crate::error::{JsprError, JsprResult};
use crate::value::{Arguments, Value};

/// Exactly one positional argument, or a keyword call's first pair.
pub fn unary<'a>(name: &str, args: &'a Arguments) -> JsprResult<&'a Value> {
    match args {
        Arguments::Positional(items) if items.len() == 1 => Ok(&items[0]),
        Arguments::Keyword(kw) if kw.len() == 1 => Ok(kw.first_arg()),
        _ => Err(JsprError::kind("invalid-args", [Value::string(name.to_string())])),
    }
}

/// For a `KeywordSequence`, returns `[first_arg, args[keys[0]], ...]`,
/// failing if a named key is absent. For a positional sequence, requires
/// length `keys.len() + 1` and returns it verbatim.
pub fn unpack_kwlist(name: &str, args: &Arguments, keys: &[&str]) -> JsprResult<Vec<Value>> {
    match args {
        Arguments::Keyword(kw) => {
            let mut out = Vec::with_capacity(keys.len() + 1);
            out.push(kw.first_arg().clone());
            for key in keys {
                let value = kw.try_get(key).ok_or_else(|| {
                    JsprError::kind(
                        "invalid-args",
                        [Value::string(name.to_string()), Value::string((*key).to_string())],
                    )
                })?;
                out.push(value.clone());
            }
            Ok(out)
        }
        Arguments::Positional(items) => {
            if items.len() != keys.len() + 1 {
                return Err(JsprError::kind(
                    "invalid-args",
                    [
                        Value::string(name.to_string()),
                        Value::Int((keys.len() + 1) as i64),
                        Value::Int(items.len() as i64),
                    ],
                ));
            }
            Ok(items.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::KeywordSequence;

    #[test]
    fn unpack_kwlist_positional_requires_exact_arity() {
        let args = Arguments::Positional(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            unpack_kwlist("add", &args, &["and"]).unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
        let short = Arguments::Positional(vec![Value::Int(1)]);
        assert!(unpack_kwlist("add", &short, &["and"]).is_err());
    }

    #[test]
    fn unpack_kwlist_keyword_looks_up_named_keys() {
        let kw = KeywordSequence::new(vec![
            ("add".to_string(), Value::Int(1)),
            ("and".to_string(), Value::Int(2)),
        ]);
        let args = Arguments::Keyword(kw);
        assert_eq!(
            unpack_kwlist("add", &args, &["and"]).unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }
}
