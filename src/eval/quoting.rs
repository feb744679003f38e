//! Quoting, quasiquoting, and string interpolation (spec.md §4.G).

use indexmap::IndexMap;

use super::resolve_path;
use crate::environment::Environment;
use crate::error::{JsprError, JsprResult};
use crate::value::Value;

/// Structural walk of `v`: scalars and anything without an `unquote` shape
/// pass through unchanged; `['unquote', y]` or `[{unquote: y}]` evaluates
/// `y` in `env` and splices the result in.
pub fn quasiquote(v: &Value, env: &Environment) -> JsprResult<Value> {
    if let Some(y) = unquote_target(v) {
        return super::eval(y, env);
    }
    match v {
        Value::Sequence(items) => {
            let mapped = items
                .iter()
                .map(|item| quasiquote(item, env))
                .collect::<JsprResult<Vec<_>>>()?;
            Ok(Value::sequence(mapped))
        }
        Value::Mapping(m) => {
            let mut out = IndexMap::with_capacity(m.len());
            for (k, v) in m.iter() {
                out.insert(k.clone(), quasiquote(v, env)?);
            }
            Ok(Value::mapping(out))
        }
        other => Ok(other.clone()),
    }
}

fn unquote_target(v: &Value) -> Option<&Value> {
    let Value::Sequence(items) = v else {
        return None;
    };
    if items.len() == 2 {
        if let Value::String(tag) = &items[0] {
            if tag == "unquote" {
                return Some(&items[1]);
            }
        }
    }
    if items.len() == 1 {
        if let Value::Mapping(m) = &items[0] {
            if m.len() == 1 {
                let (k, v) = m.iter().next().expect("len checked above");
                if k == "unquote" {
                    return Some(v);
                }
            }
        }
    }
    None
}

/// Substitutes every `#{ref}` run in `s` with the display-string of the
/// dotted-path lookup `ref`; `` `# `` is the escape for a literal `#`.
pub fn interpolate(s: &str, env: &Environment) -> JsprResult<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '`' && chars.get(i + 1) == Some(&'#') {
            out.push('#');
            i += 2;
            continue;
        }
        if c == '#' && chars.get(i + 1) == Some(&'{') {
            let start = i + 2;
            let end = chars[start..].iter().position(|c| *c == '}').map(|p| start + p);
            let Some(end) = end else {
                return Err(JsprError::kind(
                    "unterminated-string-interp",
                    [Value::string(s.to_string())],
                ));
            };
            let reference: String = chars[start..end].iter().collect();
            let value = resolve_path(&reference, env)?;
            out.push_str(&value.to_display_string());
            i = end + 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quasiquote_passes_scalars_through() {
        let env = Environment::new();
        assert_eq!(quasiquote(&Value::Int(4), &env).unwrap(), Value::Int(4));
    }

    #[test]
    fn quasiquote_splices_unquote_sequence_shape() {
        let env = Environment::new();
        env.define("x", Value::Int(9));
        let form = Value::sequence(vec![
            Value::string("unquote"),
            Value::string(".x"),
        ]);
        assert_eq!(quasiquote(&form, &env).unwrap(), Value::Int(9));
    }

    #[test]
    fn interpolate_substitutes_reference() {
        let env = Environment::new();
        env.define("name", Value::string("world"));
        assert_eq!(interpolate("hello #{name}!", &env).unwrap(), "hello world!");
    }

    #[test]
    fn interpolate_escapes_literal_hash() {
        let env = Environment::new();
        assert_eq!(interpolate("price: `#100", &env).unwrap(), "price: #100");
    }

    #[test]
    fn interpolate_unterminated_brace_errors() {
        let env = Environment::new();
        let err = interpolate("oops #{unterminated", &env).unwrap_err();
        match err.payload() {
            Value::Sequence(items) => {
                assert_eq!(items[0], Value::string("unterminated-string-interp"))
            }
            _ => panic!("expected sequence payload"),
        }
    }
}
