//! Document loading (SPEC_FULL.md §10.4 — out of scope for the evaluator
//! proper, per spec.md §1, but needed by the CLI and REPL). Converts a
//! parsed `serde_yaml::Value` tree into a [`Value`], preserving mapping key
//! order: `serde_yaml` 0.9's `Mapping` is insertion-ordered, matching
//! spec.md §6's requirement that key order survive parsing.

use crate::value::Value;

pub fn from_yaml(v: serde_yaml::Value) -> Result<Value, String> {
    match v {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(format!("unsupported number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::string(s)),
        serde_yaml::Value::Sequence(items) => {
            let converted = items.into_iter().map(from_yaml).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::sequence(converted))
        }
        serde_yaml::Value::Mapping(entries) => {
            let mut out = indexmap::IndexMap::with_capacity(entries.len());
            for (k, v) in entries {
                let key = k.as_str().ok_or_else(|| format!("non-string map key: {k:?}"))?.to_string();
                out.insert(key, from_yaml(v)?);
            }
            Ok(Value::mapping(out))
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_mapping_key_order() {
        let yaml = serde_yaml::from_str("b: 1\na: 2\n").unwrap();
        let value = from_yaml(yaml).unwrap();
        let m = value.as_mapping().unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn converts_nested_sequence() {
        let yaml = serde_yaml::from_str("[1, 2, 3]").unwrap();
        let value = from_yaml(yaml).unwrap();
        assert_eq!(
            value,
            Value::sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }
}
