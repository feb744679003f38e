//! Key normalization (spec.md §4.C): rewrites the key of a single-entry
//! mapping according to its trailing/infix sigils before the reducer's
//! calling convention ever sees it. The trailing `'`/`` ` `` rewrites are
//! grounded on `original_source/jspr/runtime.py`'s `normalize_kw_pair`; the
//! colon-infix rule below has no `original_source` precedent (neither
//! `runtime.py` nor `lang.py::normalize_pair` recurse on a `:` infix) — it's
//! spec-only, introduced by spec.md §4.C item 1.
//!
//! The sigils this module itself resolves:
//!   - empty key: passthrough, unchanged.
//!   - infix `:` (`head:tail`): recursively normalize `(tail, value)`, then
//!     return `(head, value')` — the head survives as the literal key, the
//!     tail exists only to drive its own sigil rewrite of the value.
//!   - trailing `'`: quote-wrap, `(stripped, ['quote', value])`.
//!   - trailing `` ` ``: seq-wrap, `(stripped, ['seq', value])` (additive
//!     sugar from `original_source`, see `SPEC_FULL.md` §0 disambiguation).
//!   - any other trailing non-alphanumeric, non-`=` character: an error.
//!
//! A leading `-` or trailing `=` on the *whole* key is left in place here —
//! those drive the Reducer's auto-sequence-call / `let`-define decisions,
//! not this module's rewrite (spec.md §4.D).

use crate::error::{JsprError, JsprResult};
use crate::value::Value;

pub fn normalize(key: &str, value: Value) -> JsprResult<(String, Value)> {
    if key.is_empty() {
        return Ok((key.to_string(), value));
    }

    if let Some(colon) = key.find(':') {
        let head = &key[..colon];
        let tail = &key[colon + 1..];
        if let Some(last) = head.chars().next_back() {
            if !last.is_alphanumeric() && last != '=' {
                return Err(JsprError::kind(
                    "invalid-key-suffix",
                    [Value::string(key.to_string())],
                ));
            }
        }
        let (_, rewritten) = normalize(tail, value)?;
        return Ok((head.to_string(), rewritten));
    }

    let last = key.chars().next_back().expect("key is non-empty");
    if last == '\'' {
        let stripped = &key[..key.len() - 1];
        return Ok((stripped.to_string(), Value::sequence(vec![Value::string("quote"), value])));
    }
    if last == '`' {
        let stripped = &key[..key.len() - 1];
        return Ok((stripped.to_string(), Value::sequence(vec![Value::string("seq"), value])));
    }
    if !last.is_alphanumeric() && last != '=' {
        return Err(JsprError::kind(
            "invalid-key-suffix",
            [Value::string(key.to_string())],
        ));
    }

    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_passes_through() {
        let (k, v) = normalize("", Value::Int(1)).unwrap();
        assert_eq!(k, "");
        assert_eq!(v, Value::Int(1));
    }

    #[test]
    fn trailing_quote_wraps_value() {
        let (k, v) = normalize("x'", Value::Int(1)).unwrap();
        assert_eq!(k, "x");
        assert_eq!(v, Value::sequence(vec![Value::string("quote"), Value::Int(1)]));
    }

    #[test]
    fn trailing_backtick_wraps_as_seq() {
        let (k, v) = normalize("x`", Value::Int(1)).unwrap();
        assert_eq!(k, "x");
        assert_eq!(v, Value::sequence(vec![Value::string("seq"), Value::Int(1)]));
    }

    #[test]
    fn colon_infix_keeps_head_as_key() {
        let (k, v) = normalize("do:body'", Value::Int(9)).unwrap();
        assert_eq!(k, "do");
        assert_eq!(v, Value::sequence(vec![Value::string("quote"), Value::Int(9)]));
    }

    #[test]
    fn plain_key_is_unchanged() {
        let (k, v) = normalize("name", Value::Int(1)).unwrap();
        assert_eq!(k, "name");
        assert_eq!(v, Value::Int(1));
    }

    #[test]
    fn trailing_invalid_suffix_errors() {
        let err = normalize("x!", Value::Int(1)).unwrap_err();
        match err.payload() {
            Value::Sequence(items) => assert_eq!(items[0], Value::string("invalid-key-suffix")),
            _ => panic!("expected sequence payload"),
        }
    }
}
