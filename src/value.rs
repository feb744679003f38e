//! The JSPR value model.
//!
//! A [`Value`] is the single representation shared by code and data: atoms,
//! sequences, mappings, callables, first-class environments, and the
//! [`KeywordSequence`] argument shape used by keyword-style call sites.
//! See `spec.md` §3 DATA MODEL / §4.A.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::callable::Callable;
use crate::environment::Environment;

/// A JSPR value. Mirrors the shape of a parsed JSON/YAML document, plus the
/// runtime-only kinds (`Callable`, `Environment`, `KeywordSequence`) that
/// only ever appear as intermediate results of evaluation, never as parsed
/// input.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Rc<Vec<Value>>),
    Mapping(Rc<IndexMap<String, Value>>),
    Callable(Callable),
    Environment(Environment),
    KeywordSequence(Rc<KeywordSequence>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn sequence(items: Vec<Value>) -> Value {
        Value::Sequence(Rc::new(items))
    }

    pub fn mapping(items: IndexMap<String, Value>) -> Value {
        Value::Mapping(Rc::new(items))
    }

    /// `['kind', ctx0, ctx1, ...]`, the shape every raised error payload uses.
    pub fn error_payload(kind: &str, context: impl IntoIterator<Item = Value>) -> Value {
        let mut items = vec![Value::string(kind)];
        items.extend(context);
        Value::sequence(items)
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m.as_ref()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Stringification used by interpolation (`#{..}`) and `str.str`: `null`
    /// renders as the literal text `"null"` per spec.md §4.G.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            other => format!("{other:?}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Sequence(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Mapping(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Callable(c) => write!(f, "{c:?}"),
            Value::Environment(_) => write!(f, "<environment>"),
            Value::KeywordSequence(kw) => write!(f, "{kw:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Environment(a), Value::Environment(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// The argument vector built at a "keyword call" site: a sequence of
/// single-entry mappings. The first pair encodes the callee name and its
/// first positional argument (spec.md §3/§4.E).
#[derive(Debug, Clone, Default)]
pub struct KeywordSequence {
    pairs: Vec<(String, Value)>,
}

impl KeywordSequence {
    pub fn new(pairs: Vec<(String, Value)>) -> Self {
        KeywordSequence { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }

    pub fn first_key(&self) -> &str {
        &self.pairs[0].0
    }

    pub fn first_arg(&self) -> &Value {
        &self.pairs[0].1
    }

    /// Search the pairs after the first for `key`.
    pub fn try_get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().skip(1).find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.pairs.iter()
    }
}

/// The two argument shapes a call site can produce (spec.md §4.E): a plain
/// positional vector of expressions/values, or a [`KeywordSequence`].
#[derive(Debug, Clone)]
pub enum Arguments {
    Positional(Vec<Value>),
    Keyword(KeywordSequence),
}

impl Arguments {
    pub fn len(&self) -> usize {
        match self {
            Arguments::Positional(v) => v.len(),
            Arguments::Keyword(kw) => kw.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
