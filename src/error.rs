//! The JSPR error model (spec.md §7 / §4.I): a single raisable exception
//! carrying a [`Value`] payload, conventionally shaped `[kind, ...context]`.

use std::fmt;

use crate::value::Value;

/// Raised by any evaluator operation that fails. The payload is always a
/// JSPR [`Value`] — typically a sequence whose first element is the error
/// kind (a string drawn from the catalogue in spec.md §7) and whose
/// remaining elements are context values for the caller to inspect.
#[derive(Clone, Debug, thiserror::Error)]
pub struct JsprError {
    payload: Value,
}

impl JsprError {
    pub fn new(payload: Value) -> Self {
        JsprError { payload }
    }

    /// Build the conventional `[kind, ...context]` shaped payload.
    pub fn kind(kind: &str, context: impl IntoIterator<Item = Value>) -> Self {
        JsprError::new(Value::error_payload(kind, context))
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

impl fmt::Display for JsprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.payload)
    }
}

pub type JsprResult<T> = Result<T, JsprError>;
