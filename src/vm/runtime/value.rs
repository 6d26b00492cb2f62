use derive_more::From;

use crate::vm::ExecutionError;

#[derive(Debug, Clone, PartialEq, From)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// Conditions must be booleans, there is no implicit truthiness.
    pub(crate) fn as_condition(&self, op: &'static str) -> Result<bool, ExecutionError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ExecutionError::TypeMismatch {
                op,
                type_name: other.type_name(),
            }),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Nil
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}
