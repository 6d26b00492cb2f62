use cwhile_parser::identifiers::Ident;
use thiserror::Error;

pub mod binop;
pub mod runtime;

pub use runtime::value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Invalid operand of type {type_name} for {op}")]
    TypeMismatch {
        op: &'static str,
        type_name: &'static str,
    },
    #[error("Invalid operands {lhs} and {rhs} for operator {op}")]
    BinaryTypeMismatch {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("Unknown variable `{0}`")]
    UnknownVariable(Ident),
    #[error("Unknown function `{0}`")]
    UnknownFunction(Ident),
    #[error("`{function}` takes {expected} arguments, {found} given")]
    ArgumentCount {
        function: Ident,
        expected: usize,
        found: usize,
    },
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("Division by zero")]
    DivideByZero,
    #[error("Step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },
    #[error("`{0}` must be desugared before execution")]
    ExtensionNode(&'static str),
    #[error("`{0}` outside of a loop")]
    StrayJump(&'static str),
}
