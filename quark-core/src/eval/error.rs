use thiserror::Error;

use crate::environment::prelude::ValueType;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },

    #[error("conditional reduced to false but has no alternative branch")]
    MissingAlternative,

    #[error("cannot construct a value from literal `{lexeme}`")]
    InvalidLiteral { lexeme: String },

    #[error("cannot apply `{operation}` to `{left:?}` and `{right:?}`")]
    InvalidOperands {
        operation: &'static str,
        left: ValueType,
        right: ValueType,
    },

    #[error("cannot apply `{operation}` to `{operand:?}`")]
    InvalidOperand {
        operation: &'static str,
        operand: ValueType,
    },

    #[error("`{operation}` of an empty list")]
    EmptyList { operation: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("token `{lexeme}` is not a known operator")]
    UnknownOperator { lexeme: String },

    #[error("resolving `{name}` cycles through its own binding")]
    CyclicBinding { name: String },

    #[error("evaluation exceeded the configured depth limit of {limit}")]
    RecursionLimitReached { limit: usize },
}
