use thiserror::Error;

/// Errors raised while parsing or constructing an action.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid resource name: {0:?}")]
    InvalidName(String),

    #[error("{field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} should be in range [0, {limit}), got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        limit: u32,
    },

    #[error("non-multipart block entity cannot be converted to multipart")]
    MultipartTransition,
}

pub type ActionResult<T> = Result<T, ActionError>;
