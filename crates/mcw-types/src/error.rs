use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resource name: {0:?}")]
    InvalidResourceName(String),

    #[error("region slot out of range: {0}")]
    SlotOutOfRange(usize),
}
