//! Error types for the diff crate.

use mcw_action::ActionError;
use mcw_store::StoreError;

/// Errors that can occur while comparing two saves.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The saves were given in the wrong order.
    #[error("first given world save must have smaller version number (given: {old} - {new})")]
    VersionOrder { old: String, new: String },

    #[error("given world saves have exactly the same version ({0})")]
    SameVersion(String),

    #[error("given worlds have different seeds ({old} and {new})")]
    SeedMismatch { old: i64, new: i64 },

    /// Reading either save failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An action could not be built from the compared data.
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    #[error("configuration error: {0}")]
    Config(String),

    /// The operating system refused to start a comparison thread.
    #[error("failed to start comparison worker: {0}")]
    Spawn(#[source] std::io::Error),
}

impl DiffError {
    /// Returns `true` for problems with the given saves rather than with
    /// their contents or the environment.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::VersionOrder { .. } | Self::SameVersion(_) | Self::SeedMismatch { .. } => true,
            Self::Store(e) => e.is_validation(),
            _ => false,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
