//! Error types for ledchain-sync.

use std::path::PathBuf;

use thiserror::Error;

use ledchain_core::ChainError;

/// All errors that can arise from state store and synchronizer operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A chain mutator rejected the operation.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// A stored option could not be interpreted. Only the module (or setting)
    /// it belongs to is affected.
    #[error("malformed value {value:?} for '{key}' in section '{section}': {reason}")]
    Parse {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// I/O failure on the state file, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not valid TOML.
    #[error("failed to parse state file at {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Serializing the store for save failed.
    #[error("state serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `dirs::home_dir()` returned `None` and no explicit state path was given.
    #[error("cannot determine home directory; set $HOME or $LEDCHAIN_STATE")]
    HomeNotFound,
}

impl SyncError {
    /// True for errors that only affect a single module's load or save.
    pub fn is_module_local(&self) -> bool {
        matches!(self, SyncError::Parse { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn parse_err(
    section: &str,
    key: &str,
    value: &str,
    reason: impl Into<String>,
) -> SyncError {
    SyncError::Parse {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}
