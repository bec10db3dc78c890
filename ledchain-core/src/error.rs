//! Error types for ledchain-core.

use thiserror::Error;

/// All errors that can arise from chain operations.
///
/// Validation errors (`OutOfRange`, `InvalidArgument`, `ResizeLocked`) are
/// raised before any state changes, so a failed call never partially applies.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Module index outside `0..count`.
    #[error("module index {index} out of range (chain has {count} modules)")]
    OutOfRange { index: i64, count: usize },

    /// An argument was outside its accepted domain (brightness level, chain length).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `resize` was called after the chain had been mutated or written to the bus.
    #[error("chain cannot be resized once state has been loaded or sent")]
    ResizeLocked,

    /// The bus write failed; dirty flags are left as they were.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure on the bus channel.
    #[error("I/O error on {channel}: {source}")]
    Io {
        channel: String,
        #[source]
        source: std::io::Error,
    },

    /// The device accepted fewer bytes than were offered.
    #[error("short write on {channel}: {written} of {expected} bytes")]
    ShortWrite {
        channel: String,
        written: usize,
        expected: usize,
    },

    /// The pigpio daemon answered a command with a negative status.
    #[error("pigpio daemon rejected command {command} with status {status}")]
    Daemon { command: u32, status: i32 },

    /// The channel has not been opened (or was already closed).
    #[error("transport channel {0} is not open")]
    NotOpen(String),

    /// Requested bus configuration cannot be applied.
    #[error("unsupported bus configuration: {0}")]
    Unsupported(String),
}

/// Convenience constructor for [`TransportError::Io`].
pub fn transport_io(channel: impl Into<String>, source: std::io::Error) -> TransportError {
    TransportError::Io {
        channel: channel.into(),
        source,
    }
}
