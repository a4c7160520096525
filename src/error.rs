//! Error types for the ranking engine

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration, shape checks and snapshot I/O.
///
/// Graph mutation and rank computation never fail for data-shape reasons:
/// unknown relations contribute nothing and empty graphs produce empty results.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration parameter is out of range
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// A matrix operation was asked to violate its shape contract
    #[error("dimension mismatch: {operation} from {from:?} to {to:?}")]
    Dimension {
        operation: &'static str,
        from: (usize, usize),
        to: (usize, usize),
    },

    /// The worker pool could not be started
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Reading or writing a state snapshot failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A state snapshot could not be encoded or decoded
    #[error("snapshot is unreadable: {0}")]
    Snapshot(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// True for failures that happen at run time around persisted state
    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Snapshot(_))
    }
}
