use std::io;

use thiserror::Error;

/// Errors produced by a [`SynchronizedWriter`][crate::SynchronizedWriter].
///
/// Only [`WriterError::Resource`] escapes from construction. Everything
/// else happens on an already open writer and is reported through the
/// `log` facade instead of being handed to the calling worker.
#[derive(Debug, Error)]
pub enum WriterError {
    /// The log target could not be opened, or its header record could
    /// not be written.
    #[error("failed to open log target '{target}': {source}")]
    Resource {
        /// A human-readable description of the target.
        target: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Writing a record to the open target failed.
    #[error("failed to write record {counter}: {source}")]
    Write {
        /// The counter value assigned to the lost record.
        counter: u64,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A record was requested after the writer was closed.
    #[error("log target is already closed")]
    Closed,

    /// Flushing the target while releasing it failed.
    #[error("failed to close log target '{target}': {source}")]
    Close {
        /// A human-readable description of the target.
        target: String,
        /// The underlying I/O error.
        source: io::Error,
    },
}
