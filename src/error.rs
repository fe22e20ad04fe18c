//! Shredding error types
//!
//! Every error here is non-recoverable: shredding is a single forward pass
//! over a stream that cannot be rewound cheaply, so the run aborts on the
//! first failure. Rows already delivered to sinks remain valid.

use std::io;
use thiserror::Error;

/// Result type for shredding operations.
pub type ShredResult<T> = Result<T, ShredError>;

/// Errors that can abort a shredding run.
#[derive(Debug, Error)]
pub enum ShredError {
    /// An element name passed the known-table pre-filter but the catalog
    /// lookup failed. Indicates a schema/document mismatch.
    #[error("unknown table: {table}")]
    UnknownTable { table: String },

    /// An attribute or synthetic column has no ordinal in its table's
    /// column list.
    #[error("unresolved column {column} in table {table}")]
    UnresolvedColumn { table: String, column: String },

    /// End of input was reached while rows were still open: an element was
    /// opened but its closing transition was never observed.
    #[error("unexpected end of document with {open_rows} row(s) still open")]
    UnexpectedEndOfDocument { open_rows: usize },

    /// The underlying cursor reported an XML syntax error.
    #[error("malformed input at byte {position}: {message}")]
    Malformed { message: String, position: usize },

    /// The run was cancelled through its [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::flatten::CancelToken
    #[error("shredding cancelled")]
    Cancelled,

    /// I/O failure while reading input or writing to a sink.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ShredError {
    /// Build a `Malformed` error from a message and input byte position.
    pub fn malformed(message: impl Into<String>, position: usize) -> Self {
        ShredError::Malformed {
            message: message.into(),
            position,
        }
    }
}
