//! Error types for the YXDB codec.

use std::fmt;
use std::io;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for YXDB encode and decode operations.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred.
    Io(io::Error),

    /// A region of the file did not match the format: truncation, an
    /// over-read, leftover bytes, or a pointer that contradicts another.
    Corruption(String),

    /// The embedded schema document is malformed.
    Schema(String),

    /// An LZF miniblock payload could not be decompressed.
    Decompression(String),

    /// An invalid argument was provided by the caller.
    InvalidArgument(String),

    /// A feature or function is not yet implemented.
    NotImplemented(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    /// Creates a new decompression error.
    pub fn decompression(msg: impl Into<String>) -> Self {
        Error::Decompression(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a new not implemented error.
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Error::NotImplemented(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Corruption(msg) => write!(f, "Data corruption: {}", msg),
            Error::Schema(msg) => write!(f, "Schema error: {}", msg),
            Error::Decompression(msg) => write!(f, "Decompression error: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Schema(err.to_string())
    }
}
