//! Error types for zvd-webp

use thiserror::Error;

/// Result type alias for zvd-webp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zvd-webp
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (short read or failure reported by the byte stream)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Seek landed somewhere other than the requested offset
    #[error("Seek to {requested} landed at {landed}")]
    SeekMismatch { requested: u64, landed: u64 },

    /// Format error (magic tag mismatch)
    #[error("Format error: {0}")]
    Format(String),

    /// Declared chunk size above i32::MAX
    #[error("Chunk '{fourcc}' too large: {size} > {}", i32::MAX)]
    ChunkTooLarge { fourcc: String, size: u32 },

    /// Packet buffer could not be allocated
    #[error("Out of memory allocating {size} bytes")]
    OutOfMemory { size: u64 },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// End of stream
    #[error("End of stream")]
    EndOfStream,

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

impl Error {
    /// Create a format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    /// True for failures of the underlying byte stream (reads and seeks)
    pub fn is_io_failure(&self) -> bool {
        matches!(self, Error::Io(_) | Error::SeekMismatch { .. })
    }

    /// True if this error marks the natural end of the input
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }
}
