//! Input format probing
//!
//! A probe inspects a peeked prefix of the input and returns a confidence
//! score between 0 (not this format) and [`PROBE_SCORE_MAX`].

use super::io::ByteStream;
use crate::error::Result;

/// Probe confidence score
pub type ProbeScore = u32;

/// Score for an exact magic-number match
pub const PROBE_SCORE_MAX: ProbeScore = 100;

/// Number of bytes peeked from the input before probing
pub const PROBE_BUFFER_SIZE: usize = 2048;

/// Peeked input handed to a format's probe function
#[derive(Debug, Clone, Default)]
pub struct ProbeData {
    /// File name, if the input came from one
    pub filename: Option<String>,
    /// First bytes of the input
    pub buf: Vec<u8>,
}

impl ProbeData {
    pub fn new(buf: Vec<u8>) -> Self {
        ProbeData {
            filename: None,
            buf,
        }
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Big-endian u32 at `offset`, `None` if the buffer is too short
    pub fn rb32(&self, offset: usize) -> Option<u32> {
        let bytes = self.buf.get(offset..offset.checked_add(4)?)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read up to `max` bytes from the current position and seek back
    ///
    /// The stream cursor is left where it was found.
    pub fn peek<S: ByteStream + ?Sized>(stream: &mut S, max: usize) -> Result<Self> {
        let start = stream.tell()?;
        let mut buf = vec![0u8; max];
        let filled = stream.read_up_to(&mut buf)?;
        buf.truncate(filled);
        stream.seek_exact(start)?;
        Ok(ProbeData::new(buf))
    }
}
