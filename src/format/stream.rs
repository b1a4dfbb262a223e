//! Stream (track) descriptors

use crate::util::{MediaType, Rational};

/// Information about a media stream
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream index
    pub index: usize,

    /// Media type
    pub media_type: MediaType,

    /// Codec identifier
    pub codec_id: String,

    /// Time base for this stream
    pub time_base: Rational,

    /// Number of bits after which timestamps wrap
    pub pts_wrap_bits: u32,

    /// Start time in time_base units
    pub start_time: i64,

    /// Duration in time_base units
    pub duration: i64,
}

impl StreamInfo {
    /// Create a new stream info
    pub fn new(index: usize, media_type: MediaType, codec_id: String) -> Self {
        StreamInfo {
            index,
            media_type,
            codec_id,
            time_base: Rational::new(1, 90000), // Default to 90kHz
            pts_wrap_bits: 33,
            start_time: 0,
            duration: 0,
        }
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.duration as f64 * self.time_base.to_f64()
    }
}

/// A media stream
#[derive(Debug, Clone)]
pub struct Stream {
    /// Stream information
    pub info: StreamInfo,
}

impl Stream {
    /// Create a new stream
    pub fn new(info: StreamInfo) -> Self {
        Stream { info }
    }
}
