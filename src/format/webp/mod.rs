//! WebP container support
//!
//! WebP files are a RIFF envelope (`RIFF`, little-endian size, `WEBP`)
//! followed by back-to-back chunks of a FourCC, a little-endian payload
//! size and the payload. The demuxer does not interpret chunk payloads: each
//! top-level chunk, header included, is emitted as one packet of a single
//! video stream with the codec id `webp`.
//!
//! Timing is fixed rather than derived from the bitstream: the stream uses a
//! millisecond time base, lasts 1000 ms, and every packet carries a duration
//! of 150 with unknown pts/dts.

pub mod anmf;
pub mod demuxer;

pub use demuxer::WebpDemuxer;

use super::io::ByteStream;
use super::probe::{ProbeData, ProbeScore, PROBE_SCORE_MAX};
use super::{ClassCategory, Demuxer, DemuxerClass, FormatFlags, InputFormat};
use crate::error::{Error, Result};
use std::fmt;
use std::io;
use tracing::error;

/// RIFF envelope tag
pub const RIFF_MAGIC: &[u8; 4] = b"RIFF";
/// RIFF form type of WebP files
pub const WEBP_MAGIC: &[u8; 4] = b"WEBP";
/// Animation frame chunk
pub const ANMF_CHUNK: &[u8; 4] = b"ANMF";
/// Alpha channel chunk
pub const ALPH_CHUNK: &[u8; 4] = b"ALPH";

/// Size of the RIFF envelope (tag, size, form type)
pub const RIFF_HEADER_SIZE: u64 = 12;
/// Size of a chunk header (FourCC + size)
pub const CHUNK_HEADER_SIZE: u64 = 8;
/// Largest declared chunk payload accepted
pub const MAX_CHUNK_SIZE: u32 = i32::MAX as u32;

/// Stream time base denominator (1 tick = 1 ms)
pub const TIME_BASE_DEN: i64 = 1000;
/// Declared stream duration in milliseconds
pub const STREAM_DURATION: i64 = 1000;
/// Duration assigned to every packet
pub const PACKET_DURATION: i64 = 150;

/// Codec id of the registered stream
pub const CODEC_ID: &str = "webp";

/// Pack a FourCC the way a little-endian u32 read returns it
pub const fn mktag(tag: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*tag)
}

/// Header of a top-level chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub fourcc: [u8; 4],
    /// Declared payload size, excluding this header
    pub size: u32,
}

impl ChunkHeader {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        ChunkHeader {
            fourcc: [bytes[0], bytes[1], bytes[2], bytes[3]],
            size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn tag(&self) -> u32 {
        u32::from_le_bytes(self.fourcc)
    }

    /// Chunk size including the header, widened so it cannot overflow
    pub fn packet_size(&self) -> u64 {
        CHUNK_HEADER_SIZE + u64::from(self.size)
    }

    /// Reject sizes that do not fit a signed 32-bit length
    pub fn check_size(&self) -> Result<()> {
        if self.size > MAX_CHUNK_SIZE {
            error!("chunk too large {} > {}", self.size, MAX_CHUNK_SIZE);
            return Err(Error::ChunkTooLarge {
                fourcc: self.fourcc_str(),
                size: self.size,
            });
        }
        Ok(())
    }

    /// FourCC as text, non-UTF-8 bytes replaced
    pub fn fourcc_str(&self) -> String {
        String::from_utf8_lossy(&self.fourcc).into_owned()
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} bytes)", self.fourcc_str(), self.size)
    }
}

/// Read a chunk header at the cursor
///
/// Returns `Ok(None)` when the stream is exhausted exactly at the chunk
/// boundary; a header cut short is an `UnexpectedEof` I/O error.
pub fn read_chunk_header<S: ByteStream + ?Sized>(stream: &mut S) -> Result<Option<ChunkHeader>> {
    let mut raw = [0u8; CHUNK_HEADER_SIZE as usize];
    match stream.read_up_to(&mut raw)? {
        0 => Ok(None),
        n if n == raw.len() => Ok(Some(ChunkHeader::from_bytes(raw))),
        n => Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("chunk header truncated after {} bytes", n),
        ))),
    }
}

/// Score how likely `data` is a WebP file
///
/// Returns one below the maximum score when the RIFF tag and the WEBP form
/// type are both present, 0 otherwise.
pub fn probe(data: &ProbeData) -> ProbeScore {
    let riff = data.rb32(0);
    let form = data.rb32(8);
    if riff == Some(u32::from_be_bytes(*RIFF_MAGIC)) && form == Some(u32::from_be_bytes(*WEBP_MAGIC))
    {
        return PROBE_SCORE_MAX - 1;
    }
    0
}

fn create(stream: Box<dyn ByteStream>) -> Box<dyn Demuxer> {
    Box::new(WebpDemuxer::new(stream))
}

/// Class descriptor of the WebP demuxer (no options)
pub static DEMUXER_CLASS: DemuxerClass = DemuxerClass {
    class_name: "WEBP demuxer",
    category: ClassCategory::Demuxer,
    options: &[],
};

/// Format table entry for WebP
pub static WEBP_DEMUXER: InputFormat = InputFormat {
    name: "webp",
    long_name: "WebP",
    extensions: &["webp"],
    mime_types: &["image/webp"],
    flags: FormatFlags {
        generic_index: true,
    },
    priv_class: &DEMUXER_CLASS,
    read_probe: probe,
    create,
};
