//! Demuxer for reading container formats

use super::io::ByteStream;
use super::probe::{ProbeData, PROBE_BUFFER_SIZE};
use super::{probe_input, Packet, Stream};
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::debug;

/// Demuxer trait for reading container formats
///
/// A demuxer owns its byte stream. `open` reads the container header and
/// registers the streams; `read_packet` is then called until it returns
/// [`Error::EndOfStream`] or another error.
pub trait Demuxer {
    /// Short name of the container format
    fn format_name(&self) -> &str;

    /// Read the container header and register streams
    fn open(&mut self) -> Result<()>;

    /// Get the list of streams in this container
    fn streams(&self) -> &[Stream];

    /// Read the next packet
    fn read_packet(&mut self) -> Result<Packet>;

    /// Seek to a specific timestamp (in stream time_base units)
    fn seek(&mut self, stream_index: usize, timestamp: i64) -> Result<()>;

    /// Close the demuxer
    fn close(&mut self) -> Result<()>;
}

/// Context for demuxing operations
#[derive(Debug, Clone)]
pub struct DemuxerContext {
    streams: Vec<Stream>,
    format_name: String,
    duration: i64,
}

impl DemuxerContext {
    /// Create a new demuxer context
    pub fn new(format_name: String) -> Self {
        DemuxerContext {
            streams: Vec::new(),
            format_name,
            duration: 0,
        }
    }

    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Register a stream, returning its index
    pub fn add_stream(&mut self, stream: Stream) -> usize {
        self.streams.push(stream);
        self.streams.len() - 1
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: i64) {
        self.duration = duration;
    }

    /// Drop all registered streams
    pub fn clear(&mut self) {
        self.streams.clear();
        self.duration = 0;
    }
}

/// Probe a byte stream, pick the best matching format and open it
///
/// The probe buffer is peeked; the stream is handed to the demuxer with its
/// cursor where it was found.
pub fn open_input<R>(reader: R, filename: Option<&str>) -> Result<Box<dyn Demuxer>>
where
    R: Read + Seek + 'static,
{
    let mut stream: Box<dyn ByteStream> = Box::new(reader);

    let mut probe = ProbeData::peek(&mut *stream, PROBE_BUFFER_SIZE)?;
    if let Some(name) = filename {
        probe = probe.with_filename(name);
    }

    let (format, score) = probe_input(&probe).ok_or_else(|| {
        Error::unsupported(format!(
            "No demuxer recognised input{}",
            filename.map(|f| format!(" '{}'", f)).unwrap_or_default()
        ))
    })?;
    debug!("Probed input as {} (score {})", format.name, score);

    let mut demuxer = (format.create)(stream);
    demuxer.open()?;
    Ok(demuxer)
}

/// Create a demuxer for the given file
pub fn create_demuxer(path: &Path) -> Result<Box<dyn Demuxer>> {
    let file = File::open(path)?;
    let name = path.to_string_lossy();
    open_input(BufReader::new(file), Some(&name))
}
