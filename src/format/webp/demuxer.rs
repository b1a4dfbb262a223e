//! WebP demuxer implementation

use super::anmf::{self, Disposition, ALPHA_SKIP_ENABLED};
use super::{
    mktag, read_chunk_header, ChunkHeader, CODEC_ID, PACKET_DURATION, RIFF_HEADER_SIZE,
    RIFF_MAGIC, STREAM_DURATION, TIME_BASE_DEN, WEBP_MAGIC,
};
use crate::error::{Error, Result};
use crate::format::io::ByteStream;
use crate::format::probe::{ProbeData, ProbeScore};
use crate::format::{Demuxer, DemuxerContext, IndexEntry, Packet, PacketIndex, Stream, StreamInfo};
use crate::util::{Buffer, MediaType, Rational};
use std::io::{self, Read, Seek};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Header not read yet
    Unopened,
    /// Header read, packets can be read
    Opened,
    /// Input exhausted; only seeking or closing remain
    Finished,
    /// A read, seek or validation failure stopped the demuxer
    Failed,
    Closed,
}

/// Outcome of locating the next chunk
enum Lookahead {
    /// Chunk at `start` is to be emitted; the cursor is back at `start`
    Emit { start: u64, header: ChunkHeader },
    /// Chunk was skipped and the cursor moved past it
    Skipped,
}

/// WebP demuxer
///
/// Emits every top-level chunk after the RIFF envelope, header included, as
/// one packet on stream 0.
pub struct WebpDemuxer<R: Read + Seek> {
    reader: Option<R>,
    context: DemuxerContext,
    index: PacketIndex,
    /// Timestamp the index assigns to the next packet
    next_timestamp: i64,
    state: State,
}

impl<R: Read + Seek> WebpDemuxer<R> {
    /// Create a new WebP demuxer over a stream positioned at the RIFF header
    pub fn new(reader: R) -> Self {
        WebpDemuxer {
            reader: Some(reader),
            context: DemuxerContext::new("webp".to_string()),
            index: PacketIndex::new(),
            next_timestamp: 0,
            state: State::Unopened,
        }
    }

    /// Score a peeked input prefix
    pub fn probe(data: &ProbeData) -> ProbeScore {
        super::probe(data)
    }

    /// Positions of the packets seen so far
    pub fn index(&self) -> &PacketIndex {
        &self.index
    }

    /// Declared duration of the container in stream time_base units
    pub fn duration(&self) -> i64 {
        self.context.duration()
    }

    /// Current offset of the underlying stream
    pub fn position(&mut self) -> Result<u64> {
        self.reader_mut()?.tell()
    }

    /// Release the underlying stream (`None` after `close`)
    pub fn into_inner(self) -> Option<R> {
        self.reader
    }

    fn reader_mut(&mut self) -> Result<&mut R> {
        self.reader
            .as_mut()
            .ok_or_else(|| Error::invalid_state("Demuxer closed"))
    }

    /// Check that packets may be read in the current state
    fn ensure_readable(&self) -> Result<()> {
        match self.state {
            State::Opened => Ok(()),
            State::Finished => Err(Error::EndOfStream),
            State::Unopened => Err(Error::invalid_state("Demuxer not opened")),
            State::Failed => Err(Error::invalid_state(
                "Demuxer stopped after an earlier error",
            )),
            State::Closed => Err(Error::invalid_state("Demuxer closed")),
        }
    }

    /// Record the result of a stream operation in the demuxer state
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {}
            Err(Error::EndOfStream) => self.state = State::Finished,
            Err(_) => self.state = State::Failed,
        }
        result
    }

    /// Validate the RIFF envelope and register the stream
    fn read_header(&mut self) -> Result<()> {
        let reader = self.reader_mut()?;

        let riff = read_envelope_word(reader)?;
        if riff != mktag(RIFF_MAGIC) {
            return Err(Error::format("Missing RIFF signature"));
        }

        // Declared RIFF size; not checked against the real input length
        let riff_size = read_envelope_word(reader)?;

        let form = read_envelope_word(reader)?;
        if form != mktag(WEBP_MAGIC) {
            return Err(Error::format("Missing WEBP signature"));
        }

        let mut info = StreamInfo::new(0, MediaType::Video, CODEC_ID.to_string());
        info.time_base = Rational::new(1, TIME_BASE_DEN);
        info.pts_wrap_bits = 64;
        info.start_time = 0;
        info.duration = STREAM_DURATION;

        self.context.add_stream(Stream::new(info));
        self.context.set_duration(STREAM_DURATION);

        debug!("Opened WebP container (declared RIFF size {})", riff_size);
        Ok(())
    }

    /// Read the chunk at the cursor into a packet and index it
    fn read_chunk(&mut self) -> Result<Packet> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::invalid_state("Demuxer closed"))?;

        let (start, header) = next_chunk(reader)?;

        let data = reader.read_bytes(header.packet_size())?;

        let mut packet = Packet::new_video(0, Buffer::from_vec(data));
        packet.duration = PACKET_DURATION;
        packet.position = start as i64;

        self.index.add(IndexEntry {
            position: start,
            timestamp: self.next_timestamp,
            size: header.packet_size(),
        });
        self.next_timestamp += PACKET_DURATION;

        trace!("Read chunk {} at {}", header, start);
        Ok(packet)
    }

    /// Position the stream on the last chunk whose timestamp is not after `timestamp`
    ///
    /// Chunks past the end of the index are walked (headers only) and indexed
    /// first.
    fn seek_to_timestamp(&mut self, timestamp: i64) -> Result<()> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::invalid_state("Demuxer closed"))?;

        let (mut pos, mut ts) = match self.index.last() {
            Some(last) => (last.end(), last.timestamp + PACKET_DURATION),
            None => (RIFF_HEADER_SIZE, 0),
        };

        while ts <= timestamp {
            reader.seek_exact(pos)?;
            match locate_chunk(reader) {
                Ok(Lookahead::Emit { start, header }) => {
                    self.index.add(IndexEntry {
                        position: start,
                        timestamp: ts,
                        size: header.packet_size(),
                    });
                    pos = start + header.packet_size();
                    ts += PACKET_DURATION;
                }
                Ok(Lookahead::Skipped) => pos = reader.tell()?,
                Err(Error::EndOfStream) => break,
                Err(e) => return Err(e),
            }
        }

        let (target, target_ts) = match self.index.search(timestamp) {
            Some(entry) => (entry.position, entry.timestamp),
            None => (RIFF_HEADER_SIZE, 0),
        };
        reader.seek_exact(target)?;
        self.next_timestamp = target_ts;

        debug!("Seeked to {} (timestamp {})", target, target_ts);
        Ok(())
    }
}

/// Read one word of the RIFF envelope; a short input cannot carry the tags
fn read_envelope_word<S: ByteStream + ?Sized>(stream: &mut S) -> Result<u32> {
    stream.read_u32_le().map_err(|e| match e {
        Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
            Error::format("Truncated RIFF header")
        }
        other => other,
    })
}

/// Read the next chunk header and rewind to the chunk start
///
/// The size limit is enforced before anything past the header is read or
/// any seek is made; a rejected header stays consumed.
fn locate_chunk<S: ByteStream + ?Sized>(stream: &mut S) -> Result<Lookahead> {
    let start = stream.tell()?;

    let header = read_chunk_header(stream)?.ok_or(Error::EndOfStream)?;
    header.check_size()?;

    if ALPHA_SKIP_ENABLED && anmf::inspect_frame(stream, &header)? == Disposition::Skip {
        return Ok(Lookahead::Skipped);
    }

    stream.seek_exact(start)?;
    Ok(Lookahead::Emit { start, header })
}

/// Locate the next chunk to emit, passing over skipped ones
fn next_chunk<S: ByteStream + ?Sized>(stream: &mut S) -> Result<(u64, ChunkHeader)> {
    loop {
        if let Lookahead::Emit { start, header } = locate_chunk(stream)? {
            return Ok((start, header));
        }
    }
}

impl<R: Read + Seek> Demuxer for WebpDemuxer<R> {
    fn format_name(&self) -> &str {
        self.context.format_name()
    }

    fn open(&mut self) -> Result<()> {
        if self.state != State::Unopened {
            return Err(Error::invalid_state("Demuxer already opened"));
        }
        let result = self.read_header();
        self.state = if result.is_ok() {
            State::Opened
        } else {
            State::Failed
        };
        result
    }

    fn streams(&self) -> &[Stream] {
        self.context.streams()
    }

    fn read_packet(&mut self) -> Result<Packet> {
        self.ensure_readable()?;
        let result = self.read_chunk();
        self.track(result)
    }

    fn seek(&mut self, stream_index: usize, timestamp: i64) -> Result<()> {
        match self.state {
            State::Opened | State::Finished => {}
            _ => return self.ensure_readable(),
        }
        if stream_index >= self.context.streams().len() {
            return Err(Error::invalid_input(format!(
                "Invalid stream index {}",
                stream_index
            )));
        }
        if timestamp < 0 {
            return Err(Error::invalid_input(format!(
                "Seek timestamp {} before stream start",
                timestamp
            )));
        }

        let result = self.seek_to_timestamp(timestamp);
        if result.is_ok() {
            self.state = State::Opened;
        }
        self.track(result)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        self.index.clear();
        self.context.clear();
        self.next_timestamp = 0;
        self.state = State::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    /// Cursor whose absolute seeks land one byte short
    struct ShortSeek(Cursor<Vec<u8>>);

    impl Read for ShortSeek {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for ShortSeek {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Start(n) if n > 0 => self.0.seek(SeekFrom::Start(n - 1)),
                other => self.0.seek(other),
            }
        }
    }

    fn container(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut data = b"RIFF\0\0\0\0WEBP".to_vec();
        for (fourcc, payload) in chunks {
            data.extend_from_slice(*fourcc);
            data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            data.extend_from_slice(payload);
        }
        let riff_size = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&riff_size.to_le_bytes());
        data
    }

    fn opened(data: Vec<u8>) -> WebpDemuxer<Cursor<Vec<u8>>> {
        let mut demuxer = WebpDemuxer::new(Cursor::new(data));
        demuxer.open().unwrap();
        demuxer
    }

    #[test]
    fn test_webp_demuxer_creation() {
        let demuxer = WebpDemuxer::new(Cursor::new(Vec::new()));
        assert!(demuxer.streams().is_empty());
        assert!(demuxer.index().is_empty());
        assert_eq!(demuxer.format_name(), "webp");
    }

    #[test]
    fn test_open_registers_single_stream() {
        let mut demuxer = opened(container(&[(b"VP8L", &[0x2f, 0, 0, 0])]));

        assert_eq!(demuxer.streams().len(), 1);
        let info = &demuxer.streams()[0].info;
        assert_eq!(info.index, 0);
        assert_eq!(info.media_type, MediaType::Video);
        assert_eq!(info.codec_id, "webp");
        assert_eq!(info.time_base, Rational::new(1, 1000));
        assert_eq!(info.start_time, 0);
        assert_eq!(info.duration, 1000);
        assert_eq!(demuxer.duration(), 1000);
        assert_eq!(demuxer.position().unwrap(), 12);
    }

    #[test]
    fn test_open_ignores_declared_size() {
        let mut data = container(&[(b"VP8 ", &[1, 2])]);
        data[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        let mut demuxer = opened(data);
        assert_eq!(demuxer.read_packet().unwrap().size(), 10);
    }

    #[test]
    fn test_open_rejects_bad_tags() {
        for bad in [&b"RIFX\0\0\0\0WEBP"[..], b"RIFF\0\0\0\0WAVE", b"RIFF\0\0"] {
            let mut demuxer = WebpDemuxer::new(Cursor::new(bad.to_vec()));
            match demuxer.open() {
                Err(Error::Format(_)) => {}
                other => panic!("expected format error for {:?}, got {:?}", bad, other),
            }
            assert!(demuxer.streams().is_empty());
            assert!(matches!(demuxer.read_packet(), Err(Error::InvalidState(_))));
        }
    }

    #[test]
    fn test_open_twice() {
        let mut demuxer = opened(container(&[]));
        assert!(matches!(demuxer.open(), Err(Error::InvalidState(_))));
        assert_eq!(demuxer.streams().len(), 1);
    }

    #[test]
    fn test_read_before_open() {
        let mut demuxer = WebpDemuxer::new(Cursor::new(container(&[])));
        assert!(matches!(demuxer.read_packet(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_packet_is_verbatim_chunk() {
        let mut demuxer = opened(container(&[(b"VP8 ", b"abcdef")]));

        let packet = demuxer.read_packet().unwrap();
        assert_eq!(packet.data.as_slice(), b"VP8 \x06\0\0\0abcdef");
        assert_eq!(packet.stream_index, 0);
        assert_eq!(packet.codec_type, MediaType::Video);
        assert_eq!(packet.duration, 150);
        assert!(!packet.pts.is_valid());
        assert!(!packet.dts.is_valid());
        assert_eq!(packet.position, 12);
        assert_eq!(demuxer.position().unwrap(), 26);
    }

    #[test]
    fn test_consecutive_chunks_and_eof() {
        let mut demuxer = opened(container(&[
            (b"VP8X", &[0u8; 10]),
            (b"ANIM", &[0u8; 6]),
            (b"ANMF", &[7u8; 3]),
        ]));

        let sizes: Vec<(usize, i64)> = (0..3)
            .map(|_| {
                let p = demuxer.read_packet().unwrap();
                (p.size(), p.position)
            })
            .collect();
        assert_eq!(sizes, vec![(18, 12), (14, 30), (11, 44)]);

        assert!(demuxer.read_packet().unwrap_err().is_eof());
        assert!(demuxer.read_packet().unwrap_err().is_eof());
        assert_eq!(demuxer.index().len(), 3);
    }

    #[test]
    fn test_zero_size_chunk() {
        let mut demuxer = opened(container(&[(b"EXIF", &[]), (b"XMP ", &[1])]));
        assert_eq!(demuxer.read_packet().unwrap().data.as_slice(), b"EXIF\0\0\0\0");
        assert_eq!(demuxer.read_packet().unwrap().size(), 9);
    }

    #[test]
    fn test_oversized_chunk_rejected_before_payload() {
        let mut data = container(&[]);
        data.extend_from_slice(b"VP8 ");
        data.extend_from_slice(&0x8000_0000u32.to_le_bytes());
        let mut demuxer = opened(data);

        match demuxer.read_packet() {
            Err(Error::ChunkTooLarge { size, .. }) => assert_eq!(size, 0x8000_0000),
            other => panic!("expected ChunkTooLarge, got {:?}", other),
        }
        // Header consumed, cursor not rewound
        assert_eq!(demuxer.position().unwrap(), 20);
        assert!(matches!(demuxer.read_packet(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = container(&[]);
        data.extend_from_slice(b"VP8L");
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 10]);
        let mut demuxer = opened(data);

        let err = demuxer.read_packet().unwrap_err();
        assert!(err.is_io_failure(), "unexpected error {:?}", err);
        assert!(demuxer.index().is_empty());
    }

    #[test]
    fn test_truncated_chunk_header() {
        let mut data = container(&[(b"VP8 ", &[1])]);
        data.extend_from_slice(b"EXI");
        let mut demuxer = opened(data);

        demuxer.read_packet().unwrap();
        assert!(demuxer.read_packet().unwrap_err().is_io_failure());
    }

    #[test]
    fn test_seek_back_must_land_exactly() {
        let data = container(&[(b"VP8 ", &[1, 2, 3])]);
        let mut demuxer = WebpDemuxer::new(ShortSeek(Cursor::new(data)));
        demuxer.open().unwrap();

        match demuxer.read_packet() {
            Err(Error::SeekMismatch { requested, landed }) => {
                assert_eq!((requested, landed), (12, 11));
            }
            other => panic!("expected SeekMismatch, got {:?}", other),
        }
        assert!(matches!(demuxer.read_packet(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_seek_within_index() {
        let mut demuxer = opened(container(&[
            (b"VP8X", &[0u8; 10]),
            (b"ANIM", &[0u8; 6]),
            (b"ANMF", &[7u8; 3]),
        ]));
        for _ in 0..3 {
            demuxer.read_packet().unwrap();
        }
        assert!(demuxer.read_packet().unwrap_err().is_eof());

        demuxer.seek(0, 200).unwrap();
        let packet = demuxer.read_packet().unwrap();
        assert_eq!(packet.position, 30);
        assert_eq!(&packet.data.as_slice()[..4], b"ANIM");

        demuxer.seek(0, 0).unwrap();
        assert_eq!(demuxer.read_packet().unwrap().position, 12);
        assert_eq!(demuxer.index().len(), 3);
    }

    #[test]
    fn test_seek_past_index_walks_forward() {
        let mut demuxer = opened(container(&[
            (b"VP8X", &[0u8; 10]),
            (b"ANIM", &[0u8; 6]),
            (b"ANMF", &[7u8; 3]),
        ]));

        demuxer.seek(0, 300).unwrap();
        assert_eq!(demuxer.index().len(), 3);
        assert_eq!(demuxer.read_packet().unwrap().position, 44);

        demuxer.seek(0, 10_000).unwrap();
        assert_eq!(demuxer.read_packet().unwrap().position, 44);
        assert!(demuxer.read_packet().unwrap_err().is_eof());
    }

    #[test]
    fn test_seek_empty_container() {
        let mut demuxer = opened(container(&[]));
        demuxer.seek(0, 150).unwrap();
        assert_eq!(demuxer.position().unwrap(), 12);
        assert!(demuxer.read_packet().unwrap_err().is_eof());
    }

    #[test]
    fn test_seek_rejects_bad_arguments() {
        let mut demuxer = opened(container(&[(b"VP8 ", &[1])]));
        assert!(matches!(demuxer.seek(1, 0), Err(Error::InvalidInput(_))));
        assert!(matches!(demuxer.seek(0, -1), Err(Error::InvalidInput(_))));
        // Still usable
        assert_eq!(demuxer.read_packet().unwrap().position, 12);
    }

    #[test]
    fn test_close() {
        let mut demuxer = opened(container(&[(b"VP8 ", &[1])]));
        demuxer.close().unwrap();
        assert!(demuxer.streams().is_empty());
        assert!(matches!(demuxer.read_packet(), Err(Error::InvalidState(_))));
        assert!(matches!(demuxer.seek(0, 0), Err(Error::InvalidState(_))));
        assert!(demuxer.into_inner().is_none());
    }

    #[test]
    fn test_probe_matches_format_table() {
        let data = ProbeData::new(container(&[]));
        assert_eq!(WebpDemuxer::<Cursor<Vec<u8>>>::probe(&data), 99);
    }
}
