//! Common test utilities for the WebP integration tests
//!
//! Builders for RIFF/WebP byte images and helpers for draining demuxers.

#![allow(dead_code)]

use zvd_webp::format::{Demuxer, Packet};
use zvd_webp::Result;

// ============================================================================
// Container Construction
// ============================================================================

/// Builds a WebP byte image chunk by chunk
#[derive(Debug, Clone, Default)]
pub struct WebpBuilder {
    chunks: Vec<u8>,
    riff_size: Option<u32>,
}

impl WebpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk whose declared size matches its payload
    pub fn chunk(mut self, fourcc: &[u8; 4], payload: &[u8]) -> Self {
        self.chunks.extend_from_slice(fourcc);
        self.chunks
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.chunks.extend_from_slice(payload);
        self
    }

    /// Append only a chunk header, declaring `size` payload bytes
    pub fn header_only(mut self, fourcc: &[u8; 4], size: u32) -> Self {
        self.chunks.extend_from_slice(fourcc);
        self.chunks.extend_from_slice(&size.to_le_bytes());
        self
    }

    /// Append raw bytes after the last chunk
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.chunks.extend_from_slice(bytes);
        self
    }

    /// Override the declared RIFF size
    pub fn riff_size(mut self, size: u32) -> Self {
        self.riff_size = Some(size);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let size = self
            .riff_size
            .unwrap_or(4 + self.chunks.len() as u32);

        let mut data = Vec::with_capacity(12 + self.chunks.len());
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(b"WEBP");
        data.extend_from_slice(&self.chunks);
        data
    }
}

/// A lossy still image: VP8 chunk with a 10-byte key frame header
pub fn simple_lossy() -> Vec<u8> {
    WebpBuilder::new()
        .chunk(
            b"VP8 ",
            &[0x30, 0x01, 0x00, 0x9d, 0x01, 0x2a, 0x01, 0x00, 0x01, 0x00],
        )
        .build()
}

/// An extended-format animation: VP8X, ANIM and two ANMF frames
pub fn animated() -> Vec<u8> {
    let mut frame = vec![0u8; 16];
    frame.extend_from_slice(b"VP8L");
    frame.extend_from_slice(&5u32.to_le_bytes());
    frame.extend_from_slice(&[0x2f, 0, 0, 0, 0]);

    WebpBuilder::new()
        .chunk(b"VP8X", &[0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0])
        .chunk(b"ANIM", &[0xff, 0xff, 0xff, 0xff, 0, 0])
        .chunk(b"ANMF", &frame)
        .chunk(b"ANMF", &frame)
        .build()
}

// ============================================================================
// Demuxer Helpers
// ============================================================================

/// Read packets until end of stream, surfacing any other error
pub fn drain(demuxer: &mut dyn Demuxer) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    loop {
        match demuxer.read_packet() {
            Ok(packet) => packets.push(packet),
            Err(e) if e.is_eof() => return Ok(packets),
            Err(e) => return Err(e),
        }
    }
}

/// FourCC of a packet holding a whole chunk
pub fn fourcc(packet: &Packet) -> &[u8] {
    &packet.data.as_slice()[..4]
}
