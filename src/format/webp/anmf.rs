//! Animation frame lookahead
//!
//! Some encoders emit ANMF frames whose first sub-chunk is an ALPH chunk.
//! With the `anmf-alpha-skip` feature the demuxer drops those frames instead
//! of emitting them. The feature is off by default, in which case every
//! chunk is emitted unchanged.
//!
//! ANMF payload layout: 16 bytes of frame parameters (offsets, size,
//! duration, flags) followed by the frame's sub-chunks.

use super::{ChunkHeader, ALPH_CHUNK, ANMF_CHUNK, CHUNK_HEADER_SIZE};
use crate::error::Result;
use crate::format::io::{ByteStream, SavedPosition};
use std::io::{Read, Seek};
use tracing::debug;

/// Whether ANMF frames led by an ALPH sub-chunk are skipped
pub const ALPHA_SKIP_ENABLED: bool = cfg!(feature = "anmf-alpha-skip");

/// Bytes of frame parameters before the first sub-chunk of an ANMF payload
pub const ANMF_FRAME_HEADER_SIZE: u64 = 16;

/// What to do with the chunk under inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Emit the chunk as a packet; the cursor is back where it was
    Emit,
    /// The chunk was skipped; the cursor is past its end
    Skip,
}

/// Decide whether the chunk whose header was just read should be skipped
///
/// `stream` must sit right after `header`. On [`Disposition::Emit`] the
/// cursor is restored to that position. On [`Disposition::Skip`] it is moved
/// to the end of the chunk; a seek that does not land there is an error.
pub fn inspect_frame<S>(stream: &mut S, header: &ChunkHeader) -> Result<Disposition>
where
    S: Read + Seek + ?Sized,
{
    if header.fourcc != *ANMF_CHUNK {
        return Ok(Disposition::Emit);
    }
    let payload = u64::from(header.size);
    if payload < ANMF_FRAME_HEADER_SIZE + 4 {
        return Ok(Disposition::Emit);
    }

    let mut mark = SavedPosition::new(stream)?;
    let payload_start = mark.position();

    mark.skip(ANMF_FRAME_HEADER_SIZE)?;
    let mut subchunk = [0u8; 4];
    if mark.read_up_to(&mut subchunk)? < subchunk.len() || subchunk != *ALPH_CHUNK {
        mark.restore()?;
        return Ok(Disposition::Emit);
    }

    debug!(
        "Skipping ANMF frame with leading ALPH at {}",
        payload_start - CHUNK_HEADER_SIZE
    );
    mark.seek_exact(payload_start + payload)?;
    mark.commit();
    Ok(Disposition::Skip)
}
