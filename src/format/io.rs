//! Byte-stream access used by demuxers
//!
//! Any `Read + Seek` source (files, `BufReader`, `Cursor<Vec<u8>>`) is a
//! [`ByteStream`]. The extension methods map stream failures onto
//! [`Error::Io`] and check that absolute seeks land where they were asked to.

use crate::error::{Error, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

/// Largest buffer growth made by [`ByteStream::read_bytes`] before the bytes
/// to fill it have arrived
pub const READ_STEP: u64 = 1 << 20;

/// Reads and cursor movement over a seekable byte source
pub trait ByteStream: Read + Seek {
    /// Current absolute offset
    fn tell(&mut self) -> Result<u64> {
        Ok(self.stream_position()?)
    }

    /// Seek to an absolute offset, returning where the stream landed
    fn seek_to(&mut self, offset: u64) -> Result<u64> {
        Ok(self.seek(SeekFrom::Start(offset))?)
    }

    /// Seek to an absolute offset, failing unless the stream lands exactly there
    fn seek_exact(&mut self, offset: u64) -> Result<()> {
        let landed = self.seek_to(offset)?;
        if landed != offset {
            return Err(Error::SeekMismatch {
                requested: offset,
                landed,
            });
        }
        Ok(())
    }

    /// Advance the cursor by `count` bytes, returning the new offset
    fn skip(&mut self, count: u64) -> Result<u64> {
        let count = i64::try_from(count)
            .map_err(|_| Error::invalid_input(format!("Skip of {} bytes out of range", count)))?;
        Ok(self.seek(SeekFrom::Current(count))?)
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        Ok(self.read_u32::<LittleEndian>()?)
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        Ok(self.read_u32::<BigEndian>()?)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        Ok(self.read_u16::<LittleEndian>()?)
    }

    fn read_u16_be(&mut self) -> Result<u16> {
        Ok(self.read_u16::<BigEndian>()?)
    }

    /// Fill as much of `buf` as the stream can provide, stopping only at EOF
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }

    /// Read exactly `len` bytes into a newly allocated buffer
    ///
    /// The buffer grows by at most [`READ_STEP`] bytes ahead of the data
    /// actually read, so a declared length larger than the input costs no
    /// more than one step. Allocation failure is reported as
    /// [`Error::OutOfMemory`]; fewer than `len` bytes remaining is an
    /// `UnexpectedEof` I/O error.
    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut remaining = len;

        while remaining > 0 {
            let step = remaining.min(READ_STEP);
            data.try_reserve_exact(step as usize)
                .map_err(|_| Error::OutOfMemory { size: len })?;

            let read = Read::take(&mut *self, step).read_to_end(&mut data)?;
            if (read as u64) < step {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, stream ended after {}", len, data.len()),
                )));
            }
            remaining -= step;
        }

        Ok(data)
    }
}

impl<T: Read + Seek + ?Sized> ByteStream for T {}

/// Scoped hold on a stream position
///
/// Records the cursor on creation. [`SavedPosition::restore`] seeks back with
/// an exact-landing check, [`SavedPosition::commit`] keeps wherever the cursor
/// has moved to. Dropping an uncommitted guard makes a best-effort rewind.
pub struct SavedPosition<'a, S: Read + Seek + ?Sized> {
    stream: &'a mut S,
    position: u64,
    armed: bool,
}

impl<'a, S: Read + Seek + ?Sized> SavedPosition<'a, S> {
    pub fn new(stream: &'a mut S) -> Result<Self> {
        let position = stream.tell()?;
        Ok(SavedPosition {
            stream,
            position,
            armed: true,
        })
    }

    /// Offset recorded when the guard was taken
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek back to the recorded offset
    pub fn restore(mut self) -> Result<()> {
        self.armed = false;
        self.stream.seek_exact(self.position)
    }

    /// Keep the current cursor and release the guard
    pub fn commit(mut self) -> u64 {
        self.armed = false;
        self.position
    }
}

impl<S: Read + Seek + ?Sized> Deref for SavedPosition<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.stream
    }
}

impl<S: Read + Seek + ?Sized> DerefMut for SavedPosition<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.stream
    }
}

impl<S: Read + Seek + ?Sized> Drop for SavedPosition<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.stream.seek(SeekFrom::Start(self.position));
        }
    }
}
