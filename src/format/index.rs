//! Generic packet index
//!
//! Formats without an index of their own record where each emitted packet
//! started, so the demuxer can seek back to any packet it has already seen
//! (or walked past) without rescanning from the start of the input.

/// One indexed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Byte offset of the packet in the input
    pub position: u64,
    /// Timestamp in stream time_base units
    pub timestamp: i64,
    /// Packet size in bytes
    pub size: u64,
}

impl IndexEntry {
    /// Offset just past the end of this packet
    pub fn end(&self) -> u64 {
        self.position + self.size
    }
}

/// Packet index ordered by byte position
#[derive(Debug, Clone, Default)]
pub struct PacketIndex {
    entries: Vec<IndexEntry>,
}

impl PacketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, keeping the index sorted by position
    ///
    /// Re-adding a known position replaces the old entry, so packets read
    /// again after a seek do not duplicate.
    pub fn add(&mut self, entry: IndexEntry) {
        match self
            .entries
            .binary_search_by_key(&entry.position, |e| e.position)
        {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Last entry whose timestamp is not after `timestamp`
    pub fn search(&self, timestamp: i64) -> Option<&IndexEntry> {
        let upper = self.entries.partition_point(|e| e.timestamp <= timestamp);
        upper.checked_sub(1).map(|i| &self.entries[i])
    }

    pub fn last(&self) -> Option<&IndexEntry> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
