//! Container format handling (demuxing)
//!
//! Every supported container registers an [`InputFormat`] in the format
//! table. Hosts probe a peeked prefix of the input against the table, create
//! the best-scoring demuxer and drive it through the [`Demuxer`] trait.

pub mod demuxer;
pub mod index;
pub mod io;
pub mod packet;
pub mod probe;
pub mod stream;
pub mod webp;

pub use demuxer::{create_demuxer, open_input, Demuxer, DemuxerContext};
pub use index::{IndexEntry, PacketIndex};
pub use io::{ByteStream, SavedPosition, READ_STEP};
pub use packet::{Packet, PacketFlags};
pub use probe::{ProbeData, ProbeScore, PROBE_BUFFER_SIZE, PROBE_SCORE_MAX};
pub use stream::{Stream, StreamInfo};

/// Format capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags {
    /// The demuxer builds a generic index of packet positions for seeking
    pub generic_index: bool,
}

/// Category a demuxer class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassCategory {
    Demuxer,
    Muxer,
}

/// A tunable option exposed by a demuxer class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOption {
    pub name: &'static str,
    pub help: &'static str,
}

/// Option table and identity of a demuxer
#[derive(Debug)]
pub struct DemuxerClass {
    pub class_name: &'static str,
    pub category: ClassCategory,
    pub options: &'static [FormatOption],
}

/// A registered input (demuxer) format
pub struct InputFormat {
    /// Short name (e.g., "webp")
    pub name: &'static str,
    /// Long/descriptive name
    pub long_name: &'static str,
    /// File extensions
    pub extensions: &'static [&'static str],
    /// MIME types
    pub mime_types: &'static [&'static str],
    pub flags: FormatFlags,
    pub priv_class: &'static DemuxerClass,
    /// Score a peeked prefix of the input
    pub read_probe: fn(&ProbeData) -> ProbeScore,
    /// Build a demuxer over a byte stream
    pub create: fn(Box<dyn ByteStream>) -> Box<dyn Demuxer>,
}

impl InputFormat {
    /// Options accepted by this format's demuxer
    pub fn options(&self) -> &'static [FormatOption] {
        self.priv_class.options
    }

    /// Look up an option by name
    pub fn find_option(&self, name: &str) -> Option<&'static FormatOption> {
        self.priv_class.options.iter().find(|opt| opt.name == name)
    }
}

impl std::fmt::Debug for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFormat")
            .field("name", &self.name)
            .field("long_name", &self.long_name)
            .field("flags", &self.flags)
            .finish()
    }
}

static DEMUXERS: &[&InputFormat] = &[&webp::WEBP_DEMUXER];

/// All registered input formats
pub fn demuxer_list() -> &'static [&'static InputFormat] {
    DEMUXERS
}

/// Find a registered input format by short name
pub fn find_input_format(name: &str) -> Option<&'static InputFormat> {
    DEMUXERS.iter().copied().find(|fmt| fmt.name == name)
}

/// Probe the input against every registered format
///
/// Returns the highest scoring format; the first registered wins ties.
/// `None` if no format scored above zero.
pub fn probe_input(data: &ProbeData) -> Option<(&'static InputFormat, ProbeScore)> {
    let mut best: Option<(&'static InputFormat, ProbeScore)> = None;
    for &format in DEMUXERS {
        let score = (format.read_probe)(data);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((format, score));
        }
    }
    best
}

/// Detect format from file extension
pub fn detect_format_from_extension(path: &str) -> Option<&'static str> {
    let (_, ext) = path.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    DEMUXERS
        .iter()
        .find(|fmt| fmt.extensions.contains(&ext.as_str()))
        .map(|fmt| fmt.name)
}
