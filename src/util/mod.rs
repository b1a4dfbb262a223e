//! Common utilities and data structures

pub mod buffer;
pub mod rational;
pub mod timestamp;

pub use buffer::Buffer;
pub use rational::Rational;
pub use timestamp::{TimeBase, Timestamp};

use std::fmt;

/// Common media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Video stream (still images and animations included)
    Video,
    /// Unknown stream type
    Unknown,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Unknown => write!(f, "unknown"),
        }
    }
}
