//! ZVD WebP - WebP container demuxing for the ZVD multimedia framework
//!
//! A WebP file is a RIFF envelope holding a sequence of chunks. This crate
//! recognises such files, validates the envelope and hands every top-level
//! chunk back verbatim as a packet of a single video stream. Decoding the
//! chunk payloads is left to codec implementations.
//!
//! # Architecture
//!
//! - `format`: Format table, probing, the [`format::Demuxer`] trait and the
//!   WebP demuxer
//! - `util`: Common utilities and data structures (buffers, rationals,
//!   timestamps)
//! - `error`: Error type shared by every module
//!
//! # Example
//!
//! ```no_run
//! use zvd_webp::format::create_demuxer;
//! use std::path::Path;
//!
//! let mut demuxer = create_demuxer(Path::new("image.webp"))?;
//! loop {
//!     match demuxer.read_packet() {
//!         Ok(packet) => println!("{}", packet),
//!         Err(e) if e.is_eof() => break,
//!         Err(e) => return Err(e),
//!     }
//! }
//! # Ok::<(), zvd_webp::Error>(())
//! ```

pub mod error;
pub mod format;
pub mod util;

pub use error::{Error, Result};

use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the library
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize the library with the given configuration
///
/// Installs a `tracing` subscriber when logging is requested. `RUST_LOG`
/// overrides the level chosen by the flags. Calling this again once a global
/// subscriber exists is an [`Error::Init`].
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| Error::Init(format!("Failed to initialize logging: {}", e)))?;
    }

    Ok(())
}
