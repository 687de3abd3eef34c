//! Error types shared across modules.
//!
//! None of these cross the playback controller: output errors are turned into
//! play-failure reasons before the controller sees them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the audio output backend.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no audio output device")]
    NoDevice,

    #[error("no source loaded")]
    NoSource,

    #[error("unsupported source locator: {0}")]
    UnsupportedSource(String),

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// Failures while loading library records.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid library manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate album id {0}")]
    DuplicateAlbumId(u64),

    #[error("duplicate song id {0}")]
    DuplicateSongId(u64),
}
