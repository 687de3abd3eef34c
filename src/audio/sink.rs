//! Utilities for creating `rodio` sinks from source locators.
//!
//! The helpers here resolve a locator to a file, open and decode it, and
//! prepare a paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::OutputError;
use crate::library::SourceRef;

/// Map a locator to a local file.
///
/// With a `media_root`, relative locators and root-relative ones that do not
/// exist on their own (`/songs/a.mp3` as a media server publishes it) are
/// looked up under that root.
pub(super) fn resolve_source(
    source: &SourceRef,
    media_root: Option<&Path>,
) -> Result<PathBuf, OutputError> {
    let path = source
        .local_path()
        .ok_or_else(|| OutputError::UnsupportedSource(source.to_string()))?;

    match media_root {
        Some(root) if path.is_relative() || !path.exists() => {
            let rel = path.strip_prefix("/").unwrap_or(&path);
            Ok(root.join(rel))
        }
        _ => Ok(path),
    }
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
///
/// Also returns the decoder's idea of the total length, if it has one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), OutputError> {
    let file = File::open(path).map_err(|source| OutputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|source| OutputError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let total = decoder.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}

/// Read the track length from tags when the decoder cannot report it.
pub(super) fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|d| !d.is_zero())
}
