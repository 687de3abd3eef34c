use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::player::Playlist;

pub type TrackId = u64;
pub type AlbumId = u64;

/// Opaque locator for playable media or cover art.
///
/// Library code only ever hands these through; the audio backend decides
/// which forms it can open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path for plain paths and `file://` URLs.
    ///
    /// Returns `None` for any other URL scheme.
    pub fn local_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.0.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        if self.0.contains("://") {
            return None;
        }
        Some(PathBuf::from(&self.0))
    }
}

impl From<&Path> for SourceRef {
    fn from(path: &Path) -> Self {
        Self(path.display().to_string())
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable song as seen by the player. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub source: SourceRef,
    pub album_id: Option<AlbumId>,
    pub album_name: Option<String>,
    pub artist: Option<String>,
    pub cover: Option<SourceRef>,
}

impl Track {
    /// A track with no album context.
    #[cfg(test)]
    pub fn standalone(id: TrackId, title: impl Into<String>, source: SourceRef) -> Self {
        Self {
            id,
            title: title.into(),
            source,
            album_id: None,
            album_name: None,
            artist: None,
            cover: None,
        }
    }
}

/// A song row inside an album.
#[derive(Debug, Clone)]
pub struct Song {
    pub id: TrackId,
    pub title: String,
    pub source: SourceRef,
    pub track_no: Option<u32>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub artist: Option<String>,
    pub cover: Option<SourceRef>,
    pub dir: PathBuf,
    pub songs: Vec<Song>,
}

impl Album {
    /// Build the player track for `song`, carrying album context along.
    pub fn track(&self, song: &Song) -> Track {
        Track {
            id: song.id,
            title: song.title.clone(),
            source: song.source.clone(),
            album_id: Some(self.id),
            album_name: Some(self.name.clone()),
            artist: self.artist.clone(),
            cover: self.cover.clone(),
        }
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.songs.iter().map(|s| self.track(s)).collect()
    }

    /// The album's tracklist as a playlist, or `None` for an empty album.
    pub fn playlist(&self) -> Option<Playlist> {
        Playlist::new(self.tracks())
    }

    pub fn total_duration(&self) -> Option<Duration> {
        self.songs.iter().map(|s| s.duration).sum()
    }
}
