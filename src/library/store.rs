use std::path::{Path, PathBuf};

use crate::config::LibrarySettings;

use super::model::{Album, AlbumId, TrackId};
use super::scan::scan;

/// Read access to album and song records.
pub trait LibraryStore {
    fn albums(&self) -> &[Album];

    fn album(&self, id: AlbumId) -> Option<&Album> {
        self.albums().iter().find(|a| a.id == id)
    }

    /// Locate the album holding song `id`.
    fn album_of_song(&self, id: TrackId) -> Option<&Album> {
        self.albums()
            .iter()
            .find(|a| a.songs.iter().any(|s| s.id == id))
    }
}

/// Library built from a directory tree on disk.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLibrary {
    root: PathBuf,
    albums: Vec<Album>,
}

impl DirectoryLibrary {
    pub fn scan(root: &Path, settings: &LibrarySettings) -> Self {
        Self {
            root: root.to_path_buf(),
            albums: scan(root, settings),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LibraryStore for DirectoryLibrary {
    fn albums(&self) -> &[Album] {
        &self.albums
    }
}
