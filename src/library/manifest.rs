//! Library records loaded from a TOML manifest.
//!
//! The manifest mirrors the rows a library server keeps: albums with a cover
//! locator and an artist name, and songs with a file locator. Locators are
//! kept verbatim; the audio backend resolves them (see `library.media_root`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LibraryError;

use super::model::{Album, SourceRef, Song};
use super::store::LibraryStore;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    albums: Vec<ManifestAlbum>,
}

#[derive(Debug, Deserialize)]
struct ManifestAlbum {
    id: u64,
    name: String,
    artist: Option<String>,
    cover: Option<String>,
    #[serde(default)]
    songs: Vec<ManifestSong>,
}

#[derive(Debug, Deserialize)]
struct ManifestSong {
    id: u64,
    title: String,
    file: String,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestLibrary {
    albums: Vec<Album>,
}

impl ManifestLibrary {
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let text = fs::read_to_string(path).map_err(|source| LibraryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let lib = Self::parse(&text)?;
        tracing::info!(
            manifest = %path.display(),
            albums = lib.albums.len(),
            "library manifest loaded"
        );
        Ok(lib)
    }

    pub fn parse(text: &str) -> Result<Self, LibraryError> {
        let manifest: Manifest = toml::from_str(text)?;

        let mut album_ids = HashSet::new();
        let mut song_ids = HashSet::new();
        let mut albums = Vec::with_capacity(manifest.albums.len());

        for a in manifest.albums {
            if !album_ids.insert(a.id) {
                return Err(LibraryError::DuplicateAlbumId(a.id));
            }
            let mut songs = Vec::with_capacity(a.songs.len());
            for (n, s) in a.songs.into_iter().enumerate() {
                if !song_ids.insert(s.id) {
                    return Err(LibraryError::DuplicateSongId(s.id));
                }
                songs.push(Song {
                    id: s.id,
                    title: s.title,
                    source: SourceRef::new(s.file),
                    track_no: Some(n as u32 + 1),
                    duration: None,
                });
            }
            albums.push(Album {
                id: a.id,
                name: a.name,
                artist: a.artist,
                cover: a.cover.map(SourceRef::new),
                dir: Default::default(),
                songs,
            });
        }

        Ok(Self { albums })
    }
}

impl LibraryStore for ManifestLibrary {
    fn albums(&self) -> &[Album] {
        &self.albums
    }
}
