use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Album, Song, SourceRef};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn find_cover(dir: &Path, settings: &LibrarySettings) -> Option<SourceRef> {
    settings
        .cover_names
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
        .map(|p| SourceRef::from(p.as_path()))
}

/// Tag values read from a single file. Everything is optional; untagged or
/// unreadable files still become songs named after their file stem.
#[derive(Default)]
struct FileTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    track_no: Option<u32>,
    duration: Option<Duration>,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_tags(path: &Path) -> FileTags {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no readable tags");
            return FileTags::default();
        }
    };

    let mut tags = FileTags {
        duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
        ..FileTags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = non_empty(tag.title());
        tags.artist = non_empty(tag.artist());
        tags.album = non_empty(tag.album());
        tags.track_no = tag.track();
    }
    tags
}

struct PendingSong {
    title: String,
    path: PathBuf,
    tags: FileTags,
}

/// Walk `dir` and group audio files into albums by containing directory.
///
/// Album ids are assigned in (artist, name) order and song ids in album then
/// (track number, title) order, both starting at 1.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Album> {
    let mut by_dir: BTreeMap<PathBuf, Vec<PendingSong>> = BTreeMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let tags = read_tags(path);
        let title = tags.title.clone().unwrap_or(stem);
        let parent = path.parent().unwrap_or(dir).to_path_buf();

        by_dir.entry(parent).or_default().push(PendingSong {
            title,
            path: path.to_path_buf(),
            tags,
        });
    }

    let mut albums: Vec<Album> = by_dir
        .into_iter()
        .map(|(album_dir, mut pending)| {
            pending.sort_by(|a, b| {
                a.tags
                    .track_no
                    .unwrap_or(u32::MAX)
                    .cmp(&b.tags.track_no.unwrap_or(u32::MAX))
                    .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            });

            let name = pending
                .iter()
                .find_map(|p| p.tags.album.clone())
                .or_else(|| {
                    album_dir
                        .file_name()
                        .and_then(|s| s.to_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "Unknown album".to_string());
            let artist = pending.iter().find_map(|p| p.tags.artist.clone());
            let cover = find_cover(&album_dir, settings);

            let songs = pending
                .into_iter()
                .map(|p| Song {
                    id: 0,
                    title: p.title,
                    source: SourceRef::from(p.path.as_path()),
                    track_no: p.tags.track_no,
                    duration: p.tags.duration,
                })
                .collect();

            Album {
                id: 0,
                name,
                artist,
                cover,
                dir: album_dir,
                songs,
            }
        })
        .collect();

    albums.sort_by(|a, b| {
        let key = |x: &Album| {
            (
                x.artist.as_deref().unwrap_or("").to_lowercase(),
                x.name.to_lowercase(),
            )
        };
        key(a).cmp(&key(b))
    });

    let mut next_song_id = 1;
    for (i, album) in albums.iter_mut().enumerate() {
        album.id = i as u64 + 1;
        for song in album.songs.iter_mut() {
            song.id = next_song_id;
            next_song_id += 1;
        }
    }

    tracing::info!(
        root = %dir.display(),
        albums = albums.len(),
        songs = next_song_id - 1,
        "library scanned"
    );
    albums
}
