use std::ops::Deref;
use std::sync::Arc;

use crate::library::{Track, TrackId};

/// Ordered, non-empty sequence of tracks. Cloning shares the backing slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist(Arc<[Track]>);

impl Playlist {
    /// Returns `None` for an empty list; there is no empty playlist.
    pub fn new(tracks: Vec<Track>) -> Option<Self> {
        if tracks.is_empty() {
            None
        } else {
            Some(Self(tracks.into()))
        }
    }

    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.0.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.position_of(id).is_some()
    }
}

impl Deref for Playlist {
    type Target = [Track];

    fn deref(&self) -> &[Track] {
        &self.0
    }
}
