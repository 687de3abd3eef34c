//! Commands accepted by the player thread and the shared session handle.

use std::sync::{Arc, Mutex};

use crate::library::Track;
use crate::player::{PlaybackSession, Playlist};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCmd {
    /// Load and play `track`, optionally replacing the active playlist.
    PlaySong {
        track: Track,
        playlist: Option<Playlist>,
    },
    /// Pause or resume.
    TogglePlay,
    /// Skip to the next track in the playlist.
    Next,
    /// Go to the previous track in the playlist.
    Prev,
    /// Set volume; clamped to `[0, 1]`.
    SetVolume(f32),
    /// Seek to an absolute position in seconds.
    Seek(f64),
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(f64),
    /// Stop playback and end the thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

pub type SessionHandle = Arc<Mutex<PlaybackSession>>;
