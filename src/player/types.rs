//! Observable playback state.

use std::time::Duration;

use crate::library::Track;

use super::playlist::Playlist;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No track loaded.
    #[default]
    Idle,
    /// Track set, start requested but not yet confirmed by the output.
    Loading,
    Playing,
    Paused,
    /// Transient: the track ran out. Resolved to the next track or `Paused`
    /// before the event handler returns.
    Ended,
}

/// Snapshot of the live playback state, as read by views.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub current_track: Option<Track>,
    /// Position of `current_track` in `playlist`, if it is playing from one.
    pub current_index: Option<usize>,
    pub playlist: Option<Playlist>,
    pub state: PlayerState,
    /// Always within `[0, 1]`.
    pub volume: f32,
    pub position: Duration,
    /// Zero until the output reports metadata.
    pub duration: Duration,
    /// Reason of the last absorbed play failure.
    pub last_error: Option<String>,
}

impl PlaybackSession {
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            current_index: None,
            playlist: None,
            state: PlayerState::Idle,
            volume: clamp_volume(volume).unwrap_or(1.0),
            position: Duration::ZERO,
            duration: Duration::ZERO,
            last_error: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    /// Whether `play_next` would do anything.
    pub fn has_next(&self) -> bool {
        match (&self.playlist, self.current_index) {
            (Some(pl), Some(i)) => i + 1 < pl.len(),
            _ => false,
        }
    }

    /// Whether `play_prev` would do anything.
    pub fn has_prev(&self) -> bool {
        self.playlist.is_some() && matches!(self.current_index, Some(i) if i >= 1)
    }

    /// Playback progress in `[0, 1]`, or 0 when the duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Clamp a volume into `[0, 1]`; `None` for NaN.
pub(super) fn clamp_volume(v: f32) -> Option<f32> {
    if v.is_nan() { None } else { Some(v.clamp(0.0, 1.0)) }
}
