//! The seam between the controller and whatever actually makes sound.

use std::time::Duration;

use crate::library::SourceRef;

/// Identifies one start request. Completions carrying an older ticket are
/// stale and get dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Notifications from the output, delivered in order through `poll_event`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// The start request with this ticket succeeded.
    PlayStarted(Ticket),
    /// The start request with this ticket failed.
    PlayFailed { ticket: Ticket, reason: String },
    /// Playback that had started stopped on an error, e.g. the source could
    /// not be reopened.
    Interrupted(String),
    /// Current play position.
    TimeUpdate(Duration),
    /// Track length became known; `None` when the source cannot tell.
    MetadataLoaded(Option<Duration>),
    /// The loaded source played to its end.
    Ended,
}

/// A single audio output. Starting playback is asynchronous: `play` only
/// requests it and the outcome arrives later as an event.
pub trait MediaOutput {
    /// Replace the current source. Anything playing stops immediately.
    fn load(&mut self, source: &SourceRef);

    /// Request playback (start or resume) of the loaded source.
    fn play(&mut self, ticket: Ticket);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    /// Stop and release the source, fading out over `fade_out` first.
    fn stop(&mut self, fade_out: Duration);

    /// Sample playback progress and queue the resulting events.
    fn tick(&mut self) {}

    fn poll_event(&mut self) -> Option<MediaEvent>;
}
