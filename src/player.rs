//! Playback controller: the single owner of what is playing.
//!
//! The controller is a reducer over transport commands and media events. It
//! drives a `MediaOutput` and keeps a `PlaybackSession` that views read.

mod controller;
mod output;
mod playlist;
mod types;

pub use controller::Controller;
pub use output::{MediaEvent, MediaOutput, Ticket};
pub use playlist::Playlist;
pub use types::{PlaybackSession, PlayerState};

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;
