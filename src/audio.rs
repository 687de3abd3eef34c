//! Audio playback: the rodio-backed output and the player thread.
//!
//! The player thread owns the `Controller` and is the only writer of the
//! playback session. Everyone else sends `PlayerCmd`s and reads snapshots
//! through a `SessionHandle`.

mod output;
mod player;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::{PlayerCmd, SessionHandle};
