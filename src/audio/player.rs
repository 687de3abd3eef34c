use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Settings;
use crate::player::PlaybackSession;

use super::thread::spawn_player_thread;
use super::types::{PlayerCmd, SessionHandle};

/// Handle to the player thread. Created once at startup; dropping it stops
/// playback and joins the thread.
pub struct AudioPlayer {
    tx: Sender<PlayerCmd>,
    session: SessionHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(settings: &Settings) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let volume = settings.playback.volume;
        let session: SessionHandle = Arc::new(Mutex::new(PlaybackSession::new(volume)));

        let handle = spawn_player_thread(
            rx,
            session.clone(),
            volume,
            Duration::from_millis(settings.audio.tick_ms),
            settings.library.media_root.clone(),
        )?;

        Ok(Self {
            tx,
            session,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn session_handle(&self) -> SessionHandle {
        self.session.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), mpsc::SendError<PlayerCmd>> {
        self.tx.send(cmd)
    }

    /// Fade out, stop, and wait for the player thread to finish.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(PlayerCmd::Quit {
            fade_out_ms: millis(fade_out),
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                if h.join().is_err() {
                    tracing::error!("player thread panicked");
                }
            }
        }
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.quit_softly(Duration::ZERO);
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(super) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
