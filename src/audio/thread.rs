use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::player::{Controller, MediaOutput};

use super::output::RodioOutput;
use super::types::{PlayerCmd, SessionHandle};

pub(super) fn spawn_player_thread(
    rx: Receiver<PlayerCmd>,
    session: SessionHandle,
    volume: f32,
    tick: Duration,
    media_root: Option<PathBuf>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("spindle-player".to_string())
        .spawn(move || {
            // The output stream must live on the thread that drives it.
            let output = RodioOutput::open(media_root);
            let mut controller = Controller::new(output, volume);
            run(&mut controller, &rx, &session, tick);
        })
}

/// Command/tick loop. Returns once `Quit` arrives or every sender is gone.
pub(super) fn run<O: MediaOutput>(
    controller: &mut Controller<O>,
    rx: &Receiver<PlayerCmd>,
    session: &SessionHandle,
    tick: Duration,
) {
    publish(controller, session);
    let mut last_tick = Instant::now();

    loop {
        let wait = tick.saturating_sub(last_tick.elapsed());
        match rx.recv_timeout(wait) {
            Ok(PlayerCmd::Quit { fade_out_ms }) => {
                controller.shutdown(Duration::from_millis(fade_out_ms));
                publish(controller, session);
                break;
            }
            Ok(cmd) => {
                apply(controller, cmd);
                controller.pump();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                controller.shutdown(Duration::ZERO);
                publish(controller, session);
                break;
            }
        }

        if last_tick.elapsed() >= tick {
            controller.tick();
            last_tick = Instant::now();
        }
        publish(controller, session);
    }

    tracing::debug!("player thread exiting");
}

fn apply<O: MediaOutput>(controller: &mut Controller<O>, cmd: PlayerCmd) {
    tracing::trace!(?cmd, "player command");
    match cmd {
        PlayerCmd::PlaySong { track, playlist } => controller.play_song(track, playlist),
        PlayerCmd::TogglePlay => controller.toggle_play(),
        PlayerCmd::Next => controller.play_next(),
        PlayerCmd::Prev => controller.play_prev(),
        PlayerCmd::SetVolume(v) => controller.set_volume(v),
        PlayerCmd::Seek(secs) => controller.seek(secs),
        PlayerCmd::SeekBy(secs) => controller.seek_by(secs),
        // Handled by the loop itself.
        PlayerCmd::Quit { .. } => {}
    }
}

fn publish<O: MediaOutput>(controller: &Controller<O>, session: &SessionHandle) {
    if let Ok(mut s) = session.lock() {
        if *s != *controller.session() {
            *s = controller.session().clone();
        }
    }
}
