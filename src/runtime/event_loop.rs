use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, PlayRequest, View};
use crate::audio::{AudioPlayer, PlayerCmd};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{PlaybackSession, PlayerState};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Session as last pushed to MPRIS.
    last_mpris: Option<PlaybackSession>,
}

/// What an input asks the runtime to do.
#[derive(Debug, PartialEq)]
pub(super) enum Action {
    None,
    Quit,
    Player(PlayerCmd),
    /// Start whatever the cursor points at.
    PlaySelected,
}

/// Main terminal event loop: handles input, UI drawing and MPRIS. Returns
/// `Ok(())` once shutdown is requested and playback has stopped.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let session = app.session();
        update_mpris(mpris, &session, &mut state.last_mpris);

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        let cmds: Vec<ControlCmd> = control_rx.try_iter().collect();
        if !cmds.is_empty() {
            tracing::debug!(?cmds, "MPRIS control");
            for action in control_actions(cmds, app.session()) {
                if dispatch(action, settings, app, audio_player) {
                    return Ok(());
                }
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = handle_key_event(key, settings, app, &session, state);
                if dispatch(action, settings, app, audio_player) {
                    return Ok(());
                }
            }
        }
    }
}

/// Carry out `action`. Returns `true` when the app should exit.
fn dispatch(
    action: Action,
    settings: &config::Settings,
    app: &App,
    audio_player: &AudioPlayer,
) -> bool {
    let cmd = match action {
        Action::None => return false,
        Action::Quit => {
            audio_player.quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
            return true;
        }
        Action::Player(cmd) => cmd,
        Action::PlaySelected => match app.selection_request() {
            Some(req) => play_request(req),
            None => return false,
        },
    };
    if audio_player.send(cmd).is_err() {
        tracing::error!("player thread is gone");
    }
    false
}

fn play_request(req: PlayRequest) -> PlayerCmd {
    PlayerCmd::PlaySong {
        track: req.track,
        playlist: req.playlist,
    }
}

/// Map a batch of MPRIS calls in arrival order. Each call sees the session
/// as the calls before it will have left it, since none of them has reached
/// the player thread yet.
pub(super) fn control_actions(
    cmds: impl IntoIterator<Item = ControlCmd>,
    mut session: PlaybackSession,
) -> Vec<Action> {
    cmds.into_iter()
        .map(|cmd| {
            let action = control_action(cmd, &session);
            anticipate(&action, &mut session);
            action
        })
        .collect()
}

/// Apply the state change `action` will cause once the player handles it.
fn anticipate(action: &Action, session: &mut PlaybackSession) {
    match action {
        Action::Player(PlayerCmd::TogglePlay) => {
            session.state = match session.state {
                PlayerState::Playing | PlayerState::Loading => PlayerState::Paused,
                PlayerState::Paused | PlayerState::Ended => PlayerState::Playing,
                PlayerState::Idle => PlayerState::Idle,
            };
        }
        Action::PlaySelected => session.state = PlayerState::Loading,
        _ => {}
    }
}

/// Map an MPRIS call onto the player, given what is currently playing.
pub(super) fn control_action(cmd: ControlCmd, session: &PlaybackSession) -> Action {
    let loaded = session.current_track.is_some() || session.state != PlayerState::Idle;
    let running = matches!(session.state, PlayerState::Playing | PlayerState::Loading);

    match cmd {
        ControlCmd::Quit => Action::Quit,
        ControlCmd::Play if !loaded => Action::PlaySelected,
        ControlCmd::Play if running => Action::None,
        ControlCmd::Play => Action::Player(PlayerCmd::TogglePlay),
        // No stopped state to return to: stop holds the track like pause.
        ControlCmd::Pause | ControlCmd::Stop if running => Action::Player(PlayerCmd::TogglePlay),
        ControlCmd::Pause | ControlCmd::Stop => Action::None,
        ControlCmd::PlayPause if !loaded => Action::PlaySelected,
        ControlCmd::PlayPause => Action::Player(PlayerCmd::TogglePlay),
        ControlCmd::Next => Action::Player(PlayerCmd::Next),
        ControlCmd::Prev => Action::Player(PlayerCmd::Prev),
        ControlCmd::Seek(us) => Action::Player(PlayerCmd::SeekBy(us as f64 / 1_000_000.0)),
        ControlCmd::SetPosition(us) => Action::Player(PlayerCmd::Seek(us as f64 / 1_000_000.0)),
        ControlCmd::SetVolume(v) => Action::Player(PlayerCmd::SetVolume(v as f32)),
    }
}

pub(super) fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    session: &PlaybackSession,
    state: &mut EventLoopState,
) -> Action {
    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j') | KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.next();
            }
            KeyCode::Char('k') | KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.prev();
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if !app.display_indices().is_empty() {
                    app.exit_filter_mode();
                    app.activate();
                }
            }
            _ => {}
        }
        return Action::None;
    }

    let was_pending_gg = std::mem::take(&mut state.pending_gg);
    let scrub = settings.controls.scrub_seconds as f64;
    let step = settings.controls.volume_step;

    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('g') => {
            if was_pending_gg {
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => {
            if let Some(req) = app.activate() {
                return Action::Player(play_request(req));
            }
        }
        KeyCode::Esc | KeyCode::Backspace => {
            if !app.back() && !app.filter_query.is_empty() {
                app.clear_filter();
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            return control_action(ControlCmd::PlayPause, session);
        }
        KeyCode::Char('l') => return Action::Player(PlayerCmd::Next),
        KeyCode::Char('h') => return Action::Player(PlayerCmd::Prev),
        KeyCode::Char('L') => return Action::Player(PlayerCmd::SeekBy(scrub)),
        KeyCode::Char('H') => return Action::Player(PlayerCmd::SeekBy(-scrub)),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            return Action::Player(PlayerCmd::SetVolume((session.volume + step).min(1.0)));
        }
        KeyCode::Char('-') => {
            return Action::Player(PlayerCmd::SetVolume((session.volume - step).max(0.0)));
        }
        KeyCode::Char('c') => {
            if !app.jump_to_current_album() {
                tracing::debug!("no current album to jump to");
            }
        }
        KeyCode::Char('K') => {
            if app.view == View::Albums && !app.has_albums() {
                return Action::None;
            }
            app.toggle_metadata_window();
        }
        _ => {}
    }

    Action::None
}
