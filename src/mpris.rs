//! MPRIS2 surface on the session bus.
//!
//! Incoming calls become `ControlCmd`s for the runtime. Outgoing state is a
//! mirror of the playback session, refreshed by the runtime via
//! `MprisHandle::sync`; the bus thread turns refreshes into
//! `PropertiesChanged` signals.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::{PlaybackSession, PlayerState};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.spindle";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds, already checked against the current track.
    SetPosition(i64),
    SetVolume(f64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlayerState,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    volume: f64,
    can_go_next: bool,
    can_go_previous: bool,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Mirror `session` and ask the bus thread to announce the change.
    pub fn sync(&self, session: &PlaybackSession) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = session.state;
            s.position_micros = micros(session.position);
            s.volume = f64::from(session.volume);
            s.can_go_next = session.has_next();
            s.can_go_previous = session.has_prev();
            let length = (!session.duration.is_zero()).then(|| micros(session.duration));
            set_track_metadata(&mut s, session.current_track.as_ref(), length);
        }
        let _ = self.notify.send(());
    }

    /// Update the mirrored position without announcing anything; clients
    /// poll `Position`.
    pub fn set_position(&self, position: Duration) {
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = micros(position);
        }
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// Object path naming track `id` in `mpris:trackid`.
fn track_object_path(id: u64) -> Option<OwnedObjectPath> {
    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{id}")).ok()
}

/// `xesam:url` / `mpris:artUrl` form of a locator: absolute local paths
/// become `file://` URLs, anything else is passed through.
fn locator_url(locator: &str) -> String {
    if locator.starts_with('/') {
        format!("file://{locator}")
    } else {
        locator.to_string()
    }
}

fn set_track_metadata(s: &mut SharedState, track: Option<&Track>, length_micros: Option<i64>) {
    match track {
        Some(t) => {
            s.track_id = track_object_path(t.id);
            s.title = Some(t.title.clone());
            s.artist = t.artist.iter().cloned().collect();
            s.album = t.album_name.clone();
            s.url = Some(locator_url(t.source.as_str()));
            s.art_url = t.cover.as_ref().map(|c| locator_url(c.as_str()));
            s.length_micros = length_micros;
        }
        None => {
            s.track_id = None;
            s.title = None;
            s.artist.clear();
            s.album = None;
            s.url = None;
            s.art_url = None;
            s.length_micros = None;
        }
    }
}

fn owned<'a, V: Into<Value<'a>>>(v: V) -> Option<OwnedValue> {
    OwnedValue::try_from(v.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "spindle"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self
            .state
            .lock()
            .ok()
            .and_then(|s| s.track_id.clone());
        if current.as_ref().map(|p| p.as_str()) == Some(track_id.as_str()) && position >= 0 {
            let _ = self.tx.send(ControlCmd::SetPosition(position));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlayerState::Idle => "Stopped",
            PlayerState::Loading | PlayerState::Playing => "Playing",
            PlayerState::Paused | PlayerState::Ended => "Paused",
        }
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.state.lock().is_ok_and(|s| s.track_id.is_some())
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.state.lock().is_ok_and(|s| s.can_go_next)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.state.lock().is_ok_and(|s| s.can_go_previous)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = match &s.track_id {
            Some(p) => p.clone().into_inner(),
            None => ObjectPath::from_static_str_unchecked(NO_TRACK),
        };
        let mut put = |k: &str, v: Option<OwnedValue>| {
            if let Some(v) = v {
                map.insert(k.to_string(), v);
            }
        };

        put("mpris:trackid", owned(track_id));
        put("xesam:title", s.title.clone().and_then(owned));
        if !s.artist.is_empty() {
            put("xesam:artist", owned(s.artist.clone()));
        }
        put("xesam:album", s.album.clone().and_then(owned));
        put("xesam:url", s.url.clone().and_then(owned));
        put("mpris:artUrl", s.art_url.clone().and_then(owned));
        put("mpris:length", s.length_micros.and_then(owned));
        map
    }
}

/// Start the MPRIS service on its own thread.
///
/// Failing to reach the session bus only disables the service.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("spindle-mpris".to_string())
        .spawn(move || {
            block_on(async move {
                if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                    tracing::warn!(error = %e, "MPRIS unavailable");
                }
            });
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to spawn MPRIS thread");
    }

    MprisHandle { state, notify }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    tracing::info!(name = BUS_NAME, "MPRIS service registered");

    loop {
        Timer::after(Duration::from_millis(250)).await;

        let mut changed = false;
        loop {
            match notify_rx.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                // The runtime is gone; keep the connection only as long as it.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if !changed {
            continue;
        }

        let emitter = player.signal_emitter();
        let iface = player.get().await;
        iface.playback_status_changed(emitter).await?;
        iface.metadata_changed(emitter).await?;
        iface.volume_changed(emitter).await?;
        iface.can_seek_changed(emitter).await?;
        iface.can_go_next_changed(emitter).await?;
        iface.can_go_previous_changed(emitter).await?;
    }
}
