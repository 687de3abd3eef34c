use std::time::Duration;

use crate::library::Track;

use super::output::{MediaEvent, MediaOutput, Ticket};
use super::playlist::Playlist;
use super::types::{PlaybackSession, PlayerState, clamp_volume};

/// Transport controller over a single `MediaOutput`.
///
/// No command reports failure to the caller. Invalid calls are no-ops,
/// out-of-range values are clamped, and play failures settle into `Paused`
/// with the track still loaded; all of it is observable via `session()`.
pub struct Controller<O: MediaOutput> {
    output: O,
    session: PlaybackSession,
    /// Ticket of the outstanding start request, if any.
    pending: Option<Ticket>,
    next_ticket: u64,
}

impl<O: MediaOutput> Controller<O> {
    pub fn new(mut output: O, volume: f32) -> Self {
        let session = PlaybackSession::new(volume);
        output.set_volume(session.volume);
        Self {
            output,
            session,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    #[cfg(test)]
    pub fn output(&self) -> &O {
        &self.output
    }

    #[cfg(test)]
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Load `track` and start playing it.
    ///
    /// With a `playlist`, it becomes the active queue and the index is the
    /// track's position in it (`None` if absent). Without one, the current
    /// queue survives only when it contains `track`.
    pub fn play_song(&mut self, track: Track, playlist: Option<Playlist>) {
        let index = match playlist {
            Some(pl) => {
                let idx = pl.position_of(track.id);
                if idx.is_none() {
                    tracing::warn!(track = track.id, "track missing from supplied playlist");
                }
                self.session.playlist = Some(pl);
                idx
            }
            None => {
                let idx = self
                    .session
                    .playlist
                    .as_ref()
                    .and_then(|pl| pl.position_of(track.id));
                if idx.is_none() {
                    self.session.playlist = None;
                }
                idx
            }
        };
        self.load_at(track, index);
    }

    /// Pause when playing (or about to), resume when paused.
    ///
    /// Does nothing when no track is loaded.
    pub fn toggle_play(&mut self) {
        match self.session.state {
            PlayerState::Idle => {
                tracing::debug!("toggle ignored: no track loaded");
            }
            PlayerState::Playing | PlayerState::Loading => {
                self.output.pause();
                self.pending = None;
                self.session.state = PlayerState::Paused;
            }
            PlayerState::Paused | PlayerState::Ended => self.resume(),
        }
    }

    pub fn play_next(&mut self) {
        match self.neighbour(true) {
            Some((track, idx)) => self.load_at(track, Some(idx)),
            None => tracing::debug!("next ignored: no following track"),
        }
    }

    pub fn play_prev(&mut self) {
        match self.neighbour(false) {
            Some((track, idx)) => self.load_at(track, Some(idx)),
            None => tracing::debug!("prev ignored: no preceding track"),
        }
    }

    /// Jump to `secs`, clamped to `[0, duration]`. NaN counts as 0. While the
    /// duration is unknown only the lower bound applies.
    pub fn seek(&mut self, secs: f64) {
        if self.session.current_track.is_none() {
            tracing::debug!("seek ignored: no track loaded");
            return;
        }
        let target = if secs.is_nan() || secs <= 0.0 {
            Duration::ZERO
        } else {
            let t = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
            if self.session.duration.is_zero() {
                t
            } else {
                t.min(self.session.duration)
            }
        };
        self.session.position = target;
        self.output.seek(target);
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta_secs: f64) {
        self.seek(self.session.position.as_secs_f64() + delta_secs);
    }

    /// Set the output volume, clamped to `[0, 1]`. Kept across track changes.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(v) = clamp_volume(volume) else {
            tracing::debug!("volume ignored: NaN");
            return;
        };
        self.session.volume = v;
        self.output.set_volume(v);
    }

    /// Let the output sample progress, then apply whatever it reported.
    pub fn tick(&mut self) {
        self.output.tick();
        self.pump();
    }

    /// Apply all queued output events in order.
    pub fn pump(&mut self) {
        while let Some(event) = self.output.poll_event() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::PlayStarted(ticket) => {
                if self.pending != Some(ticket) {
                    tracing::trace!(?ticket, "stale start completion");
                    return;
                }
                self.pending = None;
                self.session.state = PlayerState::Playing;
                self.session.last_error = None;
            }
            MediaEvent::PlayFailed { ticket, reason } => {
                if self.pending != Some(ticket) {
                    tracing::trace!(?ticket, "stale start failure");
                    return;
                }
                self.pending = None;
                tracing::warn!(
                    track = self.session.current_track.as_ref().map(|t| t.id),
                    %reason,
                    "playback failed to start"
                );
                self.session.state = PlayerState::Paused;
                self.session.last_error = Some(reason);
            }
            MediaEvent::Interrupted(reason) => {
                if self.session.current_track.is_none() {
                    return;
                }
                self.pending = None;
                tracing::warn!(
                    track = self.session.current_track.as_ref().map(|t| t.id),
                    %reason,
                    "playback interrupted"
                );
                self.session.state = PlayerState::Paused;
                self.session.last_error = Some(reason);
            }
            MediaEvent::TimeUpdate(pos) => {
                if self.session.current_track.is_none() {
                    return;
                }
                // Unknown duration: keep the raw position so elapsed time still shows.
                self.session.position = if self.session.duration.is_zero() {
                    pos
                } else {
                    pos.min(self.session.duration)
                };
            }
            MediaEvent::MetadataLoaded(duration) => {
                if self.session.current_track.is_none() {
                    return;
                }
                self.session.duration = duration.unwrap_or(Duration::ZERO);
                if !self.session.duration.is_zero() {
                    self.session.position = self.session.position.min(self.session.duration);
                }
            }
            MediaEvent::Ended => self.on_ended(),
        }
    }

    /// Stop the output and drop any outstanding start request.
    ///
    /// The session keeps its track so a final snapshot still shows it.
    pub fn shutdown(&mut self, fade_out: Duration) {
        self.pending = None;
        self.output.stop(fade_out);
        if self.session.state != PlayerState::Idle {
            self.session.state = PlayerState::Paused;
        }
        tracing::info!("playback stopped for shutdown");
    }

    fn on_ended(&mut self) {
        if self.session.current_track.is_none() {
            return;
        }
        self.session.state = PlayerState::Ended;
        if self.session.has_next() {
            self.play_next();
            return;
        }
        // Last track: stay on it, parked at the end.
        self.pending = None;
        self.session.state = PlayerState::Paused;
        self.session.position = self.session.duration;
        tracing::debug!("reached end of queue");
    }

    fn resume(&mut self) {
        let at_end =
            !self.session.duration.is_zero() && self.session.position >= self.session.duration;
        if at_end {
            self.session.position = Duration::ZERO;
            self.output.seek(Duration::ZERO);
        }
        let ticket = self.issue_ticket();
        self.output.play(ticket);
    }

    fn load_at(&mut self, track: Track, index: Option<usize>) {
        tracing::info!(id = track.id, title = %track.title, ?index, "loading track");
        self.output.load(&track.source);
        self.session.current_track = Some(track);
        self.session.current_index = index;
        self.session.position = Duration::ZERO;
        self.session.duration = Duration::ZERO;
        self.session.last_error = None;
        self.session.state = PlayerState::Loading;
        let ticket = self.issue_ticket();
        self.output.play(ticket);
    }

    fn neighbour(&self, forward: bool) -> Option<(Track, usize)> {
        let pl = self.session.playlist.as_ref()?;
        let i = self.session.current_index?;
        let j = if forward { i.checked_add(1)? } else { i.checked_sub(1)? };
        pl.get(j).map(|t| (t.clone(), j))
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.pending = Some(ticket);
        ticket
    }
}
