//! Scripted `MediaOutput` used by controller and player-thread tests.

use std::collections::VecDeque;
use std::time::Duration;

use crate::library::SourceRef;

use super::{MediaEvent, MediaOutput, Ticket};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Load(String),
    Play(Ticket),
    Pause,
    Seek(Duration),
    Volume(f32),
    Stop,
}

/// Output double: every `play` completes on the next pump, failing for any
/// source listed in `broken`. With `defer` set nothing is queued and the test
/// completes the request by hand. With `seek_breaks` set every seek loses
/// the source, as when a rebuilt stream cannot be reopened.
#[derive(Default)]
pub(crate) struct ScriptedOutput {
    pub calls: Vec<Call>,
    pub events: VecDeque<MediaEvent>,
    pub loaded: Option<String>,
    pub broken: Vec<String>,
    pub defer: bool,
    pub seek_breaks: bool,
    pub duration: Option<Duration>,
}

impl ScriptedOutput {
    pub fn with_duration(secs: u64) -> Self {
        Self {
            duration: Some(Duration::from_secs(secs)),
            ..Self::default()
        }
    }

    pub fn last_ticket(&self) -> Ticket {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Play(t) => Some(*t),
                _ => None,
            })
            .expect("a play request")
    }
}

impl MediaOutput for ScriptedOutput {
    fn load(&mut self, source: &SourceRef) {
        self.loaded = Some(source.to_string());
        self.calls.push(Call::Load(source.to_string()));
    }

    fn play(&mut self, ticket: Ticket) {
        self.calls.push(Call::Play(ticket));
        if self.defer {
            return;
        }
        let src = self.loaded.clone().unwrap_or_default();
        if self.broken.contains(&src) {
            self.events.push_back(MediaEvent::PlayFailed {
                ticket,
                reason: format!("cannot open {src}"),
            });
        } else {
            self.events.push_back(MediaEvent::PlayStarted(ticket));
            self.events.push_back(MediaEvent::MetadataLoaded(self.duration));
        }
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.calls.push(Call::Seek(position));
        if self.seek_breaks {
            let src = self.loaded.clone().unwrap_or_default();
            self.events
                .push_back(MediaEvent::Interrupted(format!("cannot reopen {src}")));
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::Volume(volume));
    }

    fn stop(&mut self, _fade_out: Duration) {
        self.calls.push(Call::Stop);
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}
