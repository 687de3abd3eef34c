use std::collections::VecDeque;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::OutputError;
use crate::library::SourceRef;
use crate::player::{MediaEvent, MediaOutput, Ticket};

use super::sink::{create_sink_at, probe_duration, resolve_source};

/// `MediaOutput` backed by the default rodio device.
///
/// A sink is only built when playback is requested, so open and decode
/// errors surface as `PlayFailed` rather than at load time.
pub struct RodioOutput {
    stream: Option<OutputStream>,
    media_root: Option<PathBuf>,
    source: Option<SourceRef>,
    sink: Option<Sink>,
    /// Offset of the sink's own clock; nonzero when it was built with a skip.
    base: Duration,
    /// Where to start when the sink has to be (re)built.
    resume_at: Duration,
    volume: f32,
    playing: bool,
    metadata_sent: bool,
    ended_sent: bool,
    events: VecDeque<MediaEvent>,
}

impl RodioOutput {
    /// Open the default output device. Without one, every play request fails.
    pub fn open(media_root: Option<PathBuf>) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
                // but noisy for a TUI app.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                tracing::error!(error = %e, "no audio output device, playback disabled");
                None
            }
        };

        Self {
            stream,
            media_root,
            source: None,
            sink: None,
            base: Duration::ZERO,
            resume_at: Duration::ZERO,
            volume: 1.0,
            playing: false,
            metadata_sent: false,
            ended_sent: false,
            events: VecDeque::new(),
        }
    }

    fn build_sink(&mut self) -> Result<(), OutputError> {
        let stream = self.stream.as_ref().ok_or(OutputError::NoDevice)?;
        let source = self.source.as_ref().ok_or(OutputError::NoSource)?;
        let path = resolve_source(source, self.media_root.as_deref())?;

        let (sink, total) = create_sink_at(stream, &path, self.resume_at)?;
        sink.set_volume(self.volume);

        if !self.metadata_sent {
            let total = total.or_else(|| probe_duration(&path));
            self.events.push_back(MediaEvent::MetadataLoaded(total));
            self.metadata_sent = true;
        }

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.base = self.resume_at;
        self.ended_sent = false;
        tracing::debug!(path = %path.display(), start = ?self.resume_at, "sink ready");
        Ok(())
    }

    fn drop_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.playing = false;
    }
}

impl MediaOutput for RodioOutput {
    fn load(&mut self, source: &SourceRef) {
        self.drop_sink();
        // Whatever the old source still had queued is stale now.
        self.events.clear();
        self.source = Some(source.clone());
        self.base = Duration::ZERO;
        self.resume_at = Duration::ZERO;
        self.metadata_sent = false;
        self.ended_sent = false;
    }

    fn play(&mut self, ticket: Ticket) {
        let needs_sink = self.sink.as_ref().is_none_or(|s| s.empty());
        if needs_sink {
            if let Err(e) = self.build_sink() {
                self.drop_sink();
                self.events.push_back(MediaEvent::PlayFailed {
                    ticket,
                    reason: e.to_string(),
                });
                return;
            }
        }

        if let Some(s) = &self.sink {
            s.play();
        }
        self.playing = true;
        self.events.push_back(MediaEvent::PlayStarted(ticket));
    }

    fn pause(&mut self) {
        if let Some(s) = &self.sink {
            s.pause();
        }
        self.playing = false;
    }

    fn seek(&mut self, position: Duration) {
        self.resume_at = position;

        let Some(sink) = self.sink.as_ref().filter(|s| !s.empty()) else {
            // Applied when the sink is next built.
            return;
        };

        match sink.try_seek(position) {
            Ok(()) => self.base = Duration::ZERO,
            Err(e) => {
                // Decoder cannot seek: rebuild and skip into the file instead.
                tracing::debug!(error = %e, "seek unsupported, rebuilding sink");
                let was_playing = self.playing;
                match self.build_sink() {
                    Ok(()) => {
                        if was_playing {
                            if let Some(s) = &self.sink {
                                s.play();
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to rebuild sink for seek");
                        self.drop_sink();
                        self.events.push_back(MediaEvent::Interrupted(e.to_string()));
                    }
                }
            }
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = &self.sink {
            s.set_volume(volume);
        }
    }

    fn stop(&mut self, fade_out: Duration) {
        if let Some(s) = &self.sink {
            if self.playing && !fade_out.is_zero() {
                fade_out_sink(s, self.volume, fade_out);
            }
        }
        self.drop_sink();
        self.source = None;
        self.events.clear();
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };

        if sink.empty() {
            if self.playing && !self.ended_sent {
                self.ended_sent = true;
                self.playing = false;
                self.resume_at = Duration::ZERO;
                self.events.push_back(MediaEvent::Ended);
            }
            return;
        }

        self.events
            .push_back(MediaEvent::TimeUpdate(self.base + sink.get_pos()));
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}

/// Ramp `sink` from `from` down to silence over `fade_out`.
fn fade_out_sink(sink: &Sink, from: f32, fade_out: Duration) {
    let steps: u32 = 20;
    let step = (fade_out / steps).max(Duration::from_millis(1));
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(step);
    }
    sink.set_volume(0.0);
}
