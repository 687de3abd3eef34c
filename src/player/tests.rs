use super::testing::{Call, ScriptedOutput};
use super::*;
use crate::library::{SourceRef, Track};
use std::time::Duration;

fn track(id: u64, name: &str) -> Track {
    Track::standalone(id, name, SourceRef::new(format!("/music/{name}.mp3")))
}

fn abc() -> (Track, Track, Track, Playlist) {
    let (a, b, c) = (track(1, "a"), track(2, "b"), track(3, "c"));
    let pl = Playlist::new(vec![a.clone(), b.clone(), c.clone()]).unwrap();
    (a, b, c, pl)
}

fn controller() -> Controller<ScriptedOutput> {
    Controller::new(ScriptedOutput::with_duration(180), 0.8)
}

fn play(ctl: &mut Controller<ScriptedOutput>, t: &Track, pl: Option<&Playlist>) {
    ctl.play_song(t.clone(), pl.cloned());
    ctl.pump();
}

fn current_id(ctl: &Controller<ScriptedOutput>) -> Option<u64> {
    ctl.session().current_track.as_ref().map(|t| t.id)
}

#[test]
fn new_controller_is_idle_and_applies_volume() {
    let ctl = controller();
    let s = ctl.session();
    assert_eq!(s.state, PlayerState::Idle);
    assert!(s.current_track.is_none());
    assert!(!s.is_playing());
    assert_eq!(s.position, Duration::ZERO);
    assert_eq!(s.duration, Duration::ZERO);
    assert_eq!(ctl.output().calls, vec![Call::Volume(0.8)]);
}

#[test]
fn play_song_loads_then_plays_once_output_confirms() {
    let (a, _, _, pl) = abc();
    let mut ctl = controller();

    ctl.play_song(a.clone(), Some(pl));
    assert_eq!(ctl.session().state, PlayerState::Loading);
    assert!(!ctl.session().is_playing());

    ctl.pump();
    let s = ctl.session();
    assert_eq!(s.state, PlayerState::Playing);
    assert_eq!(s.current_track.as_ref(), Some(&a));
    assert_eq!(s.current_index, Some(0));
    assert_eq!(s.duration, Duration::from_secs(180));
}

#[test]
fn playlist_walk_stops_at_last_track() {
    let (a, _, c, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));
    assert_eq!(ctl.session().current_index, Some(0));

    ctl.play_next();
    ctl.pump();
    ctl.play_next();
    ctl.pump();
    assert_eq!(ctl.session().current_index, Some(2));
    assert_eq!(ctl.session().current_track.as_ref(), Some(&c));

    let before = ctl.session().clone();
    let calls_before = ctl.output().calls.len();
    ctl.play_next();
    ctl.pump();
    assert_eq!(ctl.session(), &before);
    assert_eq!(ctl.output().calls.len(), calls_before);
}

#[test]
fn play_prev_at_first_track_is_a_no_op() {
    let (a, _, _, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));

    let before = ctl.session().clone();
    ctl.play_prev();
    ctl.pump();
    assert_eq!(ctl.session(), &before);
}

#[test]
fn play_prev_moves_back_within_the_playlist() {
    let (_, b, c, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &c, Some(&pl));
    assert_eq!(ctl.session().current_index, Some(2));

    ctl.play_prev();
    ctl.pump();
    assert_eq!(ctl.session().current_index, Some(1));
    assert_eq!(ctl.session().current_track.as_ref(), Some(&b));
    assert!(ctl.session().is_playing());
}

#[test]
fn next_without_playlist_context_is_a_no_op() {
    let mut ctl = controller();
    play(&mut ctl, &track(9, "x"), None);
    assert!(ctl.session().playlist.is_none());
    assert_eq!(ctl.session().current_index, None);

    let before = ctl.session().clone();
    ctl.play_next();
    ctl.play_prev();
    ctl.pump();
    assert_eq!(ctl.session(), &before);
}

#[test]
fn play_song_without_playlist_keeps_queue_when_track_belongs_to_it() {
    let (a, _, c, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));

    play(&mut ctl, &c, None);
    assert_eq!(ctl.session().playlist.as_ref(), Some(&pl));
    assert_eq!(ctl.session().current_index, Some(2));
}

#[test]
fn play_song_without_playlist_clears_queue_for_foreign_track() {
    let (a, _, _, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));

    play(&mut ctl, &track(42, "other"), None);
    assert!(ctl.session().playlist.is_none());
    assert_eq!(ctl.session().current_index, None);
}

#[test]
fn play_song_with_playlist_missing_the_track_has_no_index() {
    let (_, _, _, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &track(42, "other"), Some(&pl));

    assert_eq!(ctl.session().playlist.as_ref(), Some(&pl));
    assert_eq!(ctl.session().current_index, None);
    assert!(ctl.session().is_playing());
}

#[test]
fn natural_end_with_successor_matches_explicit_next() {
    let (a, _, _, pl) = abc();

    let mut by_end = controller();
    play(&mut by_end, &a, Some(&pl));
    by_end.handle_event(MediaEvent::Ended);
    by_end.pump();

    let mut by_next = controller();
    play(&mut by_next, &a, Some(&pl));
    by_next.play_next();
    by_next.pump();

    let (e, n) = (by_end.session(), by_next.session());
    assert_eq!(e.current_track, n.current_track);
    assert_eq!(e.current_index, n.current_index);
    assert_eq!(e.is_playing(), n.is_playing());
    assert_eq!(e.current_index, Some(1));
}

#[test]
fn natural_end_of_last_track_parks_at_end_and_keeps_track() {
    let (_, _, c, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &c, Some(&pl));
    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(179)));

    ctl.handle_event(MediaEvent::Ended);
    ctl.pump();

    let s = ctl.session();
    assert!(!s.is_playing());
    assert_eq!(s.state, PlayerState::Paused);
    assert_eq!(s.current_track.as_ref(), Some(&c));
    assert_eq!(s.position, s.duration);
    assert_eq!(s.position, Duration::from_secs(180));
}

#[test]
fn resume_after_end_restarts_from_the_beginning() {
    let mut ctl = controller();
    play(&mut ctl, &track(5, "solo"), None);
    ctl.handle_event(MediaEvent::Ended);
    assert_eq!(ctl.session().position, Duration::from_secs(180));

    ctl.toggle_play();
    ctl.pump();
    assert!(ctl.session().is_playing());
    assert_eq!(ctl.session().position, Duration::ZERO);
    assert!(ctl.output().calls.contains(&Call::Seek(Duration::ZERO)));
}

#[test]
fn set_volume_clamps_into_unit_range() {
    let mut ctl = controller();
    for (input, expected) in [
        (1.4, 1.0),
        (-0.2, 0.0),
        (0.0, 0.0),
        (0.35, 0.35),
        (1.0, 1.0),
        (f32::INFINITY, 1.0),
        (f32::NEG_INFINITY, 0.0),
    ] {
        ctl.set_volume(input);
        assert_eq!(ctl.session().volume, expected, "input {input}");
        assert_eq!(ctl.output().calls.last(), Some(&Call::Volume(expected)));
    }
}

#[test]
fn set_volume_ignores_nan() {
    let mut ctl = controller();
    ctl.set_volume(0.3);
    ctl.set_volume(f32::NAN);
    assert_eq!(ctl.session().volume, 0.3);
}

#[test]
fn volume_persists_across_track_changes() {
    let (a, _, _, pl) = abc();
    let mut ctl = controller();
    ctl.set_volume(0.25);
    play(&mut ctl, &a, Some(&pl));
    ctl.play_next();
    ctl.pump();
    assert_eq!(ctl.session().volume, 0.25);
    assert_eq!(ctl.output().calls.iter().filter(|c| matches!(c, Call::Volume(_))).count(), 2);
}

#[test]
fn seek_clamps_to_known_duration() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    for (input, expected) in [
        (-3.0, 0.0),
        (0.0, 0.0),
        (42.5, 42.5),
        (180.0, 180.0),
        (999.0, 180.0),
        (f64::INFINITY, 180.0),
        (f64::NAN, 0.0),
    ] {
        ctl.seek(input);
        assert_eq!(
            ctl.session().position,
            Duration::from_secs_f64(expected),
            "input {input}"
        );
    }
}

#[test]
fn seek_keeps_play_state() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    ctl.seek(30.0);
    assert!(ctl.session().is_playing());

    ctl.toggle_play();
    ctl.seek(60.0);
    assert_eq!(ctl.session().state, PlayerState::Paused);
    assert_eq!(ctl.output().calls.last(), Some(&Call::Seek(Duration::from_secs(60))));
}

#[test]
fn seek_with_unknown_duration_passes_target_through() {
    let mut ctl = controller();
    ctl.output_mut().defer = true;
    ctl.play_song(track(1, "a"), None);
    ctl.seek(12.0);
    assert_eq!(ctl.session().position, Duration::from_secs(12));
    assert_eq!(ctl.output().calls.last(), Some(&Call::Seek(Duration::from_secs(12))));

    ctl.seek(-3.0);
    assert_eq!(ctl.session().position, Duration::ZERO);
}

#[test]
fn seek_by_with_unknown_duration_moves_forward() {
    let mut ctl = Controller::new(ScriptedOutput::default(), 0.8);
    play(&mut ctl, &track(1, "a"), None);
    assert_eq!(ctl.session().duration, Duration::ZERO);

    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(40)));
    ctl.seek_by(5.0);
    assert_eq!(ctl.session().position, Duration::from_secs(45));
    assert_eq!(ctl.output().calls.last(), Some(&Call::Seek(Duration::from_secs(45))));
    assert!(ctl.session().is_playing());
}

#[test]
fn source_lost_mid_track_pauses_and_keeps_track() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    ctl.output_mut().seek_breaks = true;

    ctl.seek(30.0);
    ctl.pump();
    let s = ctl.session();
    assert_eq!(s.state, PlayerState::Paused);
    assert!(!s.is_playing());
    assert_eq!(current_id(&ctl), Some(1));
    assert_eq!(s.last_error.as_deref(), Some("cannot reopen /music/a.mp3"));
}

#[test]
fn interruption_without_track_is_ignored() {
    let mut ctl = controller();
    ctl.handle_event(MediaEvent::Interrupted("gone".into()));
    assert_eq!(ctl.session(), &PlaybackSession::new(0.8));
}

#[test]
fn seek_by_is_relative_to_position() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    ctl.seek(100.0);
    ctl.seek_by(-30.0);
    assert_eq!(ctl.session().position, Duration::from_secs(70));
    ctl.seek_by(500.0);
    assert_eq!(ctl.session().position, Duration::from_secs(180));
}

#[test]
fn commands_without_a_track_are_no_ops() {
    let mut ctl = controller();
    ctl.toggle_play();
    ctl.seek(10.0);
    ctl.play_next();
    ctl.play_prev();
    ctl.pump();

    assert_eq!(ctl.session(), &PlaybackSession::new(0.8));
    assert_eq!(ctl.output().calls, vec![Call::Volume(0.8)]);
}

#[test]
fn toggle_pauses_and_resumes() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);

    ctl.toggle_play();
    assert_eq!(ctl.session().state, PlayerState::Paused);
    assert_eq!(ctl.output().calls.last(), Some(&Call::Pause));

    ctl.toggle_play();
    ctl.pump();
    assert_eq!(ctl.session().state, PlayerState::Playing);
}

#[test]
fn failed_start_absorbs_into_paused_and_keeps_track() {
    let mut ctl = controller();
    ctl.output_mut().broken.push("/music/bad.mp3".to_string());
    let bad = track(7, "bad");

    play(&mut ctl, &bad, None);
    let s = ctl.session();
    assert_eq!(s.state, PlayerState::Paused);
    assert!(!s.is_playing());
    assert_eq!(s.current_track.as_ref(), Some(&bad));
    assert!(s.last_error.as_deref().unwrap().contains("bad.mp3"));
}

#[test]
fn failed_resume_stays_paused() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    ctl.toggle_play();

    ctl.output_mut().defer = true;
    ctl.toggle_play();
    let ticket = ctl.output().last_ticket();
    ctl.handle_event(MediaEvent::PlayFailed {
        ticket,
        reason: "device gone".to_string(),
    });
    assert_eq!(ctl.session().state, PlayerState::Paused);
    assert_eq!(ctl.session().last_error.as_deref(), Some("device gone"));
}

#[test]
fn successful_start_clears_previous_error() {
    let mut ctl = controller();
    ctl.output_mut().broken.push("/music/bad.mp3".to_string());
    play(&mut ctl, &track(7, "bad"), None);
    assert!(ctl.session().last_error.is_some());

    play(&mut ctl, &track(8, "good"), None);
    assert!(ctl.session().last_error.is_none());
    assert!(ctl.session().is_playing());
}

#[test]
fn failure_on_auto_advance_stops_on_the_broken_track() {
    let (a, b, _, pl) = abc();
    let mut ctl = controller();
    ctl.output_mut().broken.push("/music/b.mp3".to_string());
    play(&mut ctl, &a, Some(&pl));

    ctl.handle_event(MediaEvent::Ended);
    ctl.pump();
    let s = ctl.session();
    assert_eq!(s.current_track.as_ref(), Some(&b));
    assert_eq!(s.current_index, Some(1));
    assert_eq!(s.state, PlayerState::Paused);
}

#[test]
fn superseded_start_completion_is_ignored() {
    let mut ctl = controller();
    ctl.output_mut().defer = true;

    ctl.play_song(track(1, "a"), None);
    let first = ctl.output().last_ticket();
    ctl.play_song(track(2, "b"), None);
    let second = ctl.output().last_ticket();
    assert_ne!(first, second);

    ctl.handle_event(MediaEvent::PlayStarted(first));
    assert_eq!(ctl.session().state, PlayerState::Loading);

    ctl.handle_event(MediaEvent::PlayStarted(second));
    assert_eq!(ctl.session().state, PlayerState::Playing);
    assert_eq!(current_id(&ctl), Some(2));
}

#[test]
fn toggle_while_loading_cancels_the_start() {
    let mut ctl = controller();
    ctl.output_mut().defer = true;
    ctl.play_song(track(1, "a"), None);
    let ticket = ctl.output().last_ticket();

    ctl.toggle_play();
    assert_eq!(ctl.session().state, PlayerState::Paused);

    ctl.handle_event(MediaEvent::PlayStarted(ticket));
    assert_eq!(ctl.session().state, PlayerState::Paused);
}

#[test]
fn new_track_resets_position_and_duration() {
    let (a, _, _, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));
    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(50)));
    assert_eq!(ctl.session().position, Duration::from_secs(50));

    ctl.output_mut().defer = true;
    ctl.play_next();
    assert_eq!(ctl.session().position, Duration::ZERO);
    assert_eq!(ctl.session().duration, Duration::ZERO);
}

#[test]
fn time_updates_clamp_once_duration_is_known() {
    let mut ctl = controller();
    ctl.output_mut().defer = true;
    ctl.play_song(track(1, "a"), None);

    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(5)));
    assert_eq!(ctl.session().position, Duration::from_secs(5));

    ctl.handle_event(MediaEvent::MetadataLoaded(Some(Duration::from_secs(3))));
    assert_eq!(ctl.session().position, Duration::from_secs(3));

    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(9)));
    assert_eq!(ctl.session().position, Duration::from_secs(3));
}

#[test]
fn unknown_duration_reports_zero() {
    let mut ctl = Controller::new(ScriptedOutput::default(), 1.0);
    play(&mut ctl, &track(1, "a"), None);
    assert_eq!(ctl.session().duration, Duration::ZERO);
    assert_eq!(ctl.session().progress(), 0.0);
}

#[test]
fn events_without_a_track_are_ignored() {
    let mut ctl = controller();
    ctl.handle_event(MediaEvent::TimeUpdate(Duration::from_secs(3)));
    ctl.handle_event(MediaEvent::MetadataLoaded(Some(Duration::from_secs(3))));
    ctl.handle_event(MediaEvent::Ended);
    assert_eq!(ctl.session(), &PlaybackSession::new(0.8));
}

#[test]
fn shutdown_stops_output_and_keeps_track() {
    let mut ctl = controller();
    play(&mut ctl, &track(1, "a"), None);
    ctl.shutdown(Duration::ZERO);

    assert_eq!(ctl.output().calls.last(), Some(&Call::Stop));
    assert!(!ctl.session().is_playing());
    assert_eq!(current_id(&ctl), Some(1));
}

#[test]
fn session_neighbour_helpers_follow_index() {
    let (a, b, c, pl) = abc();
    let mut ctl = controller();
    play(&mut ctl, &a, Some(&pl));
    assert!(ctl.session().has_next());
    assert!(!ctl.session().has_prev());

    play(&mut ctl, &b, None);
    assert!(ctl.session().has_next());
    assert!(ctl.session().has_prev());

    play(&mut ctl, &c, None);
    assert!(!ctl.session().has_next());
}

#[test]
fn playlist_rejects_empty_input() {
    assert!(Playlist::new(Vec::new()).is_none());
    let (_, _, _, pl) = abc();
    assert!(pl.contains(2));
    assert!(!pl.contains(4));
}
