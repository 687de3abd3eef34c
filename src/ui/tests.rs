use super::*;
use crate::app::App;
use crate::library::{ManifestLibrary, SourceRef};
use ratatui::{Terminal, backend::TestBackend};
use std::sync::{Arc, Mutex};

fn ui() -> UiSettings {
    UiSettings::default()
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn format_time_is_minutes_and_padded_seconds() {
    assert_eq!(format_time(Duration::ZERO), "0:00");
    assert_eq!(format_time(secs(7)), "0:07");
    assert_eq!(format_time(Duration::from_millis(65_900)), "1:05");
    assert_eq!(format_time(secs(3600)), "60:00");
}

#[test]
fn time_text_follows_configured_fields() {
    let mut ui = ui();
    assert_eq!(
        now_playing_time_text(secs(30), secs(200), &ui).as_deref(),
        Some("0:30 / 3:20")
    );

    ui.now_playing_time_fields = vec![TimeField::Remaining, TimeField::Elapsed];
    ui.now_playing_time_separator = " | ".into();
    assert_eq!(
        now_playing_time_text(secs(30), secs(200), &ui).as_deref(),
        Some("-2:50 | 0:30")
    );

    ui.now_playing_time_fields.clear();
    assert_eq!(now_playing_time_text(secs(30), secs(200), &ui), None);
}

#[test]
fn time_text_omits_total_until_known() {
    let mut ui = ui();
    ui.now_playing_time_fields = vec![TimeField::Elapsed, TimeField::Total, TimeField::Remaining];
    assert_eq!(
        now_playing_time_text(secs(12), Duration::ZERO, &ui).as_deref(),
        Some("0:12")
    );

    ui.now_playing_time_fields = vec![TimeField::Total];
    assert_eq!(now_playing_time_text(secs(12), Duration::ZERO, &ui), None);
}

#[test]
fn controls_text_uses_configured_steps() {
    let controls = ControlsSettings {
        scrub_seconds: 10,
        volume_step: 0.1,
    };
    let text = controls_text(&controls);
    assert!(text.starts_with("[j/k] up/down"));
    assert!(text.contains("[H/L] scrub -/+10s"));
    assert!(text.contains("[-/+] volume -/+10%"));
    assert!(text.ends_with("[q] quit"));
}

#[test]
fn visible_window_centers_selection() {
    assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
    assert_eq!(visible_window(100, 10, 0), (0, 10, 0));
    assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
    assert_eq!(visible_window(100, 10, 99), (90, 100, 9));
    assert_eq!(visible_window(3, 0, 1), (0, 3, 1));
}

#[test]
fn highlight_uppercases_matched_chars() {
    assert_eq!(highlight_positions("paranoid", &[0, 4]), "ParaNoid");
    assert_eq!(highlight_positions("abc", &[]), "abc");
}

#[test]
fn play_pause_glyph_shows_action() {
    assert_eq!(play_pause_glyph(PlayerState::Playing), "⏸");
    assert_eq!(play_pause_glyph(PlayerState::Loading), "⏸");
    assert_eq!(play_pause_glyph(PlayerState::Paused), "▶");
    assert_eq!(play_pause_glyph(PlayerState::Idle), "▶");
}

#[test]
fn volume_text_is_percent() {
    assert_eq!(volume_text(0.8), "vol  80%");
    assert_eq!(volume_text(1.0), "vol 100%");
    assert_eq!(volume_text(0.0), "vol   0%");
}

#[test]
fn duration_ceil_rounds_partial_seconds_up() {
    assert_eq!(format_duration_ceil(None), "-");
    assert_eq!(format_duration_ceil(Some(Duration::from_millis(61_200))), "1:02 (62s)");
}

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
    terminal
        .draw(|f| draw(f, app, &ui(), &ControlsSettings::default()))
        .unwrap();
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

const MANIFEST: &str = r#"
[[albums]]
id = 1
name = "Paranoid"
artist = "Black Sabbath"

[[albums.songs]]
id = 11
title = "War Pigs"
file = "/songs/war-pigs.mp3"

[[albums.songs]]
id = 12
title = "Iron Man"
file = "/songs/iron-man.mp3"
"#;

#[test]
fn draws_album_list_and_idle_player_bar() {
    let app = App::new(Box::new(ManifestLibrary::parse(MANIFEST).unwrap()));
    let screen = render(&app);
    assert!(screen.contains("albums (1/1)"));
    assert!(screen.contains("Paranoid - Black Sabbath"));
    assert!(screen.contains("Nothing playing"));
}

#[test]
fn draws_tracklist_with_now_playing_and_error() {
    let mut app = App::new(Box::new(ManifestLibrary::parse(MANIFEST).unwrap()));
    app.activate();

    let album = app.albums()[0].clone();
    let mut session = PlaybackSession::new(0.5);
    session.current_track = Some(album.track(&album.songs[1]));
    session.state = PlayerState::Paused;
    session.position = secs(75);
    session.duration = secs(356);
    session.last_error = Some("cannot open".into());
    app.set_session_handle(Arc::new(Mutex::new(session)));

    let screen = render(&app);
    assert!(screen.contains("War Pigs"));
    assert!(screen.contains("Iron Man"));
    assert!(screen.contains("1:15 / 5:56"));
    assert!(screen.contains("vol  50%"));
    assert!(screen.contains("cannot open"));
}

#[test]
fn track_text_uses_display_fields() {
    let mut ui = ui();
    let mut t = Track::standalone(1, "Orion", SourceRef::new("/m/orion.flac"));
    t.artist = Some("Metallica".into());
    assert_eq!(now_playing_track_text(&t, &ui), "Orion");

    ui.now_playing_track_fields = vec![
        crate::config::TrackDisplayField::Artist,
        crate::config::TrackDisplayField::Filename,
    ];
    assert_eq!(now_playing_track_text(&t, &ui), "Metallica - orion");
}
