//! UI rendering helpers for the terminal user interface.
//!
//! Everything here reads the `App` and a snapshot of the playback session;
//! nothing in this module changes state.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, View};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{Album, Track, display_from_fields};
use crate::player::{PlaybackSession, PlayerState};

/// Key legend, in display order. `H/L` and `-/+` are filled from config.
const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "open/play"),
    ("esc", "back"),
    ("space/p", "play/pause"),
    ("h/l", "prev/next song"),
    ("H/L", ""),
    ("-/+", ""),
    ("c", "current album"),
    ("/", "filter"),
    ("K", "metadata"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating the configured steps.
fn controls_text(controls: &ControlsSettings) -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| match *k {
            "H/L" => format!("[H/L] scrub -/+{}s", controls.scrub_seconds),
            "-/+" => format!(
                "[-/+] volume -/+{}%",
                (controls.volume_step * 100.0).round() as i64
            ),
            _ => format!("[{}] {}", k, v),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `m:ss`.
fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    display_from_fields(
        track,
        &ui.now_playing_track_fields,
        &ui.now_playing_track_separator,
    )
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
///
/// A zero `total` means the length is not known yet; total and remaining
/// are then left out.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let total = (!total.is_zero()).then_some(total);

    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_time(elapsed)),
            TimeField::Total => total.map(format_time),
            TimeField::Remaining => {
                total.map(|t| format!("-{}", format_time(t.saturating_sub(elapsed))))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn volume_text(volume: f32) -> String {
    format!("vol {:>3}%", (volume * 100.0).round() as i64)
}

/// Glyph for the play/pause button: what pressing it would do.
fn play_pause_glyph(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Playing | PlayerState::Loading => "⏸",
        PlayerState::Idle | PlayerState::Paused | PlayerState::Ended => "▶",
    }
}

/// Window of `height` rows over `total` items that keeps `sel_pos` centered
/// when possible. Returns `(start, end, selected row within the window)`.
fn visible_window(total: usize, height: usize, sel_pos: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, sel_pos);
    }
    let half = height / 2;
    let mut start = sel_pos.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, sel_pos - start)
}

/// Uppercase the characters of `text` at `positions` (fuzzy match highlight).
fn highlight_positions(text: &str, positions: &[usize]) -> String {
    let mut rendered = String::with_capacity(text.len());
    let mut pos_iter = positions.iter().copied().peekable();
    for (ci, ch) in text.chars().enumerate() {
        if pos_iter.peek() == Some(&ci) {
            rendered.extend(ch.to_uppercase());
            pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

fn album_label(album: &Album) -> String {
    let mut label = album.name.clone();
    if let Some(artist) = album.artist.as_deref().filter(|a| !a.trim().is_empty()) {
        label.push_str(" - ");
        label.push_str(artist);
    }
    label
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }
    format!("{}:{:02} ({}s)", total_secs / 60, total_secs % 60, total_secs)
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, controls: &ControlsSettings) {
    let session = app.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    draw_header(frame, app, ui_settings, chunks[0]);
    match app.view {
        View::Albums => draw_album_list(frame, app, &session, chunks[1]),
        View::Album(_) => draw_tracklist(frame, app, &session, chunks[1]),
    }
    if app.metadata_window {
        draw_metadata(frame, app, chunks[1]);
    }
    draw_player_bar(frame, &session, ui_settings, chunks[2]);

    let footer = Paragraph::new(controls_text(controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding::left(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_header(frame: &mut Frame, app: &App, ui: &UiSettings, area: Rect) {
    let mut nav = vec![Span::raw(ui.header_text.as_str()).bold(), Span::raw(" • ")];
    match app.open_album() {
        Some(album) => {
            nav.push(Span::raw("Albums › ").dim());
            nav.push(Span::raw(album_label(album)));
        }
        None => nav.push(Span::raw("Albums")),
    }

    let q = app.filter_query.trim();
    if app.view == View::Albums && (app.filter_mode || !q.is_empty()) {
        let cursor = if app.filter_mode { "_" } else { "" };
        nav.push(Span::raw(format!(" • FILTER: {q}{cursor}")).italic());
    }

    let header = Paragraph::new(Line::from(nav)).block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::left(1)),
    );
    frame.render_widget(header, area);
}

fn render_list(frame: &mut Frame, area: Rect, title: String, items: Vec<ListItem>, sel: Option<usize>) {
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(sel);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_album_list(frame: &mut Frame, app: &App, session: &PlaybackSession, area: Rect) {
    let display = app.display_indices();
    let albums = app.albums();
    let q = app.filter_query.trim();
    let playing_album = session.current_track.as_ref().and_then(|t| t.album_id);

    let height = area.height.saturating_sub(2) as usize;
    let sel_pos = display
        .iter()
        .position(|&i| i == app.selected_album)
        .unwrap_or(0);
    let (start, end, sel_in_window) = visible_window(display.len(), height, sel_pos);

    // Only build items for the visible window.
    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let album = &albums[i];
            let label = album_label(album);
            let label = match App::fuzzy_match_positions(&label, q) {
                Some(positions) if !q.is_empty() => highlight_positions(&label, &positions),
                _ => label,
            };
            let marker = if playing_album == Some(album.id) { "♪ " } else { "  " };
            let count = format!("  ({} songs)", album.songs.len());
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(label),
                Span::raw(count).dim(),
            ]))
        })
        .collect();

    let title = format!(" albums ({}/{}) ", display.len(), albums.len());
    let sel = (!display.is_empty()).then_some(sel_in_window);
    render_list(frame, area, title, items, sel);
}

fn draw_tracklist(frame: &mut Frame, app: &App, session: &PlaybackSession, area: Rect) {
    let Some(album) = app.open_album() else {
        render_list(frame, area, " album ".to_string(), Vec::new(), None);
        return;
    };
    let playing = session.current_track.as_ref().map(|t| t.id);

    let height = area.height.saturating_sub(2) as usize;
    let (start, end, sel_in_window) =
        visible_window(album.songs.len(), height, app.selected_song);

    let items: Vec<ListItem> = album.songs[start..end]
        .iter()
        .enumerate()
        .map(|(n, song)| {
            let no = song.track_no.map_or(start + n + 1, |t| t as usize);
            let is_current = playing == Some(song.id);
            let marker = if is_current {
                play_pause_glyph(session.state)
            } else {
                " "
            };
            let mut spans = vec![
                Span::raw(format!("{marker} {no:>2}. ")),
                Span::raw(song.title.as_str()),
            ];
            if let Some(d) = song.duration {
                spans.push(Span::raw(format!("  {}", format_time(d))).dim());
            }
            let line = Line::from(spans);
            ListItem::new(if is_current { line.bold() } else { line })
        })
        .collect();

    let title = format!(" {} ", album_label(album));
    let sel = (!album.songs.is_empty()).then_some(sel_in_window);
    render_list(frame, area, title, items, sel);
}

fn draw_metadata(frame: &mut Frame, app: &App, list_area: Rect) {
    // Keep the popup inside the list area so it doesn't cover the player bar.
    let popup_area = centered_rect_sized(72, 10, list_area);
    frame.render_widget(Clear, popup_area);

    let meta = match app.view {
        View::Albums => match app.highlighted_album() {
            Some(album) => format!(
                "Album: {}\nArtist: {}\nSongs: {}\nDuration: {}\nCover: {}\nDir: {}",
                album.name,
                album.artist.as_deref().unwrap_or("-"),
                album.songs.len(),
                format_duration_ceil(album.total_duration()),
                album.cover.as_ref().map_or("-".to_string(), |c| c.to_string()),
                if album.dir.as_os_str().is_empty() {
                    "-".to_string()
                } else {
                    album.dir.display().to_string()
                },
            ),
            None => "No album selected".to_string(),
        },
        View::Album(_) => match app
            .open_album()
            .and_then(|a| a.songs.get(app.selected_song).map(|s| (a, s)))
        {
            Some((album, song)) => format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nSource: {}",
                song.title,
                album.artist.as_deref().unwrap_or("-"),
                album.name,
                format_duration_ceil(song.duration),
                song.source,
            ),
            None => "No song selected".to_string(),
        },
    };

    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(Padding::left(1))
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

fn draw_player_bar(frame: &mut Frame, session: &PlaybackSession, ui: &UiSettings, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" now playing ")
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let transport = |enabled: bool, glyph: &'static str| {
        let s = Span::raw(glyph);
        if enabled { s } else { s.dim() }
    };
    let loaded = session.current_track.is_some();

    let mut line = vec![
        transport(session.has_prev(), "⏮"),
        Span::raw(" "),
        transport(loaded, play_pause_glyph(session.state)),
        Span::raw(" "),
        transport(session.has_next(), "⏭"),
        Span::raw("  "),
    ];
    match &session.current_track {
        Some(track) => {
            line.push(Span::raw(now_playing_track_text(track, ui)).bold());
            if let Some(artist) = track.artist.as_deref().filter(|a| !a.trim().is_empty()) {
                line.push(Span::raw(format!("  {artist}")).dim());
            }
        }
        None => line.push(Span::raw("Nothing playing").dim()),
    }
    if session.state == PlayerState::Loading {
        line.push(Span::raw("  loading…").italic());
    }
    if let Some(err) = &session.last_error {
        line.push(Span::raw(format!("  ⚠ {err}")).red());
    }
    frame.render_widget(Paragraph::new(Line::from(line)), rows[0]);

    let label = if loaded {
        now_playing_time_text(session.position, session.duration, ui).unwrap_or_default()
    } else {
        String::new()
    };
    let gauge_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(10)])
        .split(rows[1]);
    let gauge = Gauge::default()
        .ratio(session.progress())
        .label(label)
        .use_unicode(true);
    frame.render_widget(gauge, gauge_row[0]);
    frame.render_widget(
        Paragraph::new(volume_text(session.volume)).alignment(Alignment::Right),
        gauge_row[1],
    );
}

#[cfg(test)]
mod tests;
