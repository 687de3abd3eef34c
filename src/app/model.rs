//! Application model: `App` and the `View` it is showing.
//!
//! The `App` holds the library, what the cursor points at on each page, the
//! filter state, and a handle to the playback session published by the
//! player thread. It never mutates playback itself; actions that should play
//! something return a `PlayRequest` for the runtime to send.

use crate::audio::SessionHandle;
use crate::library::{Album, AlbumId, LibraryStore, Track};
use crate::player::{PlaybackSession, Playlist};

/// Which page is on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    /// The album grid/list.
    #[default]
    Albums,
    /// The tracklist of one album.
    Album(AlbumId),
}

/// A song to start, together with the queue it should play in.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub track: Track,
    pub playlist: Option<Playlist>,
}

/// The main application model.
pub struct App {
    store: Box<dyn LibraryStore>,
    lower_names: Vec<String>,

    pub view: View,
    /// Index into `albums()` of the highlighted album.
    pub selected_album: usize,
    /// Index into the open album's songs of the highlighted song.
    pub selected_song: usize,

    pub filter_mode: bool,
    pub filter_query: String,
    pub metadata_window: bool,

    session: Option<SessionHandle>,
}

impl App {
    /// Create a new `App` over the albums of `store`.
    pub fn new(store: Box<dyn LibraryStore>) -> Self {
        // Lowercase once so filtering stays cheap on every keystroke.
        let lower_names = store
            .albums()
            .iter()
            .map(|a| album_search_text(a).to_lowercase())
            .collect();

        Self {
            store,
            lower_names,
            view: View::Albums,
            selected_album: 0,
            selected_song: 0,
            filter_mode: false,
            filter_query: String::new(),
            metadata_window: false,
            session: None,
        }
    }

    /// Attach the session published by the player thread.
    pub fn set_session_handle(&mut self, h: SessionHandle) {
        self.session = Some(h);
    }

    /// Snapshot of the playback session, or a fresh one when none is attached.
    pub fn session(&self) -> PlaybackSession {
        self.session
            .as_ref()
            .and_then(|h| h.lock().ok().map(|s| s.clone()))
            .unwrap_or_default()
    }

    pub fn albums(&self) -> &[Album] {
        self.store.albums()
    }

    pub fn has_albums(&self) -> bool {
        !self.albums().is_empty()
    }

    /// The album whose page is open.
    pub fn open_album(&self) -> Option<&Album> {
        match self.view {
            View::Albums => None,
            View::Album(id) => self.store.album(id),
        }
    }

    /// The album highlighted on the album list.
    pub fn highlighted_album(&self) -> Option<&Album> {
        self.albums().get(self.selected_album)
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Indices into `albums()` that pass the current filter, in library order.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.lower_names.len()).collect();
        }
        let query_lower = query.to_lowercase();
        (0..self.lower_names.len())
            .filter(|&i| fuzzy_match_positions_lower(&self.lower_names[i], &query_lower).is_some())
            .collect()
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars().flat_map(char::to_lowercase) {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_lowercase().eq(std::iter::once(qc)) => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Move the cursor down, wrapping at the end.
    pub fn next(&mut self) {
        match self.view {
            View::Albums => {
                if let Some(i) = step_in(&self.display_indices(), self.selected_album, true) {
                    self.selected_album = i;
                }
            }
            View::Album(_) => {
                let n = self.open_album().map_or(0, |a| a.songs.len());
                if n > 0 {
                    self.selected_song = (self.selected_song + 1) % n;
                }
            }
        }
    }

    /// Move the cursor up, wrapping at the start.
    pub fn prev(&mut self) {
        match self.view {
            View::Albums => {
                if let Some(i) = step_in(&self.display_indices(), self.selected_album, false) {
                    self.selected_album = i;
                }
            }
            View::Album(_) => {
                let n = self.open_album().map_or(0, |a| a.songs.len());
                if n > 0 {
                    self.selected_song = (self.selected_song + n - 1) % n;
                }
            }
        }
    }

    pub fn select_first(&mut self) {
        match self.view {
            View::Albums => {
                if let Some(&first) = self.display_indices().first() {
                    self.selected_album = first;
                }
            }
            View::Album(_) => self.selected_song = 0,
        }
    }

    pub fn select_last(&mut self) {
        match self.view {
            View::Albums => {
                if let Some(&last) = self.display_indices().last() {
                    self.selected_album = last;
                }
            }
            View::Album(_) => {
                let n = self.open_album().map_or(0, |a| a.songs.len());
                self.selected_song = n.saturating_sub(1);
            }
        }
    }

    /// `enter`: open the highlighted album, or on an album page play the
    /// highlighted song with the whole album as its playlist.
    pub fn activate(&mut self) -> Option<PlayRequest> {
        match self.view {
            View::Albums => {
                if !self.display_indices().contains(&self.selected_album) {
                    return None;
                }
                let id = self.highlighted_album()?.id;
                self.view = View::Album(id);
                self.selected_song = 0;
                self.metadata_window = false;
                None
            }
            View::Album(_) => self.selection_request(),
        }
    }

    /// What "play" means for the cursor: the highlighted song on an album
    /// page, or the first song of the highlighted album on the list. Either
    /// way the album is the playlist.
    pub fn selection_request(&self) -> Option<PlayRequest> {
        let (album, song) = match self.view {
            View::Albums => {
                if !self.display_indices().contains(&self.selected_album) {
                    return None;
                }
                let album = self.highlighted_album()?;
                (album, album.songs.first()?)
            }
            View::Album(_) => {
                let album = self.open_album()?;
                (album, album.songs.get(self.selected_song)?)
            }
        };
        Some(PlayRequest {
            track: album.track(song),
            playlist: album.playlist(),
        })
    }

    /// Leave the album page. Returns `false` when already on the album list.
    pub fn back(&mut self) -> bool {
        match self.view {
            View::Albums => false,
            View::Album(id) => {
                if let Some(i) = self.albums().iter().position(|a| a.id == id) {
                    self.selected_album = i;
                }
                self.view = View::Albums;
                self.metadata_window = false;
                true
            }
        }
    }

    /// Open the album of whatever is playing and put the cursor on the song.
    ///
    /// Returns `false` when nothing is loaded or the track has no album in
    /// this library.
    pub fn jump_to_current_album(&mut self) -> bool {
        let session = self.session();
        let Some(track) = session.current_track else {
            return false;
        };
        let album = match track.album_id {
            Some(id) => self.store.album(id),
            None => self.store.album_of_song(track.id),
        };
        let Some(album) = album else {
            return false;
        };

        let (album_id, song_pos) = (
            album.id,
            album.songs.iter().position(|s| s.id == track.id),
        );
        if let Some(i) = self.albums().iter().position(|a| a.id == album_id) {
            self.selected_album = i;
        }
        self.clear_filter();
        self.view = View::Album(album_id);
        self.selected_song = song_pos.unwrap_or(0);
        true
    }

    /// Enter filter mode on the album list.
    pub fn enter_filter_mode(&mut self) {
        if self.view != View::Albums {
            return;
        }
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    /// Stop editing the query but keep the filter applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Keep `selected_album` within the filtered view, moving it to the first
    /// visible album otherwise.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected_album = 0,
            Some(&first) if !display.contains(&self.selected_album) => {
                self.selected_album = first;
            }
            Some(_) => {}
        }
    }
}

/// Text matched by the album filter: the name, then the artist if any.
fn album_search_text(album: &Album) -> String {
    match &album.artist {
        Some(artist) => format!("{} {}", album.name, artist),
        None => album.name.clone(),
    }
}

fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
    if query_lower.is_empty() {
        return Some(Vec::new());
    }

    let mut positions: Vec<usize> = Vec::new();
    let mut title_iter = title_lower.chars().enumerate();

    for qc in query_lower.chars() {
        loop {
            match title_iter.next() {
                Some((ti, tc)) if tc == qc => {
                    positions.push(ti);
                    break;
                }
                Some(_) => continue,
                None => return None,
            }
        }
    }

    Some(positions)
}

/// Neighbour of `current` within `order`, wrapping. Falls back to the first
/// (forward) or last (backward) entry when `current` is not in `order`.
fn step_in(order: &[usize], current: usize, forward: bool) -> Option<usize> {
    if order.is_empty() {
        return None;
    }
    let n = order.len();
    let next = match (order.iter().position(|&i| i == current), forward) {
        (Some(p), true) => (p + 1) % n,
        (Some(p), false) => (p + n - 1) % n,
        (None, true) => 0,
        (None, false) => n - 1,
    };
    Some(order[next])
}
