//! In-memory playback state: the fetched catalog plus the current
//! selection. Mutation goes through the event handler in the UI layer; the
//! render functions only read.

use tracing::warn;

use crate::catalog::{Bitrate, Folder, FolderFilter, Song};

#[derive(Debug, Default)]
pub struct PlayerState {
    pub folders: Vec<Folder>,
    pub songs: Vec<Song>,
    pub filter: FolderFilter,
    /// Resolved against `songs` on every use; cleared when a refresh drops
    /// the row it pointed at.
    pub current_song_id: Option<String>,
    pub bitrate: Bitrate,
    pub playing: bool,
}

impl PlayerState {
    pub fn new(bitrate: Bitrate) -> Self {
        Self {
            bitrate,
            ..Default::default()
        }
    }

    /// Swap in a freshly fetched catalog. Returns true when the previous
    /// selection no longer exists and had to be dropped.
    pub fn set_catalog(&mut self, folders: Vec<Folder>, songs: Vec<Song>) -> bool {
        self.folders = folders;
        self.songs = songs;

        let dangling = match &self.current_song_id {
            Some(id) => !self.songs.iter().any(|s| &s.id == id),
            None => false,
        };
        if dangling {
            self.current_song_id = None;
        }
        dangling
    }

    /// Songs visible under the active folder filter, in fetch order.
    pub fn filtered_songs(&self) -> Vec<&Song> {
        self.songs.iter().filter(|s| self.filter.matches(s)).collect()
    }

    pub fn selected_song(&self) -> Option<&Song> {
        let id = self.current_song_id.as_ref()?;
        self.songs.iter().find(|s| &s.id == id)
    }

    /// Index of the selected song in the unfiltered list. Transport keys
    /// walk the whole catalog regardless of the active filter.
    pub fn current_index(&self) -> Option<usize> {
        let id = self.current_song_id.as_ref()?;
        self.songs.iter().position(|s| &s.id == id)
    }

    /// Song the Next key lands on: one past the current, wrapping to the
    /// first; the first when nothing is selected; None on an empty catalog.
    pub fn next_song(&self) -> Option<&Song> {
        if self.songs.is_empty() {
            return None;
        }
        let next = match self.current_index() {
            Some(i) if i + 1 < self.songs.len() => i + 1,
            _ => 0,
        };
        self.songs.get(next)
    }

    /// Song the Previous key lands on: one before the current, wrapping to
    /// the last; the last when nothing is selected; None on an empty catalog.
    pub fn prev_song(&self) -> Option<&Song> {
        if self.songs.is_empty() {
            return None;
        }
        let prev = match self.current_index() {
            Some(i) if i > 0 => i - 1,
            _ => self.songs.len() - 1,
        };
        self.songs.get(prev)
    }

    /// Pick the stream URL for a song at the active tier. A missing tier
    /// falls back to whatever the song does have; a song with no URLs at all
    /// yields None and the caller reports it.
    pub fn resolve_source(&self, song: &Song) -> Option<(String, Bitrate)> {
        if let Some(url) = song.source_url(self.bitrate) {
            return Some((url.to_string(), self.bitrate));
        }

        let fallback = self.bitrate.other();
        if let Some(url) = song.source_url(fallback) {
            warn!(
                "'{}' has no {} stream, falling back to {}",
                song.title,
                self.bitrate.label(),
                fallback.label()
            );
            return Some((url.to_string(), fallback));
        }

        None
    }
}

/// Seek-bar clock rendering: minutes never roll into hours, seconds always
/// two digits.
pub fn format_time(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}
