//! The player application: owns the playback state and the audio backend,
//! turns key presses into state changes, and draws the whole screen every
//! loop iteration.

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc, time::sleep};
use tracing::{error, info, warn};

use super::events::{key_to_app_event, AppEvent};
use super::TerminalManager;
use crate::catalog::{CatalogStore, Folder, FolderFilter, Song};
use crate::player::{format_time, AudioBackend, PlayerState};

/// Results of spawned catalog fetches, drained by the run loop.
#[derive(Debug)]
enum FetchMessage {
    Catalog {
        folders: Vec<Folder>,
        songs: Vec<Song>,
    },
    Failed(String),
}

pub struct App {
    state: PlayerState,
    backend: Box<dyn AudioBackend>,
    store: Arc<CatalogStore>,

    // UI state
    list_state: ListState,
    folder_index: usize, // 0 = "All", 1.. = folders
    should_quit: bool,
    refreshing: bool,
    status_message: Option<(String, Instant)>,

    // Spawned fetch results
    fetch_tx: mpsc::UnboundedSender<FetchMessage>,
    fetch_rx: mpsc::UnboundedReceiver<FetchMessage>,
}

impl App {
    pub fn new(state: PlayerState, backend: Box<dyn AudioBackend>, store: Arc<CatalogStore>) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        let mut list_state = ListState::default();
        if !state.songs.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            state,
            backend,
            store,
            list_state,
            folder_index: 0,
            should_quit: false,
            refreshing: false,
            status_message: None,
            fetch_tx,
            fetch_rx,
        }
    }

    pub async fn run(&mut self, terminal: &mut TerminalManager) -> Result<()> {
        // Key handling stays on this task; spawned fetches report back
        // through the channel so the loop never waits on the network.
        while !self.should_quit {
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        if let Some(app_event) = key_to_app_event(key) {
                            self.handle_event(app_event).await?;
                        }
                    }
                }
            }

            while let Ok(message) = self.fetch_rx.try_recv() {
                self.handle_fetch(message);
            }

            self.handle_event(AppEvent::Tick).await?;

            terminal.draw(|f| self.render(f))?;

            sleep(Duration::from_millis(100)).await; // ~10 FPS
        }

        Ok(())
    }

    async fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Quit => {
                self.should_quit = true;
            }
            AppEvent::CursorUp => {
                self.move_selection(-1);
            }
            AppEvent::CursorDown => {
                self.move_selection(1);
            }
            AppEvent::PlayCursor => {
                let song_id = {
                    let visible = self.state.filtered_songs();
                    self.list_state
                        .selected()
                        .and_then(|i| visible.get(i).map(|s| s.id.clone()))
                };
                if let Some(id) = song_id {
                    self.play_song(&id).await?;
                }
            }
            AppEvent::TogglePlayPause => {
                if self.state.selected_song().is_none() {
                    return Ok(());
                }
                if self.state.playing {
                    self.backend.pause();
                    self.state.playing = false;
                    self.set_status("⏸️ Paused");
                } else {
                    self.backend.play();
                    self.state.playing = true;
                    self.set_status("▶️ Resumed");
                }
            }
            AppEvent::NextTrack => {
                let next_id = self.state.next_song().map(|s| s.id.clone());
                if let Some(id) = next_id {
                    self.play_song(&id).await?;
                }
            }
            AppEvent::PreviousTrack => {
                let prev_id = self.state.prev_song().map(|s| s.id.clone());
                if let Some(id) = prev_id {
                    self.play_song(&id).await?;
                }
            }
            AppEvent::ToggleBitrate => {
                self.state.bitrate = self.state.bitrate.other();
                self.set_status(&format!("🎚️ Bitrate: {}", self.state.bitrate.label()));
                // restart the current song on the new tier
                if let Some(id) = self.state.current_song_id.clone() {
                    self.play_song(&id).await?;
                }
            }
            AppEvent::NextFolder => {
                let tabs = self.state.folders.len() + 1;
                self.folder_index = (self.folder_index + 1) % tabs;
                self.apply_folder_filter();
            }
            AppEvent::PrevFolder => {
                let tabs = self.state.folders.len() + 1;
                self.folder_index = (self.folder_index + tabs - 1) % tabs;
                self.apply_folder_filter();
            }
            AppEvent::SeekPercent(pct) => {
                if let Some(total) = self.backend.duration() {
                    let target = total.mul_f64(f64::from(pct.min(100)) / 100.0);
                    if let Err(e) = self.backend.seek(target) {
                        self.set_status(&format!("❌ Seek failed: {e:#}"));
                    }
                }
            }
            AppEvent::SeekForward => {
                let mut target = self.backend.position() + Duration::from_secs(5);
                if let Some(total) = self.backend.duration() {
                    if target > total {
                        target = total;
                    }
                }
                if let Err(e) = self.backend.seek(target) {
                    self.set_status(&format!("❌ Seek failed: {e:#}"));
                }
            }
            AppEvent::SeekBack => {
                let target = self.backend.position().saturating_sub(Duration::from_secs(5));
                if let Err(e) = self.backend.seek(target) {
                    self.set_status(&format!("❌ Seek failed: {e:#}"));
                }
            }
            AppEvent::RefreshCatalog => {
                self.start_refresh();
            }
            AppEvent::Tick => {
                self.advance_if_finished().await?;
            }
        }

        Ok(())
    }

    /// Start a song by id: resolve its stream URL at the active tier, hand
    /// it to the backend, and mark it as the current selection.
    async fn play_song(&mut self, song_id: &str) -> Result<()> {
        let song = match self.state.songs.iter().find(|s| s.id == song_id) {
            Some(song) => song.clone(),
            None => return Ok(()),
        };

        let (url, tier) = match self.state.resolve_source(&song) {
            Some(resolved) => resolved,
            None => {
                warn!("no stream at any tier for '{}'", song.title);
                self.set_status(&format!("❌ No stream available for '{}'", song.title));
                return Ok(());
            }
        };

        match self.backend.load(&url).await {
            Ok(()) => {
                self.backend.play();
                self.state.current_song_id = Some(song.id.clone());
                self.state.playing = true;

                // keep the cursor on the song when it is visible
                let visible_pos = self
                    .state
                    .filtered_songs()
                    .iter()
                    .position(|s| s.id == song.id);
                if let Some(pos) = visible_pos {
                    self.list_state.select(Some(pos));
                }

                info!("playing '{}' at {}", song.title, tier.label());
                self.set_status(&format!("▶️ {} [{}]", song.title, tier.label()));
            }
            Err(e) => {
                error!("failed to start '{}': {:#}", song.title, e);
                self.state.playing = false;
                self.set_status(&format!("❌ Playback failed: {e:#}"));
            }
        }

        Ok(())
    }

    /// Natural end of track: a drained backend plus a still-set playing flag
    /// means nobody paused or stopped it, so move on like a Next press.
    async fn advance_if_finished(&mut self) -> Result<()> {
        if self.state.playing
            && self.state.current_song_id.is_some()
            && self.backend.is_finished()
        {
            let next_id = self.state.next_song().map(|s| s.id.clone());
            if let Some(id) = next_id {
                info!("track finished, advancing");
                self.play_song(&id).await?;
            }
        }
        Ok(())
    }

    fn start_refresh(&mut self) {
        if self.refreshing {
            return;
        }
        self.refreshing = true;
        self.set_status("🔄 Refreshing catalog...");

        let store = Arc::clone(&self.store);
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            match tokio::try_join!(store.list_folders(), store.list_songs()) {
                Ok((folders, songs)) => {
                    let _ = tx.send(FetchMessage::Catalog { folders, songs });
                }
                Err(e) => {
                    let _ = tx.send(FetchMessage::Failed(e.to_string()));
                }
            }
        });
    }

    fn handle_fetch(&mut self, message: FetchMessage) {
        match message {
            FetchMessage::Catalog { folders, songs } => {
                let dropped = self.state.set_catalog(folders, songs);
                if dropped {
                    // the playing row no longer exists; stop the audio too
                    self.backend.pause();
                    self.state.playing = false;
                }

                // re-anchor the folder filter against the new folder list
                self.folder_index = match &self.state.filter {
                    FolderFilter::All => 0,
                    FolderFilter::Folder(id) => {
                        match self.state.folders.iter().position(|f| &f.id == id) {
                            Some(i) => i + 1,
                            None => {
                                self.state.filter = FolderFilter::All;
                                0
                            }
                        }
                    }
                };
                self.clamp_cursor();

                self.refreshing = false;
                info!(
                    "catalog refreshed: {} folders, {} songs",
                    self.state.folders.len(),
                    self.state.songs.len()
                );
                self.set_status(&format!(
                    "✅ Catalog refreshed ({} songs)",
                    self.state.songs.len()
                ));
            }
            FetchMessage::Failed(message) => {
                self.refreshing = false;
                error!("catalog refresh failed: {}", message);
                self.set_status("❌ Refresh failed (see logs)");
            }
        }
    }

    fn apply_folder_filter(&mut self) {
        self.state.filter = if self.folder_index == 0 {
            FolderFilter::All
        } else {
            match self.state.folders.get(self.folder_index - 1) {
                Some(folder) => FolderFilter::Folder(folder.id.clone()),
                None => {
                    self.folder_index = 0;
                    FolderFilter::All
                }
            }
        };

        let visible = self.state.filtered_songs().len();
        self.list_state
            .select(if visible == 0 { None } else { Some(0) });
    }

    fn clamp_cursor(&mut self) {
        let visible = self.state.filtered_songs().len();
        match self.list_state.selected() {
            _ if visible == 0 => self.list_state.select(None),
            Some(i) if i >= visible => self.list_state.select(Some(visible - 1)),
            None => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: i32) {
        let visible = self.state.filtered_songs().len();
        if visible == 0 {
            return;
        }

        let current = self.list_state.selected().unwrap_or(0);
        let new_index = if delta > 0 {
            (current + delta as usize) % visible
        } else if current == 0 {
            visible - 1
        } else {
            current.saturating_sub((-delta) as usize)
        };

        self.list_state.select(Some(new_index));
    }

    fn set_status(&mut self, message: &str) {
        self.status_message = Some((message.to_string(), Instant::now()));
    }

    fn render(&mut self, f: &mut Frame) {
        let size = f.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Folder tabs
                Constraint::Min(6),    // Song list
                Constraint::Length(6), // Now playing + seek bar
                Constraint::Length(3), // Status bar
            ])
            .split(size);

        Self::render_folder_tabs(f, chunks[0], &self.state.folders, self.folder_index);
        Self::render_song_list(f, chunks[1], &self.state, &mut self.list_state);

        let position = self.backend.position();
        let duration = self.backend.duration();
        Self::render_now_playing(f, chunks[2], &self.state, position, duration);

        Self::render_status_bar(f, chunks[3], &self.status_message);
    }

    fn render_folder_tabs(f: &mut Frame, area: Rect, folders: &[Folder], folder_index: usize) {
        let active = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let inactive = Style::default().fg(Color::Gray);

        let mut spans = vec![Span::styled(
            "All",
            if folder_index == 0 { active } else { inactive },
        )];
        for (i, folder) in folders.iter().enumerate() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                folder.name.clone(),
                if folder_index == i + 1 { active } else { inactive },
            ));
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("🎶 Ocarina"));
        f.render_widget(header, area);
    }

    fn render_song_list(f: &mut Frame, area: Rect, state: &PlayerState, list_state: &mut ListState) {
        let visible = state.filtered_songs();
        let items: Vec<ListItem> = visible
            .iter()
            .map(|song| {
                let is_current = state.current_song_id.as_deref() == Some(song.id.as_str());

                let prefix = if is_current && state.playing {
                    "▶ "
                } else if is_current {
                    "⏸ "
                } else {
                    "  "
                };

                let content = format!(
                    "{}{} - {} [{}]",
                    prefix,
                    song.title,
                    song.display_artist(),
                    song.display_duration()
                );

                let style = if is_current {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(content).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Songs ({})", visible.len())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("→ ");

        f.render_stateful_widget(list, area, list_state);
    }

    fn render_now_playing(
        f: &mut Frame,
        area: Rect,
        state: &PlayerState,
        position: Duration,
        duration: Option<Duration>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Seek bar
                Constraint::Min(2),    // Now playing info
            ])
            .split(area);

        let (ratio, time_display) = match duration {
            Some(total) if total.as_secs() > 0 => {
                let total_secs = total.as_secs();
                let current_secs = position.as_secs().min(total_secs);
                (
                    current_secs as f64 / total_secs as f64,
                    format!("{} / {}", format_time(current_secs), format_time(total_secs)),
                )
            }
            _ => (0.0, format!("{} / --:--", format_time(position.as_secs()))),
        };

        let seek_color = if state.playing { Color::Green } else { Color::Yellow };
        let seek_bar = Gauge::default()
            .gauge_style(Style::default().fg(seek_color).add_modifier(Modifier::BOLD))
            .ratio(ratio)
            .label(time_display);
        f.render_widget(seek_bar, chunks[0]);

        let (track_line, art_line) = match state.selected_song() {
            Some(song) => (
                format!("♪ {} - {}", song.title, song.display_artist()),
                format!("🖼 {}", song.art_url()),
            ),
            None => ("No song selected".to_string(), String::new()),
        };

        let status_symbol = if state.playing { "▶" } else { "⏸" };
        let status_text = if state.playing { "Playing" } else { "Paused" };
        let status_color = if state.playing { Color::Green } else { Color::Yellow };

        let info_text = vec![
            Line::from(vec![Span::styled(
                track_line,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )]),
            Line::from(vec![
                Span::styled(status_symbol, Style::default().fg(status_color)),
                Span::raw(" "),
                Span::styled(status_text, Style::default().fg(status_color)),
                Span::raw(" | "),
                Span::styled(state.bitrate.label(), Style::default().fg(Color::Magenta)),
                Span::raw("  "),
                Span::styled(art_line, Style::default().fg(Color::DarkGray)),
            ]),
            Line::from(vec![
                Span::styled("Keys: ", Style::default().fg(Color::Gray)),
                Span::styled("Space", Style::default().fg(Color::Yellow)),
                Span::raw("=Play/Pause "),
                Span::styled("n", Style::default().fg(Color::Yellow)),
                Span::raw("=Next "),
                Span::styled("b", Style::default().fg(Color::Yellow)),
                Span::raw("=Prev "),
                Span::styled("m", Style::default().fg(Color::Yellow)),
                Span::raw("=Bitrate "),
                Span::styled("Tab", Style::default().fg(Color::Yellow)),
                Span::raw("=Folder "),
                Span::styled("0-9/←→", Style::default().fg(Color::Yellow)),
                Span::raw("=Seek "),
                Span::styled("F5", Style::default().fg(Color::Yellow)),
                Span::raw("=Refresh "),
                Span::styled("q", Style::default().fg(Color::Yellow)),
                Span::raw("=Quit"),
            ]),
        ];

        let info = Paragraph::new(info_text)
            .block(Block::default().borders(Borders::ALL).title("Player"))
            .wrap(Wrap { trim: true });
        f.render_widget(info, chunks[1]);
    }

    fn render_status_bar(f: &mut Frame, area: Rect, status_message: &Option<(String, Instant)>) {
        let status_text = match status_message {
            // Show status message for 3 seconds
            Some((message, timestamp)) if timestamp.elapsed() < Duration::from_secs(3) => {
                message.clone()
            }
            _ => "Ready".to_string(),
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().fg(Color::Green))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(status, area);
    }
}
