use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ocarina::{
    admin::{
        looks_like_youtube, AddSongResponse, AdminApiError, AdminClient, FolderOption, IngestForm,
        IngestPhase,
    },
    catalog::{folder_label, Bitrate, Folder, Song},
    config::Config,
    ui::TerminalManager,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, error, info, warn};

use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocarina_admin")]
#[command(about = "Catalog admin console: queue YouTube downloads into the song store")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,
}

fn init_logging(dev: bool) -> Result<()> {
    // Create logs directory in project root
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ocarina_admin.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let base_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ocarina=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(base_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("🔧 Dev mode: Debug output enabled to stderr + file");
    }

    // Prevent the guard from being dropped
    std::mem::forget(_guard);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.dev)?;

    info!("🛠 Ocarina Admin starting up");

    let config = Config::load()?;

    println!("🛠 Ocarina Admin Console");
    println!("========================");
    println!("Ingest backend: {}", config.ingest.api_url);

    let client = Arc::new(AdminClient::new(
        &config.ingest.api_url,
        &config.ingest.admin_key,
    ));

    // Probe the backend before taking over the terminal
    let health_note = match client.health().await {
        Ok(health) => {
            println!("✅ Backend online ({})", health.status);
            None
        }
        Err(e) => {
            warn!("health probe failed: {}", e);
            println!("⚠️  Backend not responding: {e}");
            println!("   Submissions will fail until it is back.");
            Some("⚠️ Backend not responding - submissions will fail".to_string())
        }
    };

    println!("Loading catalog...");
    let (folders, songs, load_error) =
        match tokio::try_join!(client.get_folders(), client.get_songs(None)) {
            Ok((folders, songs)) => {
                println!(
                    "✅ Catalog loaded: {} folders, {} songs",
                    folders.len(),
                    songs.len()
                );
                (folders, songs, None)
            }
            Err(e) => {
                println!("⚠️  Could not load the catalog: {e}");
                println!("   Starting empty; press r to retry.");
                (Vec::new(), Vec::new(), Some(e.to_string()))
            }
        };

    let mut terminal = TerminalManager::new()?;
    let mut app = AdminApp::new(client, folders, songs);
    if let Some(message) = load_error {
        // The alternate screen is about to hide the stdout warning, so the
        // list area has to carry it until a reload succeeds
        app.note_catalog_failure(message);
    }
    if let Some(note) = health_note {
        app.set_status(&note);
    }
    let result = app.run(&mut terminal).await;
    drop(terminal);

    println!("👋 Admin console closed");

    result
}

struct AdminApp {
    client: Arc<AdminClient>,

    // Catalog as the backend reports it
    folders: Vec<Folder>,
    songs: Vec<Song>,
    catalog_error: Option<String>,

    // Add-song form
    form: IngestForm,
    phase: IngestPhase,
    entry_mode: EntryMode,
    folder_name_input: String,

    // UI state
    list_state: ListState,
    should_quit: bool,
    reloading: bool,
    alert: Option<String>,
    status_message: Option<(String, Instant)>,

    // Spawned task results
    task_rx: mpsc::UnboundedReceiver<TaskMessage>,
    task_tx: mpsc::UnboundedSender<TaskMessage>,
}

/// Which text field the keyboard currently feeds.
#[derive(Debug, Clone, PartialEq)]
enum EntryMode {
    None,
    Url,
    FolderName,
}

impl AdminApp {
    fn new(client: Arc<AdminClient>, folders: Vec<Folder>, songs: Vec<Song>) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        let mut form = IngestForm::default();
        form.set_folders(&folders);

        let mut list_state = ListState::default();
        if !songs.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            client,
            folders,
            songs,
            catalog_error: None,
            form,
            phase: IngestPhase::Idle,
            entry_mode: EntryMode::None,
            folder_name_input: String::new(),
            list_state,
            should_quit: false,
            reloading: false,
            alert: None,
            status_message: None,
            task_rx,
            task_tx,
        }
    }

    async fn run(&mut self, terminal: &mut TerminalManager) -> Result<()> {
        // SYNCHRONOUS event handling - no separate async tasks for terminal I/O
        while !self.should_quit {
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                if let Ok(event) = event::read() {
                    if let Event::Key(key) = event {
                        if key.kind == KeyEventKind::Press {
                            let admin_event = if self.alert.is_some() {
                                Self::key_to_alert_event(key)
                            } else if self.entry_mode != EntryMode::None {
                                Self::key_to_entry_event(key)
                            } else {
                                Self::key_to_browse_event(key)
                            };

                            if let Some(admin_event) = admin_event {
                                self.handle_event(admin_event).await?;
                            }
                        }
                    }
                }
            }

            while let Ok(message) = self.task_rx.try_recv() {
                self.handle_task(message);
            }

            self.handle_event(AdminEvent::Tick).await?;

            terminal.draw(|f| self.render(f))?;

            sleep(Duration::from_millis(100)).await; // ~10 FPS
        }

        Ok(())
    }

    fn key_to_browse_event(key: KeyEvent) -> Option<AdminEvent> {
        use crossterm::event::KeyModifiers;

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => Some(AdminEvent::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AdminEvent::Quit),
            (KeyCode::Esc, _) => Some(AdminEvent::Quit),

            // Form
            (KeyCode::Char('u'), KeyModifiers::NONE) => Some(AdminEvent::StartUrlEntry),
            (KeyCode::Char('f'), KeyModifiers::NONE) => Some(AdminEvent::StartFolderEntry),
            (KeyCode::Tab, _) => Some(AdminEvent::NextFolderOption),
            (KeyCode::BackTab, _) => Some(AdminEvent::PrevFolderOption),
            (KeyCode::Char('1'), KeyModifiers::NONE) => Some(AdminEvent::Toggle64k),
            (KeyCode::Char('2'), KeyModifiers::NONE) => Some(AdminEvent::Toggle128k),
            (KeyCode::Char('a'), KeyModifiers::NONE) => Some(AdminEvent::Submit),

            // Catalog
            (KeyCode::Char('r'), KeyModifiers::NONE) => Some(AdminEvent::Reload),
            (KeyCode::F(5), _) => Some(AdminEvent::Reload),
            (KeyCode::Up, _) => Some(AdminEvent::ListUp),
            (KeyCode::Down, _) => Some(AdminEvent::ListDown),

            _ => None,
        }
    }

    fn key_to_entry_event(key: KeyEvent) -> Option<AdminEvent> {
        use crossterm::event::KeyModifiers;

        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => Some(AdminEvent::ConfirmEntry),
            (KeyCode::Esc, _) => Some(AdminEvent::CancelEntry),
            (KeyCode::Backspace, _) => Some(AdminEvent::Backspace),

            // URLs carry uppercase video ids, so shifted characters count
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) if !c.is_control() => {
                Some(AdminEvent::Input(c))
            }

            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AdminEvent::Quit),

            _ => None,
        }
    }

    fn key_to_alert_event(key: KeyEvent) -> Option<AdminEvent> {
        use crossterm::event::KeyModifiers;

        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => Some(AdminEvent::DismissAlert),
            (KeyCode::Esc, _) => Some(AdminEvent::DismissAlert),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AdminEvent::Quit),
            _ => None,
        }
    }

    async fn handle_event(&mut self, event: AdminEvent) -> Result<()> {
        match event {
            AdminEvent::Quit => {
                self.should_quit = true;
            }
            AdminEvent::StartUrlEntry => {
                self.entry_mode = EntryMode::Url;
            }
            AdminEvent::StartFolderEntry => {
                self.folder_name_input.clear();
                self.entry_mode = EntryMode::FolderName;
            }
            AdminEvent::Input(c) => match self.entry_mode {
                EntryMode::Url => self.form.url.push(c),
                EntryMode::FolderName => self.folder_name_input.push(c),
                EntryMode::None => {}
            },
            AdminEvent::Backspace => match self.entry_mode {
                EntryMode::Url => {
                    self.form.url.pop();
                }
                EntryMode::FolderName => {
                    self.folder_name_input.pop();
                }
                EntryMode::None => {}
            },
            AdminEvent::ConfirmEntry => match self.entry_mode {
                EntryMode::Url => {
                    self.entry_mode = EntryMode::None;
                    let url = self.form.url.trim();
                    if !url.is_empty() && !looks_like_youtube(url) {
                        self.set_status("⚠️ That does not look like a YouTube link");
                    }
                }
                EntryMode::FolderName => {
                    let name = self.folder_name_input.clone();
                    match self.form.add_draft(&name) {
                        Ok(()) => {
                            self.entry_mode = EntryMode::None;
                            self.folder_name_input.clear();
                            self.set_status(&format!(
                                "📁 '{}' ready - created when the first song lands in it",
                                name.trim()
                            ));
                        }
                        Err(e) => {
                            self.alert = Some(e.to_string());
                        }
                    }
                }
                EntryMode::None => {}
            },
            AdminEvent::CancelEntry => {
                self.entry_mode = EntryMode::None;
                self.folder_name_input.clear();
            }
            AdminEvent::NextFolderOption => {
                self.form.cycle_folder(true);
            }
            AdminEvent::PrevFolderOption => {
                self.form.cycle_folder(false);
            }
            AdminEvent::Toggle64k => {
                self.form.toggle_bitrate(Bitrate::Kbps64);
            }
            AdminEvent::Toggle128k => {
                self.form.toggle_bitrate(Bitrate::Kbps128);
            }
            AdminEvent::Submit => {
                self.submit();
            }
            AdminEvent::Reload => {
                self.start_reload();
            }
            AdminEvent::ListUp => {
                self.move_selection(-1);
            }
            AdminEvent::ListDown => {
                self.move_selection(1);
            }
            AdminEvent::DismissAlert => {
                self.alert = None;
            }
            AdminEvent::Tick => {
                // A finished submission lingers for a moment, then the bar
                // hides and the list reloads to show the new row
                if self.phase.display_expired(Instant::now()) {
                    self.phase = IngestPhase::Idle;
                    self.start_reload();
                }
            }
        }

        Ok(())
    }

    fn submit(&mut self) {
        if self.phase.is_submitting() {
            return;
        }

        let request = match self.form.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.alert = Some(e.to_string());
                return;
            }
        };

        // The backend is the authority on what it can download; odd URLs
        // still go through
        if !looks_like_youtube(&request.youtube_url) {
            warn!("'{}' does not look like a YouTube URL", request.youtube_url);
        }

        info!(
            "submitting {} (folder: {:?}/{:?}, tiers: {:?})",
            request.youtube_url, request.folder_id, request.folder_name, request.bitrates
        );
        self.phase = IngestPhase::begin();

        let client = Arc::clone(&self.client);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client.add_song(&request).await;
            let _ = tx.send(TaskMessage::Submitted(Box::new(result)));
        });
    }

    fn start_reload(&mut self) {
        if self.reloading {
            return;
        }
        self.reloading = true;
        self.set_status("🔄 Reloading catalog...");

        let client = Arc::clone(&self.client);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            match tokio::try_join!(client.get_folders(), client.get_songs(None)) {
                Ok((folders, songs)) => {
                    let _ = tx.send(TaskMessage::Catalog { folders, songs });
                }
                Err(e) => {
                    let _ = tx.send(TaskMessage::CatalogFailed(e.to_string()));
                }
            }
        });
    }

    fn handle_task(&mut self, message: TaskMessage) {
        match message {
            TaskMessage::Submitted(result) => match *result {
                Ok(response) if response.success => {
                    let title = response
                        .song
                        .as_ref()
                        .map(|s| s.title.clone())
                        .unwrap_or_else(|| "song".to_string());
                    info!("ingest accepted '{}'", title);
                    self.phase = IngestPhase::succeed(response.message, Instant::now());
                    // ready for the next paste
                    self.form.url.clear();
                }
                Ok(response) => {
                    let message = response
                        .message
                        .unwrap_or_else(|| "Failed to add song".to_string());
                    error!("ingest rejected the song: {}", message);
                    self.phase = IngestPhase::fail(message);
                }
                Err(e) => {
                    error!("add song failed: {}", e);
                    self.phase = IngestPhase::fail(e.to_string());
                }
            },
            TaskMessage::Catalog { folders, songs } => {
                debug!(
                    "catalog reloaded: {} folders, {} songs",
                    folders.len(),
                    songs.len()
                );
                self.form.set_folders(&folders);
                self.folders = folders;
                self.songs = songs;
                self.catalog_error = None;
                self.reloading = false;

                match self.list_state.selected() {
                    _ if self.songs.is_empty() => self.list_state.select(None),
                    Some(i) if i >= self.songs.len() => {
                        self.list_state.select(Some(self.songs.len() - 1))
                    }
                    None => self.list_state.select(Some(0)),
                    _ => {}
                }

                self.set_status(&format!("✅ Catalog reloaded ({} songs)", self.songs.len()));
            }
            TaskMessage::CatalogFailed(message) => {
                self.note_catalog_failure(message);
            }
        }
    }

    /// Shared failure path for the startup fetch and in-TUI reloads: keep
    /// whatever catalog is already on screen and flag the list area.
    fn note_catalog_failure(&mut self, message: String) {
        error!("catalog load failed: {}", message);
        self.reloading = false;
        self.set_status("❌ Catalog load failed");
        self.catalog_error = Some(message);
    }

    fn move_selection(&mut self, delta: i32) {
        if self.songs.is_empty() {
            return;
        }

        let current = self.list_state.selected().unwrap_or(0);
        let new_index = if delta > 0 {
            (current + delta as usize) % self.songs.len()
        } else if current == 0 {
            self.songs.len() - 1
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
                Constraint::Length(3), // Header
                Constraint::Length(6), // Add-song form
                Constraint::Length(3), // Ingest progress
                Constraint::Min(5),    // Song list
                Constraint::Length(3), // Status bar
            ])
            .split(size);

        Self::render_header(f, chunks[0]);
        Self::render_form(f, chunks[1], &self.form);
        Self::render_progress(f, chunks[2], &self.phase, self.reloading);
        Self::render_song_list(
            f,
            chunks[3],
            &self.songs,
            &self.folders,
            &self.catalog_error,
            &mut self.list_state,
        );
        Self::render_status_bar(f, chunks[4], &self.status_message);

        // Overlays last so they sit on top
        match self.entry_mode {
            EntryMode::Url => Self::render_url_input(f, size, &self.form.url),
            EntryMode::FolderName => Self::render_folder_input(f, size, &self.folder_name_input),
            EntryMode::None => {}
        }
        if let Some(alert) = &self.alert {
            Self::render_alert(f, size, alert);
        }
    }

    fn render_header(f: &mut Frame, area: Rect) {
        let title = Paragraph::new("🛠 Ocarina Admin - Catalog Console")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));

        f.render_widget(title, area);
    }

    fn render_form(f: &mut Frame, area: Rect, form: &IngestForm) {
        let url_display = if form.url.is_empty() {
            Span::styled("<press u to paste a link>", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(form.url.clone(), Style::default().fg(Color::White))
        };

        let folder_line = {
            let selected = form.selected_option();
            let style = match selected {
                FolderOption::Draft { .. } => Style::default().fg(Color::Magenta),
                _ => Style::default().fg(Color::White),
            };
            Span::styled(selected.label(), style)
        };

        let checkbox = |on: bool| if on { "[x]" } else { "[ ]" };
        let lines = vec![
            Line::from(vec![Span::raw("🔗 YouTube URL: "), url_display]),
            Line::from(vec![Span::raw("📁 Folder: "), folder_line]),
            Line::from(vec![
                Span::raw("🎚 Bitrates: "),
                Span::styled(
                    format!("{} 64kbps", checkbox(form.want_64k)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} 128kbps", checkbox(form.want_128k)),
                    Style::default().fg(Color::Yellow),
                ),
            ]),
            Line::from(vec![Span::styled(
                "u=URL f=New Folder Tab=Folder 1/2=Bitrates a=Add Song r=Reload q=Quit",
                Style::default().fg(Color::Gray),
            )]),
        ];

        let form_widget = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Add Song"))
            .wrap(Wrap { trim: true });
        f.render_widget(form_widget, area);
    }

    fn render_progress(f: &mut Frame, area: Rect, phase: &IngestPhase, reloading: bool) {
        if phase.is_visible() {
            let color = if phase.is_failure() {
                Color::Red
            } else {
                Color::Green
            };
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Ingest"))
                .gauge_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .ratio(phase.ratio())
                .label(phase.text().to_string());
            f.render_widget(gauge, area);
        } else {
            let hint = if reloading { "Reloading..." } else { "" };
            let placeholder = Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Ingest"));
            f.render_widget(placeholder, area);
        }
    }

    fn render_song_list(
        f: &mut Frame,
        area: Rect,
        songs: &[Song],
        folders: &[Folder],
        catalog_error: &Option<String>,
        list_state: &mut ListState,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Songs ({})", songs.len()));

        if let Some(message) = catalog_error {
            let error_widget = Paragraph::new(format!("❌ {message}"))
                .style(Style::default().fg(Color::Red))
                .block(block)
                .wrap(Wrap { trim: true });
            f.render_widget(error_widget, area);
            return;
        }

        if songs.is_empty() {
            let placeholder = Paragraph::new("No songs yet - add one above!")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            f.render_widget(placeholder, area);
            return;
        }

        let items: Vec<ListItem> = songs
            .iter()
            .map(|song| {
                let info = format!(
                    "{} - {} [{}]  📁 {}  {}",
                    song.title,
                    song.display_artist(),
                    song.display_duration(),
                    folder_label(folders, song.folder_id.as_deref()),
                    song.variant_summary()
                );
                let art = format!("   🖼 {}", song.art_url());
                ListItem::new(vec![
                    Line::from(info),
                    Line::from(Span::styled(art, Style::default().fg(Color::DarkGray))),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("→ ");

        f.render_stateful_widget(list, area, list_state);
    }

    fn render_url_input(f: &mut Frame, area: Rect, url: &str) {
        let popup_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(area.height.saturating_sub(4)),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area)[1];

        let input_text = format!("🔗 YouTube URL: {}", url);

        let url_input = Paragraph::new(input_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Paste Link - Enter to confirm, Esc to cancel")
                    .border_style(Style::default().fg(Color::Green)),
            )
            .style(Style::default().fg(Color::White).bg(Color::Black));

        // Clear the area and render the input
        f.render_widget(Clear, popup_area);
        f.render_widget(url_input, popup_area);
    }

    fn render_folder_input(f: &mut Frame, area: Rect, name: &str) {
        let popup_area = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(area.height.saturating_sub(4)),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area)[1];

        let input_text = format!("📁 Folder Name: {}", name);

        let folder_input = Paragraph::new(input_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("New Folder - Enter to confirm, Esc to cancel")
                    .border_style(Style::default().fg(Color::Blue)),
            )
            .style(Style::default().fg(Color::White).bg(Color::Black));

        // Clear the area and render the input
        f.render_widget(Clear, popup_area);
        f.render_widget(folder_input, popup_area);
    }

    fn render_alert(f: &mut Frame, area: Rect, message: &str) {
        let popup_area = Self::centered_rect(50, 20, area);

        f.render_widget(Clear, popup_area);

        let alert = Paragraph::new(vec![
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Enter",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("⚠ Notice")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().bg(Color::Black))
        .wrap(Wrap { trim: true });

        f.render_widget(alert, popup_area);
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

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

#[derive(Debug, Clone)]
enum AdminEvent {
    Quit,
    Tick,

    // Browse mode
    StartUrlEntry,
    StartFolderEntry,
    NextFolderOption,
    PrevFolderOption,
    Toggle64k,
    Toggle128k,
    Submit,
    Reload,
    ListUp,
    ListDown,
    DismissAlert,

    // Text entry
    Input(char),
    Backspace,
    ConfirmEntry,
    CancelEntry,
}

/// Results of spawned backend calls, drained by the run loop.
#[derive(Debug)]
enum TaskMessage {
    Submitted(Box<Result<AddSongResponse, AdminApiError>>),
    Catalog {
        folders: Vec<Folder>,
        songs: Vec<Song>,
    },
    CatalogFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            title: format!("Song {id}"),
            artist: None,
            duration: None,
            folder_id: None,
            thumbnail_url: None,
            audio_url_64kbps: Some(format!("http://cdn/{id}-64.mp3")),
            audio_url_128kbps: None,
            youtube_url: None,
            created_at: None,
        }
    }

    fn folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
            created_at: None,
        }
    }

    fn app_with(songs: Vec<Song>) -> AdminApp {
        let client = Arc::new(AdminClient::new("http://127.0.0.1:1", "unused"));
        AdminApp::new(client, Vec::new(), songs)
    }

    #[test]
    fn failed_catalog_load_keeps_stale_rows_and_flags_the_list() {
        let mut app = app_with(vec![song("a")]);

        app.note_catalog_failure("connection refused".to_string());

        assert_eq!(app.catalog_error.as_deref(), Some("connection refused"));
        assert_eq!(app.songs.len(), 1);
        assert!(!app.reloading);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn reload_success_replaces_catalog_and_clears_the_error() {
        let mut app = app_with(Vec::new());
        app.note_catalog_failure("connection refused".to_string());
        app.reloading = true;

        app.handle_task(TaskMessage::Catalog {
            folders: vec![folder("f1", "Chill")],
            songs: vec![song("a"), song("b")],
        });

        assert_eq!(app.catalog_error, None);
        assert!(!app.reloading);
        assert_eq!(app.songs.len(), 2);
        assert_eq!(app.list_state.selected(), Some(0));
        // no-folder entry plus the one server folder
        assert_eq!(app.form.options().len(), 2);
    }

    #[tokio::test]
    async fn finished_submission_reloads_after_the_display_window() {
        let mut app = app_with(Vec::new());
        app.phase = IngestPhase::Succeeded {
            message: "Song added successfully!".to_string(),
            hide_at: Instant::now(),
        };

        app.handle_event(AdminEvent::Tick).await.unwrap();

        assert_eq!(app.phase, IngestPhase::Idle);
        assert!(app.reloading);
    }

    #[tokio::test]
    async fn failed_submission_stays_on_screen_across_ticks() {
        let mut app = app_with(Vec::new());
        app.phase = IngestPhase::fail("Invalid admin key");

        app.handle_event(AdminEvent::Tick).await.unwrap();

        assert!(app.phase.is_failure());
        assert!(!app.reloading);
    }

    #[test]
    fn accepted_submission_shows_the_message_and_clears_the_url() {
        let mut app = app_with(Vec::new());
        app.form.url = "https://youtu.be/dQw4w9WgXcQ".to_string();
        app.phase = IngestPhase::begin();

        app.handle_task(TaskMessage::Submitted(Box::new(Ok(AddSongResponse {
            success: true,
            song: Some(song("9")),
            message: Some("Queued!".to_string()),
        }))));

        assert_eq!(app.phase.text(), "Queued!");
        assert_eq!(app.phase.ratio(), 1.0);
        assert!(app.form.url.is_empty());
    }

    #[test]
    fn rejected_submission_keeps_the_url_for_a_retry() {
        let mut app = app_with(Vec::new());
        app.form.url = "https://youtu.be/dQw4w9WgXcQ".to_string();
        app.phase = IngestPhase::begin();

        app.handle_task(TaskMessage::Submitted(Box::new(Ok(AddSongResponse {
            success: false,
            song: None,
            message: None,
        }))));

        assert!(app.phase.is_failure());
        assert_eq!(app.phase.text(), "Failed to add song");
        assert_eq!(app.form.url, "https://youtu.be/dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn invalid_form_raises_the_alert_instead_of_submitting() {
        let mut app = app_with(Vec::new());

        app.handle_event(AdminEvent::Submit).await.unwrap();

        assert_eq!(app.alert.as_deref(), Some("Please enter a YouTube URL"));
        assert_eq!(app.phase, IngestPhase::Idle);
    }

    #[tokio::test]
    async fn submission_in_flight_blocks_a_second_submit() {
        let mut app = app_with(Vec::new());
        app.phase = IngestPhase::begin();

        // the guard returns before validation, so the empty URL raises no alert
        app.handle_event(AdminEvent::Submit).await.unwrap();

        assert_eq!(app.alert, None);
        assert!(app.phase.is_submitting());
    }

    #[tokio::test]
    async fn reload_in_flight_is_not_restarted() {
        let mut app = app_with(Vec::new());
        app.reloading = true;

        app.handle_event(AdminEvent::Reload).await.unwrap();

        assert_eq!(app.status_message, None);
        assert!(app.reloading);
    }
}
