//! Add-song form state and the submission progress machine. Folder drafts
//! live here too: a draft is an option the admin typed locally, persisted
//! server-side only when an add-song request selects it.

use std::time::{Duration, Instant};

use chrono::Utc;
use regex::Regex;
use thiserror::Error;

use super::api::AddSongRequest;
use crate::catalog::{Bitrate, Folder};

/// How long a finished submission stays on screen before the gauge hides
/// and the list reloads.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a YouTube URL")]
    MissingUrl,
    #[error("Please select at least one bitrate")]
    NoBitrates,
    #[error("Please enter a folder name")]
    MissingFolderName,
}

/// One entry in the folder selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOption {
    NoFolder,
    Existing(Folder),
    Draft { id: String, name: String },
}

impl FolderOption {
    pub fn label(&self) -> String {
        match self {
            FolderOption::NoFolder => "-- No Folder --".to_string(),
            FolderOption::Existing(folder) => folder.name.clone(),
            FolderOption::Draft { name, .. } => format!("{name} (new)"),
        }
    }

    /// The `(folder_id, folder_name)` pair an add-song request carries for
    /// this choice. Drafts send only the name; the backend creates the row.
    fn request_fields(&self) -> (Option<String>, Option<String>) {
        match self {
            FolderOption::NoFolder => (None, None),
            FolderOption::Existing(folder) => (Some(folder.id.clone()), None),
            FolderOption::Draft { name, .. } => (None, Some(name.clone())),
        }
    }
}

#[derive(Debug)]
pub struct IngestForm {
    pub url: String,
    pub want_64k: bool,
    pub want_128k: bool,
    options: Vec<FolderOption>,
    selected: usize,
}

impl Default for IngestForm {
    fn default() -> Self {
        Self {
            url: String::new(),
            // 64k mirrors the backend's default tier
            want_64k: true,
            want_128k: false,
            options: vec![FolderOption::NoFolder],
            selected: 0,
        }
    }
}

impl IngestForm {
    pub fn options(&self) -> &[FolderOption] {
        &self.options
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_option(&self) -> &FolderOption {
        &self.options[self.selected]
    }

    /// Rebuild the selector from a fresh server folder list, keeping drafts
    /// that the server does not know yet and the current selection where it
    /// still exists. A draft whose name now matches a server folder has been
    /// persisted; the server row takes its place.
    pub fn set_folders(&mut self, folders: &[Folder]) {
        let previous = self.options.get(self.selected).cloned();

        let mut options = vec![FolderOption::NoFolder];
        options.extend(folders.iter().cloned().map(FolderOption::Existing));
        for option in &self.options {
            if let FolderOption::Draft { id, name } = option {
                let absorbed = folders
                    .iter()
                    .any(|f| f.name.eq_ignore_ascii_case(name));
                if !absorbed {
                    options.push(FolderOption::Draft {
                        id: id.clone(),
                        name: name.clone(),
                    });
                }
            }
        }

        self.selected = match previous {
            Some(FolderOption::Existing(folder)) => options
                .iter()
                .position(|o| matches!(o, FolderOption::Existing(f) if f.id == folder.id))
                .unwrap_or(0),
            Some(FolderOption::Draft { id, name }) => options
                .iter()
                .position(|o| matches!(o, FolderOption::Draft { id: d, .. } if *d == id))
                .or_else(|| {
                    // absorbed draft: follow it to the server row
                    options.iter().position(
                        |o| matches!(o, FolderOption::Existing(f) if f.name.eq_ignore_ascii_case(&name)),
                    )
                })
                .unwrap_or(0),
            _ => 0,
        };
        self.options = options;
    }

    /// Append a local draft folder and select it. No network traffic.
    pub fn add_draft(&mut self, name: &str) -> Result<(), FormError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormError::MissingFolderName);
        }

        let id = format!("folder_{}", Utc::now().timestamp_millis());
        self.options.push(FolderOption::Draft {
            id,
            name: name.to_string(),
        });
        self.selected = self.options.len() - 1;
        Ok(())
    }

    pub fn cycle_folder(&mut self, forward: bool) {
        let len = self.options.len();
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    pub fn toggle_bitrate(&mut self, bitrate: Bitrate) {
        match bitrate {
            Bitrate::Kbps64 => self.want_64k = !self.want_64k,
            Bitrate::Kbps128 => self.want_128k = !self.want_128k,
        }
    }

    pub fn selected_bitrates(&self) -> Vec<Bitrate> {
        let mut tiers = Vec::new();
        if self.want_64k {
            tiers.push(Bitrate::Kbps64);
        }
        if self.want_128k {
            tiers.push(Bitrate::Kbps128);
        }
        tiers
    }

    /// Validate and assemble the request body. Leaves the form untouched so
    /// a failed submission can be retried as-is.
    pub fn build_request(&self) -> Result<AddSongRequest, FormError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(FormError::MissingUrl);
        }

        let tiers = self.selected_bitrates();
        if tiers.is_empty() {
            return Err(FormError::NoBitrates);
        }

        let (folder_id, folder_name) = self.selected_option().request_fields();
        Ok(AddSongRequest {
            youtube_url: url.to_string(),
            folder_id,
            folder_name,
            bitrates: tiers.iter().map(|t| t.wire().to_string()).collect(),
        })
    }
}

/// Loose shape check only; the backend is the authority on what it can
/// download, so a miss is a warning, not a rejection.
pub fn looks_like_youtube(url: &str) -> bool {
    if let Ok(regex) = Regex::new(r"^https?://(www\.)?(youtube\.com/watch\?|youtu\.be/|youtube\.com/shorts/)") {
        return regex.is_match(url);
    }
    false
}

/// Lifecycle of one add-song submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestPhase {
    Idle,
    Submitting,
    Succeeded { message: String, hide_at: Instant },
    Failed { message: String },
}

impl IngestPhase {
    pub fn begin() -> Self {
        IngestPhase::Submitting
    }

    pub fn succeed(message: Option<String>, now: Instant) -> Self {
        IngestPhase::Succeeded {
            message: message.unwrap_or_else(|| "Song added successfully!".to_string()),
            hide_at: now + SUCCESS_DISPLAY,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        IngestPhase::Failed {
            message: message.into(),
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, IngestPhase::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, IngestPhase::Submitting)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, IngestPhase::Failed { .. })
    }

    /// Gauge fill: submissions sit at 0% until the backend answers.
    pub fn ratio(&self) -> f64 {
        match self {
            IngestPhase::Succeeded { .. } => 1.0,
            _ => 0.0,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            IngestPhase::Idle => "",
            IngestPhase::Submitting => "Starting download...",
            IngestPhase::Succeeded { message, .. } => message,
            IngestPhase::Failed { message } => message,
        }
    }

    /// True once a success has been on screen for the full display window.
    pub fn display_expired(&self, now: Instant) -> bool {
        matches!(self, IngestPhase::Succeeded { hide_at, .. } if now >= *hide_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn empty_url_is_rejected_before_any_request_exists() {
        let form = IngestForm::default();
        assert_eq!(form.build_request().unwrap_err(), FormError::MissingUrl);
    }

    #[test]
    fn at_least_one_bitrate_is_required() {
        let mut form = IngestForm::default();
        form.url = "https://www.youtube.com/watch?v=abc".to_string();
        form.want_64k = false;
        form.want_128k = false;
        assert_eq!(form.build_request().unwrap_err(), FormError::NoBitrates);
    }

    #[test]
    fn request_carries_wire_bitrates_and_trimmed_url() {
        let mut form = IngestForm::default();
        form.url = "  https://youtu.be/abc  ".to_string();
        form.want_128k = true;

        let request = form.build_request().unwrap();
        assert_eq!(request.youtube_url, "https://youtu.be/abc");
        assert_eq!(request.bitrates, vec!["64k", "128k"]);
        assert_eq!(request.folder_id, None);
        assert_eq!(request.folder_name, None);
    }

    #[test]
    fn existing_folder_sends_its_id() {
        let mut form = IngestForm::default();
        form.url = "https://youtu.be/abc".to_string();
        form.set_folders(&[folder("f1", "Chill")]);
        form.cycle_folder(true);

        let request = form.build_request().unwrap();
        assert_eq!(request.folder_id.as_deref(), Some("f1"));
        assert_eq!(request.folder_name, None);
    }

    #[test]
    fn draft_folder_sends_name_only() {
        let mut form = IngestForm::default();
        form.url = "https://youtu.be/abc".to_string();
        form.add_draft("Night Drive").unwrap();

        let request = form.build_request().unwrap();
        assert_eq!(request.folder_id, None);
        assert_eq!(request.folder_name.as_deref(), Some("Night Drive"));
    }

    #[test]
    fn blank_draft_names_are_rejected() {
        let mut form = IngestForm::default();
        assert_eq!(form.add_draft("   ").unwrap_err(), FormError::MissingFolderName);
        assert_eq!(form.options().len(), 1);
    }

    #[test]
    fn draft_ids_are_timestamped() {
        let mut form = IngestForm::default();
        form.add_draft("Focus").unwrap();
        match form.selected_option() {
            FolderOption::Draft { id, .. } => assert!(id.starts_with("folder_")),
            other => panic!("expected draft selected, got {other:?}"),
        }
    }

    #[test]
    fn reload_replaces_persisted_draft_with_server_row() {
        let mut form = IngestForm::default();
        form.add_draft("Night Drive").unwrap();

        form.set_folders(&[folder("f1", "Chill"), folder("f2", "night drive")]);

        assert_eq!(form.options().len(), 3); // no-folder + two server rows
        match form.selected_option() {
            FolderOption::Existing(f) => assert_eq!(f.id, "f2"),
            other => panic!("expected server folder selected, got {other:?}"),
        }
    }

    #[test]
    fn reload_keeps_unpersisted_drafts_and_selection() {
        let mut form = IngestForm::default();
        form.set_folders(&[folder("f1", "Chill")]);
        form.add_draft("Sleep").unwrap();

        form.set_folders(&[folder("f1", "Chill"), folder("f2", "Workout")]);

        assert_eq!(form.options().len(), 4);
        assert!(matches!(
            form.selected_option(),
            FolderOption::Draft { name, .. } if name == "Sleep"
        ));
    }

    #[test]
    fn folder_cycling_wraps_both_ways() {
        let mut form = IngestForm::default();
        form.set_folders(&[folder("f1", "Chill"), folder("f2", "Workout")]);

        assert_eq!(form.selected_index(), 0);
        form.cycle_folder(false);
        assert_eq!(form.selected_index(), 2);
        form.cycle_folder(true);
        assert_eq!(form.selected_index(), 0);
    }

    #[test]
    fn youtube_shapes() {
        assert!(looks_like_youtube("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(looks_like_youtube("https://youtu.be/dQw4w9WgXcQ"));
        assert!(looks_like_youtube("http://youtube.com/shorts/xyz"));
        assert!(!looks_like_youtube("https://vimeo.com/12345"));
        assert!(!looks_like_youtube("not a url"));
    }

    #[test]
    fn phase_progress_and_expiry() {
        let now = Instant::now();

        let submitting = IngestPhase::begin();
        assert!(submitting.is_visible());
        assert_eq!(submitting.ratio(), 0.0);
        assert_eq!(submitting.text(), "Starting download...");

        let done = IngestPhase::succeed(None, now);
        assert_eq!(done.ratio(), 1.0);
        assert_eq!(done.text(), "Song added successfully!");
        assert!(!done.display_expired(now));
        assert!(done.display_expired(now + Duration::from_secs(3)));

        let failed = IngestPhase::fail("Invalid admin key");
        assert!(failed.is_failure());
        assert!(failed.is_visible());
        assert_eq!(failed.text(), "Invalid admin key");
        assert!(!failed.display_expired(now + Duration::from_secs(60)));
    }
}
