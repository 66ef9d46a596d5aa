pub mod store;

pub use store::{CatalogStore, StoreError};

use serde::{Deserialize, Deserializer, Serialize};

/// Shown whenever a song has no thumbnail of its own.
pub const DEFAULT_ART_URL: &str = "https://img.youtube.com/vi/default/mqdefault.jpg";

/// The two stream qualities the ingest pipeline produces. Each tier has its
/// own URL column on a song; a song may carry any subset of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bitrate {
    Kbps64,
    Kbps128,
}

impl Bitrate {
    /// Form the ingest API expects in `bitrates` request arrays.
    pub fn wire(&self) -> &'static str {
        match self {
            Bitrate::Kbps64 => "64k",
            Bitrate::Kbps128 => "128k",
        }
    }

    /// Human label used in lists and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Bitrate::Kbps64 => "64kbps",
            Bitrate::Kbps128 => "128kbps",
        }
    }

    pub fn other(&self) -> Bitrate {
        match self {
            Bitrate::Kbps64 => Bitrate::Kbps128,
            Bitrate::Kbps128 => Bitrate::Kbps64,
        }
    }

    pub fn from_wire(s: &str) -> Option<Bitrate> {
        match s {
            "64k" | "64" => Some(Bitrate::Kbps64),
            "128k" | "128" => Some(Bitrate::Kbps128),
            _ => None,
        }
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        // The ingest backend downloads 64k when nothing is requested
        Bitrate::Kbps64
    }
}

/// Which slice of the catalog the song list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderFilter {
    All,
    Folder(String),
}

impl FolderFilter {
    pub fn matches(&self, song: &Song) -> bool {
        match self {
            FolderFilter::All => true,
            FolderFilter::Folder(id) => song.folder_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl Default for FolderFilter {
    fn default() -> Self {
        FolderFilter::All
    }
}

/// One catalog entry. Rows are written only by the ingest backend; both
/// clients treat them as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    /// Pre-rendered display string (e.g. "0:03:45"), never parsed.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub audio_url_64kbps: Option<String>,
    #[serde(default)]
    pub audio_url_128kbps: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Song {
    /// URL for exactly the given tier, no fallback.
    pub fn source_url(&self, bitrate: Bitrate) -> Option<&str> {
        match bitrate {
            Bitrate::Kbps64 => self.audio_url_64kbps.as_deref(),
            Bitrate::Kbps128 => self.audio_url_128kbps.as_deref(),
        }
    }

    pub fn art_url(&self) -> &str {
        self.thumbnail_url.as_deref().unwrap_or(DEFAULT_ART_URL)
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn display_duration(&self) -> &str {
        self.duration.as_deref().unwrap_or("0:00")
    }

    /// Space-joined labels of the tiers this song actually has, empty when
    /// it has none.
    pub fn variant_summary(&self) -> String {
        let mut labels = Vec::new();
        if self.audio_url_64kbps.is_some() {
            labels.push(Bitrate::Kbps64.label());
        }
        if self.audio_url_128kbps.is_some() {
            labels.push(Bitrate::Kbps128.label());
        }
        labels.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Folder column shown next to a song: the folder's name when we know it,
/// the raw id when we don't, "None" for unfiled songs.
pub fn folder_label(folders: &[Folder], folder_id: Option<&str>) -> String {
    match folder_id {
        None => "None".to_string(),
        Some(id) => folders
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string()),
    }
}

// The store is not consistent about id columns: some deployments use integer
// keys, others uuid strings. Accept both and keep them as strings.
fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(serde_json::Number),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

fn opt_id_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(serde_json::Number),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    }))
}
