//! Client for the ingest API: catalog reads plus the add-song endpoint that
//! hands a YouTube URL to the backend downloader. Admin writes authenticate
//! with a shared key in the `X-Admin-Key` header.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Folder, Song};

const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("ingest API unreachable: {0}")]
    Unreachable(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("malformed ingest API response: {0}")]
    Decode(String),
}

impl AdminApiError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdminApiError::Decode(err.to_string())
        } else {
            AdminApiError::Unreachable(err.to_string())
        }
    }

    /// HTTP status for errors the backend actually answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AdminApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Body for `POST /api/add_song`. `folder_name` rides along only when the
/// chosen folder is a local draft; the backend creates it on the fly.
#[derive(Debug, Clone, Serialize)]
pub struct AddSongRequest {
    pub youtube_url: String,
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    pub bitrates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSongResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub song: Option<Song>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FoldersEnvelope {
    folders: Vec<Folder>,
}

#[derive(Debug, Deserialize)]
struct SongsEnvelope {
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
}

pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
    admin_key: String,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, admin_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            admin_key: admin_key.into(),
        }
    }

    pub async fn get_folders(&self) -> Result<Vec<Folder>, AdminApiError> {
        let url = format!("{}/api/get_folders", self.base_url);
        debug!("loading folders from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(AdminApiError::from_request)?;
        let envelope: FoldersEnvelope = Self::decode(response, "Failed to load folders").await?;
        Ok(envelope.folders)
    }

    /// Songs, optionally narrowed to one folder server-side.
    pub async fn get_songs(&self, folder_id: Option<&str>) -> Result<Vec<Song>, AdminApiError> {
        let url = format!("{}/api/get_songs", self.base_url);
        debug!("loading songs from {} (folder: {:?})", url, folder_id);

        let mut request = self.client.get(&url);
        if let Some(id) = folder_id {
            request = request.query(&[("folder_id", id)]);
        }

        let response = request.send().await.map_err(AdminApiError::from_request)?;
        let envelope: SongsEnvelope = Self::decode(response, "Failed to load songs").await?;
        Ok(envelope.songs)
    }

    /// Kick off a download on the backend. Returns once the backend has
    /// finished (or refused) the whole job; there is no progress stream.
    pub async fn add_song(&self, request: &AddSongRequest) -> Result<AddSongResponse, AdminApiError> {
        let url = format!("{}/api/add_song", self.base_url);
        debug!(
            "submitting {} for ingest (folder: {:?}, tiers: {:?})",
            request.youtube_url, request.folder_id, request.bitrates
        );

        let response = self
            .client
            .post(&url)
            .header(ADMIN_KEY_HEADER, &self.admin_key)
            .json(request)
            .send()
            .await
            .map_err(AdminApiError::from_request)?;
        Self::decode(response, "Failed to add song").await
    }

    pub async fn health(&self) -> Result<HealthResponse, AdminApiError> {
        let url = format!("{}/api/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(AdminApiError::from_request)?;
        Self::decode(response, "Backend unhealthy").await
    }

    // Error bodies are `{"error": "..."}` when the backend wrote them itself;
    // anything else (proxy pages, crashes) falls back to a per-endpoint message.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, AdminApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| fallback.to_string());
            return Err(AdminApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AdminApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn unwraps_folder_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_folders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "folders": [{"id": "f1", "name": "Chill"}]
            })))
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "secret");
        let folders = client.get_folders().await.unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Chill");
    }

    #[tokio::test]
    async fn passes_folder_filter_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get_songs"))
            .and(query_param("folder_id", "f1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "songs": [{"id": 1, "title": "Only One", "folder_id": "f1"}]
            })))
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "secret");
        let songs = client.get_songs(Some("f1")).await.unwrap();

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "1");
    }

    #[tokio::test]
    async fn add_song_sends_key_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_song"))
            .and(header("X-Admin-Key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "youtube_url": "https://www.youtube.com/watch?v=abc",
                "folder_id": null,
                "bitrates": ["64k", "128k"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Song added successfully!",
                "song": {"id": 9, "title": "Fresh"}
            })))
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "secret");
        let request = AddSongRequest {
            youtube_url: "https://www.youtube.com/watch?v=abc".to_string(),
            folder_id: None,
            folder_name: None,
            bitrates: vec!["64k".to_string(), "128k".to_string()],
        };

        let response = client.add_song(&request).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message.as_deref(), Some("Song added successfully!"));
        assert_eq!(response.song.map(|s| s.id), Some("9".to_string()));
    }

    #[tokio::test]
    async fn add_song_surfaces_server_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_song"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": "Invalid admin key"})),
            )
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "wrong");
        let request = AddSongRequest {
            youtube_url: "https://www.youtube.com/watch?v=abc".to_string(),
            folder_id: None,
            folder_name: None,
            bitrates: vec!["64k".to_string()],
        };

        match client.add_song(&request).await.unwrap_err() {
            AdminApiError::Status { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Invalid admin key");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_bodies_get_a_fallback_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/add_song"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "secret");
        let request = AddSongRequest {
            youtube_url: "https://www.youtube.com/watch?v=abc".to_string(),
            folder_id: None,
            folder_name: None,
            bitrates: vec!["64k".to_string()],
        };

        match client.add_song(&request).await.unwrap_err() {
            AdminApiError::Status { message, .. } => {
                assert_eq!(message, "Failed to add song");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_unreachable() {
        // nothing listens on port 1
        let client = AdminClient::new("http://127.0.0.1:1", "secret");
        assert!(matches!(
            client.health().await,
            Err(AdminApiError::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn health_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "timestamp": "2024-06-01T12:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = AdminClient::new(server.uri(), "secret");
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "ok");
    }
}
