//! Read-only client for the hosted catalog store (PostgREST-style REST
//! interface). The player pulls its entire catalog through this; writes
//! happen elsewhere, via the ingest API.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{Folder, Song};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog store unreachable: {0}")]
    Unreachable(String),
    #[error("catalog store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Unreachable(err.to_string())
        }
    }
}

pub struct CatalogStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl CatalogStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            anon_key: anon_key.into(),
        }
    }

    /// All folders, ordered by name.
    pub async fn list_folders(&self) -> Result<Vec<Folder>, StoreError> {
        self.fetch("folders", "name.asc").await
    }

    /// All songs, ordered by title. Folder filtering happens client-side.
    pub async fn list_songs(&self) -> Result<Vec<Song>, StoreError> {
        self.fetch("songs", "title.asc").await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        order: &str,
    ) -> Result<Vec<T>, StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!("fetching {} ordered by {}", url, order);

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("order", order)])
            .header("apikey", &self.anon_key)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.anon_key),
            )
            .send()
            .await
            .map_err(StoreError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_folders_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/folders"))
            .and(query_param("select", "*"))
            .and(query_param("order", "name.asc"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "Chill"},
                {"id": 2, "name": "Workout"}
            ])))
            .mount(&server)
            .await;

        let store = CatalogStore::new(server.uri(), "anon-key");
        let folders = store.list_folders().await.unwrap();

        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].id, "1");
        assert_eq!(folders[0].name, "Chill");
    }

    #[tokio::test]
    async fn lists_songs_ordered_by_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .and(query_param("order", "title.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a", "title": "Aurora", "audio_url_64kbps": "http://cdn/a64.mp3"},
                {"id": "b", "title": "Borealis"}
            ])))
            .mount(&server)
            .await;

        let store = CatalogStore::new(server.uri(), "anon-key");
        let songs = store.list_songs().await.unwrap();

        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "Aurora");
        assert_eq!(
            songs[0].audio_url_64kbps.as_deref(),
            Some("http://cdn/a64.mp3")
        );
        assert_eq!(songs[1].audio_url_64kbps, None);
    }

    #[tokio::test]
    async fn surfaces_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/songs"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = CatalogStore::new(server.uri(), "anon-key");
        let err = store.list_songs().await.unwrap_err();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_non_array_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/folders"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "not a list"})),
            )
            .mount(&server)
            .await;

        let store = CatalogStore::new(server.uri(), "anon-key");
        assert!(matches!(
            store.list_folders().await,
            Err(StoreError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn tolerates_trailing_slash_in_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/folders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let store = CatalogStore::new(format!("{}/", server.uri()), "anon-key");
        assert!(store.list_folders().await.unwrap().is_empty());
    }
}
