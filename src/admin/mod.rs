pub mod api;
pub mod ingest;

pub use api::{AddSongRequest, AddSongResponse, AdminApiError, AdminClient, HealthResponse};
pub use ingest::{looks_like_youtube, FolderOption, FormError, IngestForm, IngestPhase};
