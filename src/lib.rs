// Ocarina Library - Core modules for the catalog player and admin tools
// Modular design makes it easy to swap out components

pub mod admin; // ingest backend client and the add-song form
pub mod catalog; // song/folder rows and the hosted store client
pub mod config; // settings and credentials
pub mod player; // playback state and the audio engine
#[cfg(feature = "tui")]
pub mod ui; // terminal interface

// Export the stuff other modules actually use
pub use catalog::{Bitrate, CatalogStore, Folder, FolderFilter, Song};
pub use config::Config;
pub use player::PlayerState;
