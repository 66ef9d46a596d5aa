pub mod backend;
#[cfg(feature = "audio")]
pub mod rodio_backend;
pub mod state;

pub use backend::AudioBackend;
#[cfg(feature = "audio")]
pub use rodio_backend::RodioBackend;
pub use state::{format_time, PlayerState};
