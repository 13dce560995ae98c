//! Playback coordination for the single audio output.

pub mod backend;
pub mod coordinator;
pub mod rodio_backend;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::AudioBackend;
pub use coordinator::PlaybackCoordinator;
pub use rodio_backend::RodioBackend;
pub use session::SessionStatus;
