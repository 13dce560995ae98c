//! In-memory playlist store.
//!
//! Playlists live for the lifetime of the process. Names are not unique;
//! lookups by name operate on the first match in creation order.

use parking_lot::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{Playlist, Track};

/// Trait for playlist storage operations.
///
/// Every method returns copies; callers never hold references into the store.
pub trait PlaylistRepository: Send + Sync {
    /// Append a new playlist. Always succeeds, duplicate names included.
    fn create(&self, name: String, tracks: Vec<Track>) -> Playlist;

    /// Append a track to the first playlist called `playlist`.
    fn add_track(&self, playlist: &str, track: Track) -> AppResult<Playlist>;

    /// Find the first playlist called `name`.
    fn find_by_name(&self, name: &str) -> Option<Playlist>;

    /// Get all playlists in creation order.
    fn list_all(&self) -> Vec<Playlist>;
}

/// Lock-guarded playlist collection.
#[derive(Debug, Default)]
pub struct InMemoryPlaylistStore {
    playlists: RwLock<Vec<Playlist>>,
}

impl InMemoryPlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaylistRepository for InMemoryPlaylistStore {
    fn create(&self, name: String, tracks: Vec<Track>) -> Playlist {
        let playlist = Playlist::new(name, tracks);
        self.playlists.write().push(playlist.clone());

        tracing::info!(
            playlist = %playlist.name,
            tracks = playlist.tracks.len(),
            "Created playlist"
        );
        playlist
    }

    fn add_track(&self, playlist: &str, track: Track) -> AppResult<Playlist> {
        let mut playlists = self.playlists.write();
        let entry = playlists
            .iter_mut()
            .find(|p| p.name == playlist)
            .ok_or_else(|| AppError::PlaylistNotFound(playlist.to_string()))?;

        entry.tracks.push(track);
        tracing::debug!(playlist = %entry.name, tracks = entry.tracks.len(), "Added track to playlist");
        Ok(entry.clone())
    }

    fn find_by_name(&self, name: &str) -> Option<Playlist> {
        self.playlists.read().iter().find(|p| p.name == name).cloned()
    }

    fn list_all(&self) -> Vec<Playlist> {
        self.playlists.read().clone()
    }
}
