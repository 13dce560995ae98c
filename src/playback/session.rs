//! Playback session bookkeeping.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::backend::RenderOutcome;
use crate::error::{AppError, AppResult};
use crate::models::Track;

/// Finished sessions kept around for status polling.
const MAX_RETAINED_SESSIONS: usize = 32;

/// Lifecycle state of a playback session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionStatus {
    Playing,
    Finished,
    Cancelled,
    Failed(String),
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Public view of one playback session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub track: Track,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

struct SessionEntry {
    record: SessionRecord,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, SessionEntry>,
    order: VecDeque<Uuid>,
}

impl Sessions {
    /// Drop the oldest finished sessions beyond the retention limit.
    fn evict(&mut self) {
        while self.order.len() > MAX_RETAINED_SESSIONS {
            let position = self.order.iter().position(|id| {
                self.entries
                    .get(id)
                    .map(|e| !e.record.status.is_active())
                    .unwrap_or(true)
            });

            match position.and_then(|p| self.order.remove(p)) {
                Some(id) => {
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
    }
}

/// Registry of recent playback sessions.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Sessions>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session that is about to be rendered.
    pub fn begin(&self, track: Track, cancel: CancellationToken) -> SessionRecord {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            track,
            started_at: Utc::now(),
            finished_at: None,
            status: SessionStatus::Playing,
        };

        let mut inner = self.inner.write();
        inner.entries.insert(
            record.id,
            SessionEntry {
                record: record.clone(),
                cancel,
            },
        );
        inner.order.push_back(record.id);
        inner.evict();

        record
    }

    /// Record how a session ended. Returns the final record.
    pub fn complete(&self, id: Uuid, result: &AppResult<RenderOutcome>) -> Option<SessionRecord> {
        let status = match result {
            Ok(RenderOutcome::Finished) => SessionStatus::Finished,
            Ok(RenderOutcome::Cancelled) => SessionStatus::Cancelled,
            Err(e) => SessionStatus::Failed(e.to_string()),
        };

        let mut inner = self.inner.write();
        let entry = inner.entries.get_mut(&id)?;
        entry.record.status = status;
        entry.record.finished_at = Some(Utc::now());
        Some(entry.record.clone())
    }

    pub fn get(&self, id: Uuid) -> AppResult<SessionRecord> {
        self.inner
            .read()
            .entries
            .get(&id)
            .map(|e| e.record.clone())
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Request cancellation of an active session.
    ///
    /// The status changes once the render loop observes the request.
    pub fn cancel(&self, id: Uuid) -> AppResult<SessionRecord> {
        let inner = self.inner.read();
        let entry = inner
            .entries
            .get(&id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;

        if entry.record.status.is_active() {
            entry.cancel.cancel();
            tracing::info!(session = %id, track = %entry.record.track.name, "Cancellation requested");
        }
        Ok(entry.record.clone())
    }

    /// All retained sessions, oldest first.
    pub fn list(&self) -> Vec<SessionRecord> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|e| e.record.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_sets_status() {
        let registry = SessionRegistry::new();
        let record = registry.begin(Track::new("a.mp3"), CancellationToken::new());
        assert_eq!(record.status, SessionStatus::Playing);

        let done = registry
            .complete(record.id, &Ok(RenderOutcome::Finished))
            .unwrap();
        assert_eq!(done.status, SessionStatus::Finished);
        assert!(done.finished_at.is_some());

        let failed = registry.begin(Track::new("b.mp3"), CancellationToken::new());
        registry.complete(failed.id, &Err(AppError::DeviceInit("no device".into())));
        assert!(matches!(
            registry.get(failed.id).unwrap().status,
            SessionStatus::Failed(_)
        ));
    }

    #[test]
    fn test_cancel_fires_token_only_while_active() {
        let registry = SessionRegistry::new();
        let token = CancellationToken::new();
        let record = registry.begin(Track::new("a.mp3"), token.clone());

        registry.cancel(record.id).unwrap();
        assert!(token.is_cancelled());

        let other = CancellationToken::new();
        let finished = registry.begin(Track::new("b.mp3"), other.clone());
        registry.complete(finished.id, &Ok(RenderOutcome::Finished));
        registry.cancel(finished.id).unwrap();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(matches!(
            registry.get(Uuid::new_v4()),
            Err(AppError::SessionNotFound(_))
        ));
        assert!(matches!(
            registry.cancel(Uuid::new_v4()),
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_finished_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let active = registry.begin(Track::new("live.mp3"), CancellationToken::new());

        for i in 0..MAX_RETAINED_SESSIONS + 5 {
            let record = registry.begin(Track::new(format!("{i}.mp3")), CancellationToken::new());
            registry.complete(record.id, &Ok(RenderOutcome::Finished));
        }

        let sessions = registry.list();
        assert_eq!(sessions.len(), MAX_RETAINED_SESSIONS);
        assert_eq!(sessions[0].id, active.id);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(SessionStatus::Failed("boom".into())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(SessionStatus::Playing).unwrap();
        assert_eq!(json["state"], "playing");
    }
}
