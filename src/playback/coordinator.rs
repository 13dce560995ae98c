//! Single-device playback coordinator.
//!
//! The output device is owned by one dedicated audio thread. Requests are
//! validated and opened on the caller's side, take the device permit, and
//! only then decode before being handed to that thread with the permit. The permit is a capacity-1
//! semaphore; a request that finds it taken is rejected with
//! [`AppError::DeviceBusy`] instead of queueing.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::backend::{AudioBackend, OutputDevice, RenderOutcome, StreamFormat};
use super::session::{SessionRecord, SessionRegistry};
use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::models::Track;

/// Work item for the audio thread.
struct RenderJob<S> {
    session: Uuid,
    track: Track,
    stream: S,
    format: StreamFormat,
    cancel: CancellationToken,
    /// Held for the whole render; dropped on every exit path.
    permit: OwnedSemaphorePermit,
    done: oneshot::Sender<AppResult<RenderOutcome>>,
}

/// Serializes playback onto the one audio output.
pub struct PlaybackCoordinator<B: AudioBackend> {
    music_folder: PathBuf,
    backend: Arc<B>,
    device: Arc<Semaphore>,
    jobs: Sender<RenderJob<B::Stream>>,
    sessions: Arc<SessionRegistry>,
}

impl<B: AudioBackend> PlaybackCoordinator<B> {
    /// Create the coordinator and spawn its audio thread.
    ///
    /// The device itself is opened lazily by the first render.
    pub fn new(music_folder: impl Into<PathBuf>, backend: B) -> AppResult<Self> {
        let backend = Arc::new(backend);
        let sessions = Arc::new(SessionRegistry::new());
        let (jobs, rx) = mpsc::channel::<RenderJob<B::Stream>>();

        let thread_backend = Arc::clone(&backend);
        let thread_sessions = Arc::clone(&sessions);
        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || run_audio_thread(thread_backend, rx, thread_sessions))
            .map_err(|e| AppError::Internal(format!("Failed to spawn audio thread: {}", e)))?;

        Ok(Self {
            music_folder: music_folder.into(),
            backend,
            device: Arc::new(Semaphore::new(1)),
            jobs,
            sessions,
        })
    }

    /// Whether a render currently holds the device.
    pub fn is_busy(&self) -> bool {
        self.device.available_permits() == 0
    }

    /// Play a track to completion.
    ///
    /// Resolves once the render-finished event fires. A session cancelled
    /// through [`cancel`](Self::cancel) also resolves successfully, with a
    /// `cancelled` status.
    pub async fn play(&self, name: &str) -> AppResult<SessionRecord> {
        let (record, done) = self.submit(name).await?;

        let outcome = done
            .await
            .map_err(|_| AppError::Internal("Audio thread stopped during playback".to_string()))?;
        outcome?;

        self.sessions.get(record.id)
    }

    /// Start playing a track in the background and return its session.
    pub async fn start(&self, name: &str) -> AppResult<SessionRecord> {
        let (record, _done) = self.submit(name).await?;
        Ok(record)
    }

    pub fn status(&self, id: Uuid) -> AppResult<SessionRecord> {
        self.sessions.get(id)
    }

    pub fn cancel(&self, id: Uuid) -> AppResult<SessionRecord> {
        self.sessions.cancel(id)
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.sessions.list()
    }

    /// Validate and open, take the device permit, decode, then hand the
    /// stream to the audio thread.
    async fn submit(
        &self,
        name: &str,
    ) -> AppResult<(SessionRecord, oneshot::Receiver<AppResult<RenderOutcome>>)> {
        let path = catalog::resolve_track_path(&self.music_folder, name)?;
        let track = Track::new(name);

        let opened_track = track.clone();
        let file = tokio::task::spawn_blocking(move || open_track(&path, &opened_track))
            .await
            .map_err(|e| AppError::Internal(format!("Open task failed: {}", e)))??;

        // Dropping `file` on this path closes it; nothing was decoded.
        let permit = Arc::clone(&self.device)
            .try_acquire_owned()
            .map_err(|_| AppError::DeviceBusy)?;

        // The permit is dropped with this frame if decoding fails.
        let backend = Arc::clone(&self.backend);
        let (stream, format) = tokio::task::spawn_blocking(move || backend.decode(file))
            .await
            .map_err(|e| AppError::Internal(format!("Decode task failed: {}", e)))??;

        let cancel = CancellationToken::new();
        let record = self.sessions.begin(track.clone(), cancel.clone());
        let (done, finished) = oneshot::channel();

        let job = RenderJob {
            session: record.id,
            track,
            stream,
            format,
            cancel,
            permit,
            done,
        };

        // A failed send hands the job back and drops it, releasing the permit.
        if self.jobs.send(job).is_err() {
            let message = "Audio thread is not running";
            self.sessions
                .complete(record.id, &Err(AppError::Internal(message.to_string())));
            return Err(AppError::Internal(message.to_string()));
        }

        tracing::info!(
            session = %record.id,
            track = %record.track.name,
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Playback started"
        );
        Ok((record, finished))
    }
}

/// Open a track file. Anything but a regular `.mp3` file is not a track.
fn open_track(path: &Path, track: &Track) -> AppResult<File> {
    if !catalog::is_track_name(&track.name) {
        return Err(AppError::TrackNotFound(track.name.clone()));
    }

    let file = File::open(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "Failed to open track");
        AppError::TrackNotFound(track.name.clone())
    })?;

    let is_file = file.metadata().map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(AppError::TrackNotFound(track.name.clone()));
    }

    Ok(file)
}

/// Opened device plus the rate it was opened at.
struct OpenDevice<D> {
    device: D,
    format: StreamFormat,
}

/// Audio thread body. Exits when the coordinator is dropped.
fn run_audio_thread<B: AudioBackend>(
    backend: Arc<B>,
    jobs: Receiver<RenderJob<B::Stream>>,
    sessions: Arc<SessionRegistry>,
) {
    let mut output: Option<OpenDevice<B::Device>> = None;

    for job in jobs {
        let RenderJob {
            session,
            track,
            stream,
            format,
            cancel,
            permit,
            done,
        } = job;

        let result = render(&*backend, &mut output, stream, format, &cancel);

        match &result {
            Ok(outcome) => {
                tracing::info!(session = %session, track = %track.name, outcome = ?outcome, "Playback ended")
            }
            Err(e) => {
                tracing::warn!(session = %session, track = %track.name, error = %e, "Playback failed")
            }
        }

        sessions.complete(session, &result);
        drop(permit);
        // The requester may have stopped waiting.
        let _ = done.send(result);
    }

    tracing::debug!("Audio thread stopped");
}

/// Render one stream, opening the device on first use.
fn render<B: AudioBackend>(
    backend: &B,
    slot: &mut Option<OpenDevice<B::Device>>,
    stream: B::Stream,
    format: StreamFormat,
    cancel: &CancellationToken,
) -> AppResult<RenderOutcome> {
    let mut output = match slot.take() {
        Some(output) => output,
        None => OpenDevice {
            device: backend.open_device(format)?,
            format,
        },
    };

    if output.format.sample_rate != format.sample_rate {
        tracing::debug!(
            device_rate = output.format.sample_rate,
            track_rate = format.sample_rate,
            "Track rate differs from device rate, resampling"
        );
    }

    let result = output.device.render(stream, cancel);
    *slot = Some(output);
    result
}
