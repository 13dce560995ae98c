//! In-memory audio backend for tests.
//!
//! Fixture files hold a short label instead of audio. Decoding reads the
//! label back; rendering appends `label:frame` entries to a shared log.

use std::fs::{self, File};
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::backend::{AudioBackend, OutputDevice, RenderOutcome, StreamFormat};
use crate::error::{AppError, AppResult};

const FRAMES: usize = 8;

/// Create a music folder holding `(file name, label)` fixtures.
pub fn music_folder(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, label) in files {
        fs::write(dir.path().join(name), label).unwrap();
    }
    dir
}

#[derive(Default)]
struct Inner {
    decodes: AtomicUsize,
    device_opens: AtomicUsize,
    fail_open: AtomicBool,
    gated: bool,
    released: AtomicBool,
    written: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    inner: Arc<Inner>,
}

pub struct StubStream {
    label: String,
}

pub struct StubDevice {
    inner: Arc<Inner>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders stop halfway until [`release`](Self::release) or cancellation.
    pub fn gated() -> Self {
        Self {
            inner: Arc::new(Inner {
                gated: true,
                ..Inner::default()
            }),
        }
    }

    pub fn release(&self) {
        self.inner.released.store(true, Ordering::SeqCst);
    }

    pub fn fail_device_open(&self, fail: bool) {
        self.inner.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn decodes(&self) -> usize {
        self.inner.decodes.load(Ordering::SeqCst)
    }

    /// Device open attempts, failed ones included.
    pub fn devices_opened(&self) -> usize {
        self.inner.device_opens.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> Vec<String> {
        self.inner.written.lock().clone()
    }

    pub fn frames_for(label: &str) -> Vec<String> {
        (0..FRAMES).map(|i| format!("{label}:{i}")).collect()
    }
}

impl AudioBackend for StubBackend {
    type Stream = StubStream;
    type Device = StubDevice;

    fn decode(&self, mut file: File) -> AppResult<(StubStream, StreamFormat)> {
        self.inner.decodes.fetch_add(1, Ordering::SeqCst);

        let mut label = String::new();
        file.read_to_string(&mut label)
            .map_err(|e| AppError::Decode(e.to_string()))?;
        if label.starts_with("corrupt") {
            return Err(AppError::Decode("no frame sync found".to_string()));
        }

        let format = StreamFormat {
            sample_rate: 44_100,
            channels: 2,
        };
        Ok((StubStream { label }, format))
    }

    fn open_device(&self, _format: StreamFormat) -> AppResult<StubDevice> {
        self.inner.device_opens.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_open.load(Ordering::SeqCst) {
            return Err(AppError::DeviceInit("no output device".to_string()));
        }
        Ok(StubDevice {
            inner: Arc::clone(&self.inner),
        })
    }
}

impl StubDevice {
    fn write(&self, label: &str, frame: usize) {
        self.inner.written.lock().push(format!("{label}:{frame}"));
        thread::yield_now();
    }
}

impl OutputDevice for StubDevice {
    type Stream = StubStream;

    fn render(&mut self, stream: StubStream, cancel: &CancellationToken) -> AppResult<RenderOutcome> {
        for frame in 0..FRAMES / 2 {
            self.write(&stream.label, frame);
        }

        while self.inner.gated && !self.inner.released.load(Ordering::SeqCst) {
            if cancel.is_cancelled() {
                return Ok(RenderOutcome::Cancelled);
            }
            thread::sleep(Duration::from_millis(2));
        }

        for frame in FRAMES / 2..FRAMES {
            if cancel.is_cancelled() {
                return Ok(RenderOutcome::Cancelled);
            }
            self.write(&stream.label, frame);
        }

        Ok(RenderOutcome::Finished)
    }
}
