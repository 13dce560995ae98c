//! Decode and output boundary.
//!
//! The coordinator only sees these traits. Decoding happens on the caller's
//! side; the device is opened and driven exclusively by the audio thread.

use std::fs::File;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppResult;

/// Sample layout reported by the decoder for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// How a render ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The stream was played to its end.
    Finished,
    /// The render loop observed a cancellation request.
    Cancelled,
}

/// Decoder plus output device factory.
pub trait AudioBackend: Send + Sync + 'static {
    /// Decoded PCM stream. Owns the underlying file handle.
    type Stream: Send + 'static;

    /// Opened output device. Never leaves the audio thread.
    type Device: OutputDevice<Stream = Self::Stream>;

    /// Decode an opened file.
    ///
    /// # Errors
    /// Returns [`AppError::Decode`](crate::error::AppError::Decode) for
    /// malformed or unsupported data.
    fn decode(&self, file: File) -> AppResult<(Self::Stream, StreamFormat)>;

    /// Open the output device at the rate of the first stream played.
    ///
    /// # Errors
    /// Returns [`AppError::DeviceInit`](crate::error::AppError::DeviceInit).
    fn open_device(&self, format: StreamFormat) -> AppResult<Self::Device>;
}

/// An opened audio output.
pub trait OutputDevice {
    type Stream;

    /// Render `stream` until it is exhausted or `cancel` fires.
    fn render(&mut self, stream: Self::Stream, cancel: &CancellationToken)
        -> AppResult<RenderOutcome>;
}
