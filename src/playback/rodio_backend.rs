//! rodio-backed decoder and output device.

use std::fs::File;
use std::io::BufReader;
use std::thread;
use std::time::Duration;

use rodio::cpal::BufferSize;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tokio_util::sync::CancellationToken;

use super::backend::{AudioBackend, OutputDevice, RenderOutcome, StreamFormat};
use crate::error::{AppError, AppResult};

/// How often the render loop checks for end of stream or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

type FileDecoder = Decoder<BufReader<File>>;

/// Decodes with symphonia through rodio and plays on the default output.
#[derive(Debug, Clone)]
pub struct RodioBackend {
    buffer: Duration,
}

impl RodioBackend {
    /// `buffer` is the device buffer length, converted to frames at the
    /// first track's sample rate.
    pub fn new(buffer: Duration) -> Self {
        Self { buffer }
    }
}

/// Number of frames covering `buffer` at `sample_rate`.
fn buffer_frames(sample_rate: u32, buffer: Duration) -> u32 {
    let frames = u128::from(sample_rate) * buffer.as_millis() / 1000;
    u32::try_from(frames).unwrap_or(u32::MAX).max(1)
}

impl AudioBackend for RodioBackend {
    type Stream = FileDecoder;
    type Device = RodioDevice;

    fn decode(&self, file: File) -> AppResult<(FileDecoder, StreamFormat)> {
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| AppError::Decode(e.to_string()))?;

        let format = StreamFormat {
            sample_rate: decoder.sample_rate(),
            channels: decoder.channels(),
        };
        Ok((decoder, format))
    }

    fn open_device(&self, format: StreamFormat) -> AppResult<RodioDevice> {
        let frames = buffer_frames(format.sample_rate, self.buffer);

        let mut stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| AppError::DeviceInit(e.to_string()))?
            .with_sample_rate(format.sample_rate)
            .with_buffer_size(BufferSize::Fixed(frames))
            .open_stream_or_fallback()
            .map_err(|e| AppError::DeviceInit(e.to_string()))?;
        // rodio prints to stderr when the stream is dropped.
        stream.log_on_drop(false);

        tracing::info!(
            sample_rate = format.sample_rate,
            buffer_frames = frames,
            "Opened audio output"
        );
        Ok(RodioDevice { stream })
    }
}

/// The process-wide output stream.
pub struct RodioDevice {
    stream: OutputStream,
}

impl OutputDevice for RodioDevice {
    type Stream = FileDecoder;

    fn render(
        &mut self,
        stream: FileDecoder,
        cancel: &CancellationToken,
    ) -> AppResult<RenderOutcome> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(stream);

        while !sink.empty() {
            if cancel.is_cancelled() {
                sink.stop();
                return Ok(RenderOutcome::Cancelled);
            }
            thread::sleep(POLL_INTERVAL);
        }

        Ok(RenderOutcome::Finished)
    }
}
