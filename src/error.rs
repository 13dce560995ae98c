//! Application error types and handling.
//!
//! Every core operation returns one of these kinds; the HTTP layer maps each
//! to a status code and a structured body.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The catalog root could not be read.
    #[error("Music library unavailable: {0}")]
    CatalogUnavailable(String),

    /// The requested track does not exist or cannot be opened.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The track name is not a single, safe file name.
    #[error("Invalid track name: {0}")]
    InvalidTrackName(String),

    /// The file is not decodable audio.
    #[error("Failed to decode track: {0}")]
    Decode(String),

    /// The audio output device could not be opened.
    #[error("Failed to initialize audio output: {0}")]
    DeviceInit(String),

    /// Another track is currently being rendered.
    #[error("Audio output is busy playing another track")]
    DeviceBusy,

    /// No playlist with the given name exists.
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    /// No playback session with the given id is known.
    #[error("Playback session not found: {0}")]
    SessionNotFound(String),

    /// Missing parameter or unparsable body.
    #[error("Bad request: {0}")]
    MalformedRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
            Self::TrackNotFound(_) => "TRACK_NOT_FOUND",
            Self::InvalidTrackName(_) => "INVALID_TRACK_NAME",
            Self::Decode(_) => "DECODE_ERROR",
            Self::DeviceInit(_) => "DEVICE_INIT_ERROR",
            Self::DeviceBusy => "DEVICE_BUSY",
            Self::PlaylistNotFound(_) => "PLAYLIST_NOT_FOUND",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create a validation error for a path traversal attempt.
    pub fn path_traversal(name: &str) -> Self {
        Self::InvalidTrackName(format!("'{}' is not a plain file name", name))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTrackName(_) | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::PlaylistNotFound(_) | Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::DeviceBusy => StatusCode::CONFLICT,
            Self::CatalogUnavailable(_)
            | Self::TrackNotFound(_)
            | Self::Decode(_)
            | Self::DeviceInit(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ErrorResponse::new(self.error_code(), self.to_string());

        if status.is_server_error() {
            tracing::error!(
                error_code = %self.error_code(),
                status = %status.as_u16(),
                message = %self,
                "API error"
            );
        } else {
            tracing::warn!(
                error_code = %self.error_code(),
                status = %status.as_u16(),
                message = %self,
                "Request rejected"
            );
        }

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
