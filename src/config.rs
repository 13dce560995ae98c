//! Application configuration management.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Folder scanned for tracks.
    pub music_folder: PathBuf,
    /// Audio output buffer length in milliseconds.
    pub audio_buffer_ms: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json or pretty).
    pub log_format: LogFormat,
    /// Allowed CORS origins (comma-separated, or * for all).
    pub cors_origins: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON structured logging.
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a numeric variable is set but invalid.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16");

        let music_folder = PathBuf::from(
            std::env::var("MUSIC_FOLDER").unwrap_or_else(|_| "./music".to_string()),
        );

        let audio_buffer_ms = std::env::var("AUDIO_BUFFER_MS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u64>()
            .expect("AUDIO_BUFFER_MS must be a valid integer");

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            music_folder,
            audio_buffer_ms,
            log_level,
            log_format,
            cors_origins,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.music_folder.exists() {
            return Err(ConfigError::MusicFolderNotFound(
                self.music_folder.display().to_string(),
            ));
        }

        if !self.music_folder.is_dir() {
            return Err(ConfigError::MusicFolderNotDirectory(
                self.music_folder.display().to_string(),
            ));
        }

        if self.audio_buffer_ms == 0 {
            return Err(ConfigError::InvalidAudioBuffer);
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Audio output buffer length.
    pub fn audio_buffer(&self) -> Duration {
        Duration::from_millis(self.audio_buffer_ms)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Music folder not found: {0}")]
    MusicFolderNotFound(String),

    #[error("Music folder is not a directory: {0}")]
    MusicFolderNotDirectory(String),

    #[error("AUDIO_BUFFER_MS must be greater than zero")]
    InvalidAudioBuffer,
}

/// Initialize the global configuration.
///
/// Should be called once at application startup.
pub fn init() -> &'static Config {
    CONFIG.get_or_init(|| {
        dotenvy::dotenv().ok();
        Config::from_env()
    })
}
