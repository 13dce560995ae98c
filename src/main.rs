//! Spoti - a small local music server.
//!
//! Lists the tracks in a music folder, plays them one at a time on the
//! host's audio output, and keeps in-memory playlists.

mod api;
mod catalog;
mod config;
mod error;
mod models;
mod playback;
mod playlists;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::models::AppState;
use crate::playback::{PlaybackCoordinator, RodioBackend};
use crate::playlists::{InMemoryPlaylistStore, PlaylistRepository};

/// Initialize the tracing/logging subsystem.
fn init_tracing(config: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

/// Configure CORS based on application config.
fn configure_cors(config: &config::Config) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
        ])
        .max_age(3600);

    if config.cors_origins.len() == 1 && config.cors_origins[0] == "*" {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Graceful shutdown handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize configuration
    let config = config::init();

    // Initialize logging
    init_tracing(config);

    // Validate configuration
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration validation failed");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }

    // Audio output is opened lazily by the first play request
    let coordinator = PlaybackCoordinator::new(
        config.music_folder.clone(),
        RodioBackend::new(config.audio_buffer()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to start playback coordinator");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let coordinator = web::Data::new(coordinator);

    let playlists: Arc<dyn PlaylistRepository> = Arc::new(InMemoryPlaylistStore::new());

    let app_state = AppState {
        music_folder: config.music_folder.clone(),
    };

    let bind_address = config.bind_address();

    tracing::info!(
        address = %bind_address,
        music_folder = %config.music_folder.display(),
        "Starting Spoti server"
    );

    let server = HttpServer::new(move || {
        App::new()
            // Middleware (order matters - outermost first)
            .wrap(TracingLogger::default())
            .wrap(configure_cors(config))
            // Shared state
            .app_data(api::json_config())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(coordinator.clone())
            .app_data(web::Data::from(playlists.clone()))
            .configure(api::health::configure)
            .configure(api::library::configure)
            .configure(api::playback::configure::<RodioBackend>)
            .configure(api::playlists::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run();

    // Run server with graceful shutdown
    tokio::select! {
        result = server => {
            result
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
    }
}
