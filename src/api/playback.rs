//! Playback endpoints.
//!
//! Handlers are generic over the audio backend, so routes are registered
//! through [`configure`] rather than attribute macros.

use actix_web::{http::header::ContentType, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::playback::{AudioBackend, PlaybackCoordinator, SessionStatus};

/// Query parameters naming a track.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub nombre: Option<String>,
}

impl TrackQuery {
    fn required_name(self) -> AppResult<String> {
        self.nombre
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::MalformedRequest("Parameter 'nombre' is required".to_string()))
    }
}

fn parse_session_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::MalformedRequest(format!("Invalid session id: {}", raw)))
}

/// Play a track and respond once it has finished.
///
/// GET /reproducir?nombre=<file>
pub async fn play_track<B: AudioBackend>(
    coordinator: web::Data<PlaybackCoordinator<B>>,
    query: web::Query<TrackQuery>,
) -> AppResult<HttpResponse> {
    let name = query.into_inner().required_name()?;
    let record = coordinator.play(&name).await?;

    let message = match record.status {
        SessionStatus::Cancelled => format!("Reproducción de {} cancelada", name),
        _ => format!("Canción {} reproducida con éxito", name),
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(message))
}

/// Start playing a track in the background.
///
/// POST /reproduccion?nombre=<file>
pub async fn start_playback<B: AudioBackend>(
    coordinator: web::Data<PlaybackCoordinator<B>>,
    query: web::Query<TrackQuery>,
) -> AppResult<HttpResponse> {
    let name = query.into_inner().required_name()?;
    let record = coordinator.start(&name).await?;

    Ok(HttpResponse::Accepted().json(record))
}

/// List recent playback sessions.
///
/// GET /reproduccion
pub async fn list_sessions<B: AudioBackend>(
    coordinator: web::Data<PlaybackCoordinator<B>>,
) -> HttpResponse {
    HttpResponse::Ok().json(coordinator.sessions())
}

/// Get one session.
///
/// GET /reproduccion/{id}
pub async fn session_status<B: AudioBackend>(
    coordinator: web::Data<PlaybackCoordinator<B>>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_session_id(&path)?;
    Ok(HttpResponse::Ok().json(coordinator.status(id)?))
}

/// Request cancellation of a session.
///
/// DELETE /reproduccion/{id}
pub async fn cancel_session<B: AudioBackend>(
    coordinator: web::Data<PlaybackCoordinator<B>>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_session_id(&path)?;
    Ok(HttpResponse::Ok().json(coordinator.cancel(id)?))
}

/// Configure playback routes.
pub fn configure<B: AudioBackend>(cfg: &mut web::ServiceConfig) {
    cfg.route("/reproducir", web::get().to(play_track::<B>))
        .service(
            web::resource("/reproduccion")
                .route(web::post().to(start_playback::<B>))
                .route(web::get().to(list_sessions::<B>)),
        )
        .service(
            web::resource("/reproduccion/{id}")
                .route(web::get().to(session_status::<B>))
                .route(web::delete().to(cancel_session::<B>)),
        );
}
