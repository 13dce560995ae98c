//! Playlist endpoints.

use actix_web::{get, http::header::ContentType, post, web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Playlist, Track};
use crate::playlists::PlaylistRepository;

/// Request body for appending a track to a playlist.
#[derive(Debug, Deserialize)]
pub struct AddTrackRequest {
    /// Target playlist name.
    #[serde(rename = "Playlist", alias = "playlist")]
    pub playlist: String,
    /// Track file name.
    #[serde(rename = "Nombre", alias = "nombre")]
    pub track: String,
}

/// Create a playlist.
///
/// POST /crearPlaylist
///
/// Body: `{"Nombre": "...", "Canciones": [{"Nombre": "..."}]}`.
#[post("/crearPlaylist")]
pub async fn create_playlist(
    store: web::Data<dyn PlaylistRepository>,
    body: web::Json<Playlist>,
) -> AppResult<HttpResponse> {
    let Playlist { name, tracks } = body.into_inner();
    let playlist = store.create(name, tracks);

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("Playlist {} creada con éxito", playlist.name)))
}

/// Append a track to the first playlist with the given name.
///
/// POST /agregarCancionAPlaylist
///
/// Body: `{"Playlist": "...", "Nombre": "..."}`.
#[post("/agregarCancionAPlaylist")]
pub async fn add_track(
    store: web::Data<dyn PlaylistRepository>,
    body: web::Json<AddTrackRequest>,
) -> AppResult<HttpResponse> {
    let AddTrackRequest { playlist, track } = body.into_inner();
    let updated = store.add_track(&playlist, Track::new(track.clone()))?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!(
            "Canción {} agregada a la playlist {}",
            track, updated.name
        )))
}

/// Optional playlist name filter.
#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    pub nombre: Option<String>,
}

/// List all playlists, or the first one with a given name.
///
/// GET /playlists[?nombre=<name>]
#[get("/playlists")]
pub async fn list_playlists(
    store: web::Data<dyn PlaylistRepository>,
    query: web::Query<PlaylistQuery>,
) -> AppResult<HttpResponse> {
    match query.into_inner().nombre {
        Some(name) => {
            let playlist = store
                .find_by_name(&name)
                .ok_or(AppError::PlaylistNotFound(name))?;
            Ok(HttpResponse::Ok().json(playlist))
        }
        None => Ok(HttpResponse::Ok().json(store.list_all())),
    }
}

/// Configure playlist routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_playlist)
        .service(add_track)
        .service(list_playlists);
}
