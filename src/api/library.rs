//! Track listing endpoint.

use actix_web::{get, web, HttpResponse};

use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::models::AppState;

/// List the tracks in the music folder.
///
/// GET /ver
///
/// Returns `[{"Nombre": "..."}]` in directory order.
#[get("/ver")]
pub async fn list_tracks(data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let root = data.music_folder.clone();
    let tracks = web::block(move || catalog::list_tracks(&root))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(tracks))
}

/// Configure library routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tracks);
}
