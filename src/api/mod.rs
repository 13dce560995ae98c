//! HTTP endpoints.

pub mod health;
pub mod library;
pub mod playback;
pub mod playlists;

use actix_web::web;

use crate::error::AppError;

/// JSON body extractor settings shared by all routes.
///
/// Clients may post JSON without a JSON content type. Parse failures become
/// [`AppError::MalformedRequest`].
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| {
            AppError::MalformedRequest(format!("Could not read request body: {}", err)).into()
        })
}
