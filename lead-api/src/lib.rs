pub mod config;
pub mod database;
pub mod handlers;
pub mod helpers;
pub mod integrations;

use actix_web::{error, web, HttpResponse};
use shared_types::ErrorResponse;

pub use database::Database;

const JSON_LIMIT: usize = 16 * 1024;

/// Rejects unparseable bodies with the same `{"error": ...}` shape as the handlers.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            let body = ErrorResponse {
                error: err.to_string(),
            };
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(handlers::health::health))
        .route("/api/leads", web::post().to(handlers::leads::submit_lead))
        .route(
            "/api/leads/validate",
            web::post().to(handlers::leads::validate_lead),
        )
        .route("/api/admin/leads", web::get().to(handlers::admin::list_leads))
        .route(
            "/api/admin/leads/{id}",
            web::get().to(handlers::admin::get_lead),
        )
        .route(
            "/api/admin/leads/{id}",
            web::delete().to(handlers::admin::delete_lead),
        );
}
