pub mod admin;
pub mod health;
pub mod leads;

use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::HttpResponse;

use crate::database::DbError;

#[derive(Debug, thiserror::Error)]
pub enum LeadApiError {
    #[error("Lead not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for LeadApiError {
    fn from(e: DbError) -> Self {
        LeadApiError::Internal(e.to_string())
    }
}

impl actix_web::error::ResponseError for LeadApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            LeadApiError::NotFound => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": "Lead not found" }))
            }
            LeadApiError::Validation(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
            }
            LeadApiError::Internal(msg) => {
                tracing::error!("{}", msg);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
        }
    }
}

pub(crate) fn add_security_header(mut response: HttpResponse) -> HttpResponse {
    response.headers_mut().insert(
        HeaderName::from_static("x-security-warning"),
        HeaderValue::from_static(
            "This API has no authentication. Expose it only behind an authenticating proxy.",
        ),
    );
    response
}
