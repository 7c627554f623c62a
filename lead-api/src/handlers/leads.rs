use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use lead_pipeline::validation;
use lead_pipeline::{SubmissionContext, SubmissionOutcome};
use shared_types::{LeadForm, ValidateLeadRequest, ValidateLeadResponse};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::LeadApiError;
use crate::helpers::sessions::SessionRegistry;

/// Browser-session cookie: no expiry, so it lives as long as the browser
/// session, like the cooldown it keys.
pub const SESSION_COOKIE: &str = "lead_session";

fn session_id(req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if Uuid::parse_str(cookie.value()).is_ok() {
            return (cookie.value().to_string(), None);
        }
    }

    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build(SESSION_COOKIE, id.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    (id, Some(cookie))
}

fn header_value(req: &HttpRequest, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn status_for(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome {
        SubmissionOutcome::Accepted { .. } => StatusCode::CREATED,
        SubmissionOutcome::RejectedValidation { .. } => StatusCode::BAD_REQUEST,
        SubmissionOutcome::RejectedSpam => StatusCode::BAD_REQUEST,
        SubmissionOutcome::RejectedRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        SubmissionOutcome::RejectedInFlight => StatusCode::CONFLICT,
        SubmissionOutcome::FailedStorage => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// `POST /api/leads`: the public submission contract.
pub async fn submit_lead(
    req: HttpRequest,
    sessions: web::Data<Arc<SessionRegistry>>,
    form: web::Json<LeadForm>,
) -> HttpResponse {
    let (session_id, new_cookie) = session_id(&req);

    let ctx = SubmissionContext {
        user_agent: header_value(&req, header::USER_AGENT),
        referrer: header_value(&req, header::REFERER),
    };
    let mut form = form.into_inner();
    let outcome = sessions.submit(&session_id, &mut form, &ctx).await;

    let mut builder = HttpResponse::build(status_for(&outcome));
    if let SubmissionOutcome::RejectedRateLimited { retry_after_secs } = &outcome {
        builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
    }
    if let Some(cookie) = new_cookie {
        builder.cookie(cookie);
    }

    builder.json(outcome.into_response())
}

/// `POST /api/leads/validate`: field rules only, nothing is stored.
pub async fn validate_lead(request: web::Json<ValidateLeadRequest>) -> Result<HttpResponse> {
    let request = request.into_inner();

    let errors = match request.field.as_deref() {
        Some(field) => {
            if !validation::FIELDS.contains(&field) {
                return Err(LeadApiError::Validation(format!("Unknown field: {}", field)).into());
            }
            validation::validate_field(&request.form, field)
                .map(|message| BTreeMap::from([(field.to_string(), message)]))
                .unwrap_or_default()
        }
        None => validation::validate(&request.form).err().unwrap_or_default(),
    };

    Ok(HttpResponse::Ok().json(ValidateLeadResponse {
        valid: errors.is_empty(),
        errors,
    }))
}
