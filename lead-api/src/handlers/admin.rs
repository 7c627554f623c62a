use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use shared_types::LeadsResponse;
use std::sync::Arc;

use super::{add_security_header, LeadApiError};
use crate::database::leads as db;
use crate::database::Database;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

#[derive(Deserialize)]
pub struct ListQuery {
    source: Option<String>,
    limit: Option<usize>,
}

pub async fn list_leads(
    db: web::Data<Arc<Database>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let source = query.source.filter(|s| !s.trim().is_empty());

    let leads = db::list_leads(db.async_connection.clone(), source, limit)
        .await
        .map_err(LeadApiError::from)?;

    Ok(add_security_header(
        HttpResponse::Ok().json(LeadsResponse { leads }),
    ))
}

pub async fn get_lead(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let lead_id = path.into_inner();

    let lead = db::get_lead(db.async_connection.clone(), lead_id)
        .await
        .map_err(LeadApiError::from)?
        .ok_or(LeadApiError::NotFound)?;

    Ok(add_security_header(HttpResponse::Ok().json(lead)))
}

pub async fn delete_lead(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let lead_id = path.into_inner();

    let deleted = db::delete_lead(db.async_connection.clone(), lead_id)
        .await
        .map_err(LeadApiError::from)?;
    if !deleted {
        return Err(LeadApiError::NotFound.into());
    }

    tracing::info!(lead_id, "Lead deleted from back office");

    Ok(add_security_header(HttpResponse::NoContent().finish()))
}
