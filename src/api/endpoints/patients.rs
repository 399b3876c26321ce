//! Patient endpoints: create, fetch, search, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::validate;
use crate::models::{Patient, PatientDraft};
use crate::service;

/// `POST /api/patients` — create a patient aggregate.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(draft): Json<PatientDraft>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    validate::patient_create(&draft)?;
    let mut conn = ctx.lock_db()?;
    let patient = service::create_patient(&mut conn, &draft)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id` — fetch one aggregate.
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.lock_db()?;
    service::get_patient(&conn, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("patient not found with id {id}")))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub term: String,
}

/// `GET /api/patients/search?term=` — term search over name, email, phone.
pub async fn search(
    State(ctx): State<ApiContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.lock_db()?;
    let patients = service::search_patients(&conn, &query.term)?;
    Ok(Json(patients))
}

/// `PUT /api/patients/:id` — full replacement update with caregiver
/// reconciliation.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(draft): Json<PatientDraft>,
) -> Result<Json<Patient>, ApiError> {
    validate::patient_update(&draft)?;
    let id = parse_id(&id)?;
    let mut conn = ctx.lock_db()?;
    let patient = service::update_patient(&mut conn, &id, &draft)?;
    Ok(Json(patient))
}

/// `DELETE /api/patients/:id` — delete the aggregate, children included.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let mut conn = ctx.lock_db()?;
    service::delete_patient(&mut conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid id: {e}")))
}
