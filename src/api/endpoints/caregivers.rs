//! Caregiver endpoints, nested under their owning patient.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::endpoints::patients::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::api::validate;
use crate::models::{Caregiver, CaregiverDraft};
use crate::service;

/// `POST /api/patients/:id/caregivers` — add a new caregiver to a patient.
pub async fn add(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
    Json(draft): Json<CaregiverDraft>,
) -> Result<(StatusCode, Json<Caregiver>), ApiError> {
    validate::new_caregiver(&draft)?;
    let patient_id = parse_id(&patient_id)?;
    let mut conn = ctx.lock_db()?;
    let caregiver = service::add_caregiver(&mut conn, &patient_id, &draft)?;
    Ok((StatusCode::CREATED, Json(caregiver)))
}

/// `DELETE /api/patients/:id/caregivers/:caregiver_id` — delete one caregiver;
/// the patient in the path must be its owner.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path((patient_id, caregiver_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let patient_id = parse_id(&patient_id)?;
    let caregiver_id = parse_id(&caregiver_id)?;
    let mut conn = ctx.lock_db()?;
    service::delete_caregiver(&mut conn, &patient_id, &caregiver_id)?;
    Ok(StatusCode::NO_CONTENT)
}
