//! Structural validation of request drafts at the boundary. The service
//! layer assumes these checks have already run and only enforces semantic
//! rules (uniqueness, ownership, membership).

use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;

use crate::api::error::ApiError;
use crate::models::{AddressDraft, CaregiverDraft, PatientDraft};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?(\d{3})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})$").unwrap());

/// Validate a draft for patient creation. Caregiver entries must not carry
/// ids: every caregiver in a brand-new aggregate is itself new.
pub fn patient_create(draft: &PatientDraft) -> Result<(), ApiError> {
    patient_fields(draft)?;
    if let Some(caregivers) = &draft.caregivers {
        for entry in caregivers {
            if entry.id.is_some() {
                return Err(ApiError::BadRequest(
                    "Caregiver id must not be provided when creating a patient.".into(),
                ));
            }
            caregiver_fields(entry)?;
        }
    }
    Ok(())
}

/// Validate a draft for patient update. Caregiver ids are allowed here; they
/// mark existing caregivers to update in place.
pub fn patient_update(draft: &PatientDraft) -> Result<(), ApiError> {
    patient_fields(draft)?;
    if let Some(caregivers) = &draft.caregivers {
        for entry in caregivers {
            caregiver_fields(entry)?;
        }
    }
    Ok(())
}

/// Validate a standalone caregiver draft for the add-caregiver operation,
/// which only accepts new caregivers.
pub fn new_caregiver(draft: &CaregiverDraft) -> Result<(), ApiError> {
    if draft.id.is_some() {
        return Err(ApiError::BadRequest(
            "Caregiver id must not be provided when adding a caregiver.".into(),
        ));
    }
    caregiver_fields(draft)
}

fn patient_fields(draft: &PatientDraft) -> Result<(), ApiError> {
    require(&draft.first_name, "First name is required.")?;
    require(&draft.last_name, "Last name is required.")?;
    require(&draft.email, "Email is required.")?;
    if !EMAIL_PATTERN.is_match(&draft.email) {
        return Err(ApiError::BadRequest("Email should be a valid format.".into()));
    }
    require(&draft.phone_number, "Phone number is required.")?;
    if !PHONE_PATTERN.is_match(&draft.phone_number) {
        return Err(ApiError::BadRequest("Invalid phone number format.".into()));
    }
    if draft.height_cm <= 0.0 {
        return Err(ApiError::BadRequest("Height must be positive.".into()));
    }
    if draft.weight_kg <= 0.0 {
        return Err(ApiError::BadRequest("Weight must be positive.".into()));
    }

    let today = Local::now().date_naive();
    if draft.date_of_birth >= today {
        return Err(ApiError::BadRequest(
            "Date of birth must be in the past.".into(),
        ));
    }
    if draft.date_of_diagnosis > today {
        return Err(ApiError::BadRequest(
            "Date of diagnosis cannot be in the future.".into(),
        ));
    }

    require(&draft.ethnicity, "Ethnicity is required.")?;
    require(&draft.type_of_diabetes, "Type of Diabetes is required.")?;
    require(&draft.biological_sex, "Biological sex is required.")?;
    require(&draft.assigned_physician, "Assigned physician is required.")?;

    if draft.medical_history.is_empty()
        || draft.medical_history.iter().any(|c| c.trim().is_empty())
    {
        return Err(ApiError::BadRequest(
            "Medical History cannot be blank.".into(),
        ));
    }

    address_fields(&draft.address)
}

fn address_fields(draft: &AddressDraft) -> Result<(), ApiError> {
    require(&draft.mailing_address, "Mailing address is required.")?;
    require(&draft.zipcode, "Zipcode is required.")?;
    require(&draft.county, "County is required.")?;
    require(&draft.state, "State is required.")?;
    require(&draft.country, "Country is required.")
}

fn caregiver_fields(draft: &CaregiverDraft) -> Result<(), ApiError> {
    require(&draft.first_name, "First name is required.")?;
    require(&draft.last_name, "Last name is required.")?;
    require(&draft.email, "Email is required.")?;
    if !EMAIL_PATTERN.is_match(&draft.email) {
        return Err(ApiError::BadRequest("Email should be valid.".into()));
    }
    require(&draft.phone_number, "Phone number is required.")?;
    if !PHONE_PATTERN.is_match(&draft.phone_number) {
        return Err(ApiError::BadRequest("Invalid phone number format.".into()));
    }
    require(
        &draft.relationship_to_patient,
        "Relationship to patient is required.",
    )
}

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(message.into()));
    }
    Ok(())
}
