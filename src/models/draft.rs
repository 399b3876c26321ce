//! Wire shapes for create/update requests. Structural validation happens at
//! the API boundary; the service layer only enforces semantic rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full replacement draft for a patient aggregate, used by both create and
/// update. The caregiver list is optional: absent means "leave the existing
/// caregivers untouched" on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub date_of_birth: NaiveDate,
    pub ethnicity: String,
    pub type_of_diabetes: String,
    pub date_of_diagnosis: NaiveDate,
    pub biological_sex: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub assigned_physician: String,
    pub medical_history: Vec<String>,
    pub address: AddressDraft,
    #[serde(default)]
    pub caregivers: Option<Vec<CaregiverDraft>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDraft {
    pub mailing_address: String,
    pub zipcode: String,
    pub county: String,
    pub state: String,
    pub country: String,
}

/// Caregiver entry in a draft. An id marks an existing caregiver to update
/// in place; no id marks a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverDraft {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub relationship_to_patient: String,
}
