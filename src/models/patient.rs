use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Caregiver;

/// Aggregate root. Owns exactly one [`Address`] and the caregiver collection;
/// all consistency rules for the children are enforced through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
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
    pub notes: Option<String>,
    pub assigned_physician: String,
    pub medical_history: Vec<String>,
    pub address: Address,
    pub caregivers: Vec<Caregiver>,
}

/// Mailing address; lives and dies with its owning patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub mailing_address: String,
    pub zipcode: String,
    pub county: String,
    pub state: String,
    pub country: String,
    // Back-reference only; omitted from JSON to avoid representation cycles.
    #[serde(skip_serializing, default)]
    pub patient_id: Uuid,
}
