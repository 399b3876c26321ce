use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caregiver attached to a patient. The patient is authoritative over the
/// collection; `patient_id` is a plain back-reference, not ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caregiver {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub relationship_to_patient: String,
    #[serde(skip_serializing, default)]
    pub patient_id: Uuid,
}
