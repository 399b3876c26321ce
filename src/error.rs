use uuid::Uuid;

use crate::db::DatabaseError;

/// Failure kinds surfaced by the patient service. The HTTP boundary maps
/// each kind to a status; storage failures pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("patient not found with id {0}")]
    PatientNotFound(Uuid),

    #[error("caregiver not found with id {0}")]
    CaregiverNotFound(Uuid),

    #[error("a patient with the same first name, last name, and date of birth already exists")]
    DuplicatePatient,

    #[error("a caregiver with these exact details already exists for this patient")]
    DuplicateCaregiver,

    #[error("caregiver {caregiver_id} does not belong to patient {patient_id}")]
    OwnershipViolation {
        caregiver_id: Uuid,
        patient_id: Uuid,
    },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
