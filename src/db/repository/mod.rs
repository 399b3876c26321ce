pub mod address;
pub mod caregiver;
pub mod patient;
