pub mod caregiver;
pub mod draft;
pub mod patient;

pub use caregiver::*;
pub use draft::*;
pub use patient::*;
