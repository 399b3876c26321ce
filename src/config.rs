use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "PatientService";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "patient_service=info,tower_http=info"
}

/// Get the application data directory (~/.patient-service)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".patient-service")
}

/// Path of the SQLite database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("patients.db")
}

/// Bind address, overridable via PATIENT_SERVICE_ADDR
pub fn bind_addr() -> SocketAddr {
    std::env::var("PATIENT_SERVICE_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)))
}
