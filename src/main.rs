use tracing_subscriber::EnvFilter;

use patient_service::api::router::app_router;
use patient_service::api::types::ApiContext;
use patient_service::{config, db};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create data directory");
    }
    let conn = db::open_database(&db_path).expect("failed to open database");

    let app = app_router(ApiContext::new(conn));
    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await.expect("server error");
}
