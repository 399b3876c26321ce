//! HTTP router. Routes are nested under `/api/`; the CORS layer admits the
//! local frontend origin.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the application router with all patient routes mounted.
pub fn app_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/patients", post(endpoints::patients::create))
        .route("/patients/search", get(endpoints::patients::search))
        .route(
            "/patients/:id",
            get(endpoints::patients::get)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/patients/:id/caregivers",
            post(endpoints::caregivers::add),
        )
        .route(
            "/patients/:id/caregivers/:caregiver_id",
            delete(endpoints::caregivers::remove),
        )
        .with_state(ctx);

    Router::new().nest("/api", api).layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(
            "http://localhost:5173"
                .parse::<HeaderValue>()
                .expect("valid origin"),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
