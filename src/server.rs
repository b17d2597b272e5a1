use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::state::AppState;

/// Build the full router over an already-constructed state
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_routes())
        .merge(job_routes())
        .merge(application_routes())
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use public::auth;

    Router::new().route("/jwt", post(auth::login))
}

fn job_routes() -> Router<AppState> {
    use public::jobs;

    Router::new()
        .route("/jobs", get(jobs::list).post(jobs::post))
        .route("/jobs/:id", get(jobs::get))
}

fn application_routes() -> Router<AppState> {
    use public::applications;

    Router::new()
        // Listing is token-guarded; posting is public
        .route(
            "/job-applications",
            get(protected::applications::list_mine).post(applications::post),
        )
        .route("/job-applications/jobs/:job_id", get(applications::by_job))
        .route(
            "/job-applications/:id",
            axum::routing::patch(applications::patch).delete(applications::delete),
        )
}

/// Credentialed CORS restricted to the configured origins
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}
