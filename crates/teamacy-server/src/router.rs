use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{MethodRouter, get, post},
};
use teamacy_api::middleware::{require_admin, require_auth};
use teamacy_api::{AppState, auth, messages};
use teamacy_types::api::StatusMessage;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsOrigins;

pub fn build_router(state: AppState, origins: &CorsOrigins) -> Router {
    let public_routes = Router::new()
        .route("/api", get(root))
        .route("/api/", get(root))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/messages", post(messages::submit_message));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // route_layer: the last layer added runs first, so auth resolves the user
    // before the admin check reads it.
    let admin_routes = Router::new()
        .route("/api/admin/messages", get(messages::list_messages))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // Legacy paths: public POST, admin GET on one method router so other
    // methods still get 405.
    let legacy_routes = Router::new()
        .route(
            "/api/enquiries",
            post(messages::submit_enquiry).merge(admin_only(&state, get(messages::list_enquiries))),
        )
        .route(
            "/api/feedback",
            post(messages::submit_feedback).merge(admin_only(&state, get(messages::list_feedback))),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(legacy_routes)
        .with_state(state)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}

fn admin_only(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "Teamacy API running".to_string(),
    })
}

/// Any method and header, credentials allowed. Origins are mirrored rather
/// than wildcarded since browsers refuse `*` together with credentials.
pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::mirror_request(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
