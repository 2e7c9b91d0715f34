//! Route table and the middleware stack wrapped around it.

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info_span};
use uuid::Uuid;

use crate::{
    auth::require_basic_auth,
    error::handle_panic,
    handlers::{self, collections, documents, health, protected},
    state::AppState,
};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a random UUID to requests that arrive without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Builds the application router.
///
/// Request bodies are capped at `max_body_bytes`.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .route("/collections", get(collections::list).post(collections::create))
        .route(
            "/collections/{name}",
            get(collections::get).delete(collections::delete),
        )
        .route(
            "/collections/{name}/documents",
            get(documents::list).post(documents::create),
        )
        .route(
            "/collections/{name}/documents/{id}",
            get(documents::get)
                .put(documents::update)
                .delete(documents::delete)
                .post(documents::create_with_id),
        )
        .route("/collections/{name}/bulk", post(documents::bulk_create))
        .route("/upload/{name}", post(documents::upload))
        .nest("/protected", protected_routes(&state));

    let app = Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .with_state(state);

    with_middleware(app, max_body_bytes)
}

/// Wraps `app` in the body limit, request id, tracing and panic recovery layers.
pub fn with_middleware(app: Router, max_body_bytes: usize) -> Router {
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, UuidRequestId))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id,
                    )
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(CatchPanicLayer::custom(handle_panic));

    app.layer(DefaultBodyLimit::max(max_body_bytes)).layer(layers)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new().route("/info", get(protected::info));

    match &state.credentials {
        Some(credentials) => routes.route_layer(middleware::from_fn_with_state(
            credentials.clone(),
            require_basic_auth,
        )),
        None => routes,
    }
}
