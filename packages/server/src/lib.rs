pub mod config;
pub mod controller;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower::{Layer, ServiceExt};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::error::ErrorBody;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::models::result::{
    OwnerSummary, ResultEnvelope, ResultListResponse, ResultRequest, ResultResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Results API",
        version = "1.0.0",
        description = "Per-user timestamped results with conditional requests and JSON/XML output"
    ),
    paths(
        handlers::auth::login,
        handlers::results::list_results,
        handlers::results::create_result,
        handlers::results::get_result,
        handlers::results::update_result,
        handlers::results::delete_result,
        handlers::results::collection_options,
        handlers::results::item_options,
    ),
    components(schemas(
        ResultRequest,
        ResultResponse,
        OwnerSummary,
        ResultEnvelope,
        ResultListResponse,
        ErrorBody,
        LoginRequest,
        LoginResponse,
    )),
    tags(
        (name = "Auth", description = "Bearer token issuance"),
        (name = "Results", description = "Result CRUD with ETag preconditions"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);
    let api = ApiDoc::openapi();

    let router = axum::Router::new()
        .nest("/api", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    match cors {
        Some(cors) => router.layer(middleware::from_fn_with_state(cors, apply_cors)),
        None => router,
    }
}

/// Run `cors` for everything except plain `OPTIONS` requests.
///
/// `CorsLayer` answers every `OPTIONS` as a preflight, which would hide the
/// `Allow` responses of the results routes.
async fn apply_cors(State(cors): State<CorsLayer>, req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS && !is_preflight(&req) {
        return next.run(req).await;
    }
    match cors.layer(next).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

fn is_preflight(req: &Request) -> bool {
    let headers = req.headers();
    headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// CORS is enabled only when origins are configured; `*` allows any origin.
fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if config.allow_origins.is_empty() {
        return None;
    }

    let allow_origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::IF_MATCH,
            header::IF_NONE_MATCH,
        ])
        .expose_headers([
            header::ETAG,
            header::LOCATION,
            header::ALLOW,
            header::CACHE_CONTROL,
        ])
        .max_age(Duration::from_secs(config.max_age));
    Some(layer)
}
