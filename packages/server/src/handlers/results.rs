use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::controller::results::{Conditional, Scope};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::format::Format;
use crate::extractors::json::AppJson;
use crate::models::result::{ResultEnvelope, ResultListResponse, ResultRequest};
use crate::state::AppState;

/// Canonical collection path, used to build `Location`.
pub const RESULTS_PATH: &str = "/api/v1/results";

/// Non-standard "Content Returned" status sent by a successful PUT.
///
/// Clients should treat it as 200 with a body; it is kept for compatibility
/// with existing consumers of this API.
pub const CONTENT_RETURNED: u16 = 209;

/// XML document element for success bodies.
const XML_ROOT: &str = "response";

#[utoipa::path(
    get,
    path = "/api/v1/results",
    tag = "Results",
    operation_id = "listResults",
    summary = "List results",
    description = "Returns the caller's results, or every result for `ROLE_ADMIN`. Supports `If-None-Match`.",
    responses(
        (status = 200, description = "Results", body = ResultListResponse),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No results (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, headers))]
pub async fn list_results(
    format: Format,
    caller: Result<AuthUser, AppError>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let outcome: Result<Response, AppError> = async {
        let caller = caller?;
        let listed = state
            .results_controller()
            .list(&caller, header_str(&headers, header::IF_NONE_MATCH))
            .await?;
        conditional_response(format, listed)
    }
    .await;
    outcome.unwrap_or_else(|e| e.render(format))
}

#[utoipa::path(
    post,
    path = "/api/v1/results",
    tag = "Results",
    operation_id = "createResult",
    summary = "Create a result",
    description = "Creates a result owned by `user` (email) or by the caller. Only `ROLE_ADMIN` may name another owner.",
    request_body = ResultRequest,
    responses(
        (status = 201, description = "Result created", body = ResultEnvelope),
        (status = 400, description = "Missing or malformed field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Owner is another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Owner not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, headers, payload))]
pub async fn create_result(
    format: Format,
    caller: Result<AuthUser, AppError>,
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<AppJson<ResultRequest>, AppError>,
) -> Response {
    let outcome: Result<Response, AppError> = async {
        let caller = caller?;
        let AppJson(payload) = payload?;
        let created = state.results_controller().create(&caller, payload).await?;

        let location = location_for(&headers, created.result.id);
        let mut response = format.body(StatusCode::CREATED, XML_ROOT, &created)?;
        set_header(&mut response, header::LOCATION, &location)?;
        Ok(response)
    }
    .await;
    outcome.unwrap_or_else(|e| e.render(format))
}

#[utoipa::path(
    get,
    path = "/api/v1/results/{id}",
    tag = "Results",
    operation_id = "getResult",
    summary = "Get a result by ID",
    description = "Returns one result. Non-admin callers may only read their own. Supports `If-None-Match`.",
    params(("id" = i32, Path, description = "Result ID, optionally suffixed with `.json` or `.xml`")),
    responses(
        (status = 200, description = "Result", body = ResultEnvelope),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Owned by another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Result not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, headers))]
pub async fn get_result(
    format: Format,
    caller: Result<AuthUser, AppError>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let outcome: Result<Response, AppError> = async {
        let caller = caller?;
        let id = parse_result_id(&raw_id)?;
        let found = state
            .results_controller()
            .get(&caller, id, header_str(&headers, header::IF_NONE_MATCH))
            .await?;
        conditional_response(format, found)
    }
    .await;
    outcome.unwrap_or_else(|e| e.render(format))
}

#[utoipa::path(
    put,
    path = "/api/v1/results/{id}",
    tag = "Results",
    operation_id = "updateResult",
    summary = "Replace a result",
    description = "Replaces `result` and `time`, and reassigns the owner when `user` is given. \
        Requires `If-Match` with the current ETag. Responds with the non-standard status 209 (Content Returned).",
    params(("id" = i32, Path, description = "Result ID")),
    request_body = ResultRequest,
    responses(
        (status = 209, description = "Result updated; body and new ETag returned", body = ResultEnvelope),
        (status = 400, description = "Missing or malformed field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Owned by another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Result or owner not found (NOT_FOUND)", body = ErrorBody),
        (status = 412, description = "If-Match missing or stale (PRECONDITION_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, headers, payload))]
pub async fn update_result(
    format: Format,
    caller: Result<AuthUser, AppError>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    payload: Result<AppJson<ResultRequest>, AppError>,
) -> Response {
    let outcome: Result<Response, AppError> = async {
        let caller = caller?;
        let id = parse_result_id(&raw_id)?;
        let AppJson(payload) = payload?;
        let updated = state
            .results_controller()
            .update(&caller, id, payload, header_str(&headers, header::IF_MATCH))
            .await?;

        let mut response = format.body(content_returned(), XML_ROOT, &updated.body)?;
        set_header(&mut response, header::ETAG, &updated.etag)?;
        Ok(response)
    }
    .await;
    outcome.unwrap_or_else(|e| e.render(format))
}

#[utoipa::path(
    delete,
    path = "/api/v1/results/{id}",
    tag = "Results",
    operation_id = "deleteResult",
    summary = "Delete a result",
    description = "Permanently deletes a result. Non-admin callers may only delete their own.",
    params(("id" = i32, Path, description = "Result ID")),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Owned by another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Result not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller))]
pub async fn delete_result(
    format: Format,
    caller: Result<AuthUser, AppError>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let outcome: Result<Response, AppError> = async {
        let caller = caller?;
        let id = parse_result_id(&raw_id)?;
        state.results_controller().delete(&caller, id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
    .await;
    outcome.unwrap_or_else(|e| e.render(format))
}

#[utoipa::path(
    options,
    path = "/api/v1/results",
    tag = "Results",
    operation_id = "resultCollectionOptions",
    summary = "Methods allowed on the collection",
    responses((status = 204, description = "Allow header lists the methods")),
)]
pub async fn collection_options() -> Response {
    options_response(Scope::Collection)
}

#[utoipa::path(
    options,
    path = "/api/v1/results/{id}",
    tag = "Results",
    operation_id = "resultOptions",
    summary = "Methods allowed on a single result",
    params(("id" = i32, Path, description = "Result ID")),
    responses((status = 204, description = "Allow header lists the methods")),
)]
pub async fn item_options() -> Response {
    options_response(Scope::Item)
}

fn options_response(scope: Scope) -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ALLOW, scope.allowed_methods()),
            (header::CACHE_CONTROL, "public, immutable"),
        ],
    )
        .into_response()
}

fn conditional_response<T: serde::Serialize>(
    format: Format,
    outcome: Conditional<T>,
) -> Result<Response, AppError> {
    match outcome {
        Conditional::NotModified => Ok(StatusCode::NOT_MODIFIED.into_response()),
        Conditional::Fresh { etag, body } => {
            let mut response = format.body(StatusCode::OK, XML_ROOT, &body)?;
            set_header(&mut response, header::ETAG, &etag)?;
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("private"));
            Ok(response)
        }
    }
}

/// Accepts `7`, `7.json` and `7.xml`; anything else cannot name a result.
fn parse_result_id(raw: &str) -> Result<i32, AppError> {
    let digits = raw
        .strip_suffix(".json")
        .or_else(|| raw.strip_suffix(".xml"))
        .unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("Result '{raw}' not found")));
    }
    digits
        .parse()
        .map_err(|_| AppError::NotFound(format!("Result with id #{digits} not found")))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn set_header(
    response: &mut Response,
    name: header::HeaderName,
    value: &str,
) -> Result<(), AppError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid {name} header: {e}")))?;
    response.headers_mut().insert(name, value);
    Ok(())
}

/// Absolute URL of a result, built from the request's `Host`.
fn location_for(headers: &HeaderMap, id: i32) -> String {
    let path = format!("{RESULTS_PATH}/{id}");
    let Some(host) = header_str(headers, header::HOST) else {
        return path;
    };
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}{path}")
}

fn content_returned() -> StatusCode {
    StatusCode::from_u16(CONTENT_RETURNED).unwrap_or(StatusCode::OK)
}
