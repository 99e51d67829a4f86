use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use crate::api::handlers::AppState;
use crate::logic::{EndpointSource, Resolution, ResolveError, Resolver, SnapshotSource, StoreSource};
use crate::model::{normalize_path, MockDefinition};
use crate::store::traits::Store;

/// Header carrying a request-scoped snapshot of endpoint definitions that
/// overrides the durable store for this request only.
pub const SNAPSHOT_HEADER: &str = "x-mock-endpoints";

#[derive(Debug, Deserialize)]
pub struct MockQuery {
    /// Requested status code. Anything absent or unparsable becomes 200.
    pub status: Option<String>,
}

pub async fn serve_get<S: Store>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<MockQuery>,
    headers: HeaderMap,
) -> Response {
    handle_mock(state, "GET", path, query, headers).await
}

pub async fn serve_post<S: Store>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<MockQuery>,
    headers: HeaderMap,
) -> Response {
    handle_mock(state, "POST", path, query, headers).await
}

pub async fn serve_put<S: Store>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<MockQuery>,
    headers: HeaderMap,
) -> Response {
    handle_mock(state, "PUT", path, query, headers).await
}

pub async fn serve_delete<S: Store>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    Query(query): Query<MockQuery>,
    headers: HeaderMap,
) -> Response {
    handle_mock(state, "DELETE", path, query, headers).await
}

async fn handle_mock<S: Store>(
    state: AppState<S>,
    method: &str,
    path: String,
    query: MockQuery,
    headers: HeaderMap,
) -> Response {
    // The wildcard capture arrives without its leading slash
    let path = normalize_path(&path);
    let requested_status = query
        .status
        .as_deref()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(200);

    let snapshot = parse_snapshot(&headers).map(SnapshotSource::new);
    let store_source = StoreSource::new(&*state.store);

    let mut authored: Vec<&dyn EndpointSource> = Vec::with_capacity(2);
    if let Some(snapshot) = &snapshot {
        authored.push(snapshot);
    }
    authored.push(&store_source);

    let resolver = Resolver::new(authored, &state.seed);

    match resolver.resolve(method, &path, requested_status).await {
        Ok(Resolution::Resolved { status, body }) => match StatusCode::from_u16(status) {
            Ok(code) => (code, Json(body)).into_response(),
            Err(_) => {
                log::error!(
                    "Resolved response for {} {} carries invalid HTTP status {}",
                    method,
                    path,
                    status
                );
                internal_error()
            }
        },
        Ok(Resolution::NotFound { method, path }) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("Endpoint {} {} not found", method, path)
            })),
        )
            .into_response(),
        Err(ResolveError::Store(source)) => {
            log::error!("Database error while resolving {} {}: {:#}", method, path, source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Database error"})),
            )
                .into_response()
        }
        Err(ResolveError::MalformedResponse { status, source }) => {
            log::error!(
                "Stored response for {} {} (status {}) is not valid JSON: {}",
                method,
                path,
                status,
                source
            );
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// A missing header means no override; a header that fails to parse is
/// ignored the same way rather than failing the request, but is logged.
fn parse_snapshot(headers: &HeaderMap) -> Option<Vec<MockDefinition>> {
    let value = headers.get(SNAPSHOT_HEADER)?;
    let text = match value.to_str() {
        Ok(text) => text,
        Err(_) => {
            log::warn!("Ignoring {} header with non-ASCII bytes", SNAPSHOT_HEADER);
            return None;
        }
    };

    match serde_json::from_str::<Vec<MockDefinition>>(text) {
        Ok(definitions) => Some(definitions),
        Err(e) => {
            log::warn!("Ignoring unparsable {} header: {}", SNAPSHOT_HEADER, e);
            None
        }
    }
}
