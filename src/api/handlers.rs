use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::logic::{extract_fields, infer_param_value};
use crate::model::{
    Endpoint, EndpointUpdate, EndpointWithGroup, FieldDescription, Group, GroupRename, Id,
    NewEndpoint, NewGroup, NewProject, Project, QueryParamExample, QueryParamRow,
};
use crate::seed::SeedTable;
use crate::store::traits::Store;

/// Shared application state: the durable store plus the immutable seed
/// table, both built once at startup.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub seed: Arc<SeedTable>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, seed: SeedTable) -> Self {
        Self {
            store,
            seed: Arc::new(seed),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            seed: self.seed.clone(),
        }
    }
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(message: String) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(&message)),
    )
}

// ============ Project handlers ============

pub async fn list_projects<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<ListResponse<Project>>, HandlerError> {
    match state.store.list_projects().await {
        Ok(projects) => {
            let total = projects.len();
            Ok(Json(ListResponse {
                items: projects,
                total,
            }))
        }
        Err(e) => Err(internal_error(e.to_string())),
    }
}

pub async fn get_project<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<Project>, HandlerError> {
    match state.store.get_project(&project_id).await {
        Ok(Some(project)) => Ok(Json(project)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Project not found")),
        )),
        Err(e) => Err(internal_error(e.to_string())),
    }
}

pub async fn create_project<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_project): RequestJson<NewProject>,
) -> Result<Json<Project>, HandlerError> {
    if new_project.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Project name is required")),
        ));
    }

    let project = new_project.into_project();
    match state.store.upsert_project(project.clone()).await {
        Ok(()) => Ok(Json(project)),
        Err(e) => Err(internal_error(format!("Failed to create project: {}", e))),
    }
}

pub async fn delete_project<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    let projects = match state.store.list_projects().await {
        Ok(projects) => projects,
        Err(e) => return Err(internal_error(format!("Failed to check projects: {}", e))),
    };

    if !projects.iter().any(|project| project.id == project_id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Project not found")),
        ));
    }

    // At least one project must remain
    if projects.len() <= 1 {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "Cannot delete the last remaining project",
            )),
        ));
    }

    match state.store.delete_project(&project_id).await {
        Ok(true) => Ok(Json(serde_json::json!({"deleted": project_id}))),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Project not found")),
        )),
        Err(e) => Err(internal_error(format!("Failed to delete project: {}", e))),
    }
}

// ============ Group handlers ============

pub async fn list_groups<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<ListResponse<Group>>, HandlerError> {
    match state.store.list_groups_for_project(&project_id).await {
        Ok(groups) => {
            let total = groups.len();
            Ok(Json(ListResponse {
                items: groups,
                total,
            }))
        }
        Err(e) => Err(internal_error(e.to_string())),
    }
}

/// Find-or-create: `(project, name)` is the upsert key, mirroring the way
/// endpoint authoring attaches groups.
pub async fn create_group<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
    RequestJson(new_group): RequestJson<NewGroup>,
) -> Result<Json<Group>, HandlerError> {
    let name = new_group.name.trim().to_string();
    if name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Group name is required")),
        ));
    }

    match state.store.get_project(&project_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Project not found")),
            ))
        }
        Err(e) => return Err(internal_error(format!("Failed to check project: {}", e))),
    }

    find_or_create_group(&*state.store, &project_id, &name)
        .await
        .map(Json)
}

async fn find_or_create_group<S: Store>(
    store: &S,
    project_id: &Id,
    name: &str,
) -> Result<Group, HandlerError> {
    match store.find_group_by_name(project_id, name).await {
        Ok(Some(group)) => Ok(group),
        Ok(None) => {
            let group = Group::new(name.to_string(), project_id.clone());
            match store.upsert_group(group.clone()).await {
                Ok(()) => Ok(group),
                Err(e) => Err(internal_error(format!("Failed to create group: {}", e))),
            }
        }
        Err(e) => Err(internal_error(format!("Failed to look up group: {}", e))),
    }
}

pub async fn rename_group<S: Store>(
    State(state): State<AppState<S>>,
    Path(group_id): Path<Id>,
    RequestJson(rename): RequestJson<GroupRename>,
) -> Result<Json<Group>, HandlerError> {
    let mut group = match state.store.get_group(&group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Group not found")),
            ))
        }
        Err(e) => return Err(internal_error(format!("Failed to fetch group: {}", e))),
    };

    group.name = rename.name;
    match state.store.upsert_group(group.clone()).await {
        Ok(()) => Ok(Json(group)),
        Err(e) => Err(internal_error(format!("Failed to rename group: {}", e))),
    }
}

/// Deleting a group permanently deletes every endpoint in it.
pub async fn delete_group<S: Store>(
    State(state): State<AppState<S>>,
    Path(group_id): Path<Id>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    match state.store.delete_group(&group_id).await {
        Ok(true) => Ok(Json(serde_json::json!({"deleted": group_id}))),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Group not found")),
        )),
        Err(e) => Err(internal_error(format!("Failed to delete group: {}", e))),
    }
}

// ============ Endpoint handlers ============

pub async fn list_all_endpoints<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<ListResponse<EndpointWithGroup>>, HandlerError> {
    match state.store.list_endpoints().await {
        Ok(endpoints) => {
            let total = endpoints.len();
            Ok(Json(ListResponse {
                items: endpoints,
                total,
            }))
        }
        Err(e) => Err(internal_error(e.to_string())),
    }
}

pub async fn list_endpoints<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
) -> Result<Json<ListResponse<EndpointWithGroup>>, HandlerError> {
    match state.store.list_endpoints_for_project(&project_id).await {
        Ok(endpoints) => {
            let total = endpoints.len();
            Ok(Json(ListResponse {
                items: endpoints,
                total,
            }))
        }
        Err(e) => Err(internal_error(e.to_string())),
    }
}

pub async fn get_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    fetch_endpoint(&*state.store, &endpoint_id).await.map(Json)
}

async fn fetch_endpoint<S: Store>(
    store: &S,
    endpoint_id: &Id,
) -> Result<EndpointWithGroup, HandlerError> {
    match store.get_endpoint(endpoint_id).await {
        Ok(Some(endpoint)) => Ok(endpoint),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Endpoint not found")),
        )),
        Err(e) => Err(internal_error(format!("Failed to fetch endpoint: {}", e))),
    }
}

async fn save_endpoint<S: Store>(store: &S, endpoint: Endpoint) -> Result<(), HandlerError> {
    match store.upsert_endpoint(endpoint).await {
        Ok(()) => Ok(()),
        Err(e) => Err(internal_error(format!("Failed to update endpoint: {}", e))),
    }
}

pub async fn create_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(project_id): Path<Id>,
    RequestJson(new_endpoint): RequestJson<NewEndpoint>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    if new_endpoint.path.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Endpoint path is required")),
        ));
    }

    match state.store.get_project(&project_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Project not found")),
            ))
        }
        Err(e) => return Err(internal_error(format!("Failed to check project: {}", e))),
    }

    let group = find_or_create_group(&*state.store, &project_id, &new_endpoint.group).await?;
    let endpoint = new_endpoint.into_endpoint(group.id.clone());

    save_endpoint(&*state.store, endpoint.clone()).await?;
    Ok(Json(EndpointWithGroup {
        endpoint,
        group: group.name,
    }))
}

pub async fn update_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
    RequestJson(update): RequestJson<EndpointUpdate>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;
    update.apply(&mut row.endpoint);

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}

pub async fn delete_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
) -> Result<Json<serde_json::Value>, HandlerError> {
    match state.store.delete_endpoint(&endpoint_id).await {
        Ok(true) => Ok(Json(serde_json::json!({"deleted": endpoint_id}))),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Endpoint not found")),
        )),
        Err(e) => Err(internal_error(format!("Failed to delete endpoint: {}", e))),
    }
}

/// Store (or replace) the response body served for one status code. The
/// payload is validated by the JSON extractor and persisted pretty-printed,
/// exactly as the editor would have formatted it.
pub async fn set_response<S: Store>(
    State(state): State<AppState<S>>,
    Path((endpoint_id, status)): Path<(Id, u16)>,
    RequestJson(body): RequestJson<serde_json::Value>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let formatted = match serde_json::to_string_pretty(&body) {
        Ok(formatted) => formatted,
        Err(e) => return Err(internal_error(format!("Failed to format response: {}", e))),
    };

    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;
    row.endpoint.responses.set(status, formatted);

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}

pub async fn set_field_descriptions<S: Store>(
    State(state): State<AppState<S>>,
    Path((endpoint_id, status)): Path<(Id, u16)>,
    RequestJson(fields): RequestJson<Vec<FieldDescription>>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;
    row.endpoint.field_descriptions.insert(status, fields);

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}

/// Derive a draft field-description list from the stored response body for
/// one status. Nothing is persisted; the caller reviews and saves the draft
/// through the PUT route.
pub async fn generate_field_descriptions<S: Store>(
    State(state): State<AppState<S>>,
    Path((endpoint_id, status)): Path<(Id, u16)>,
) -> Result<Json<Vec<FieldDescription>>, HandlerError> {
    let row = fetch_endpoint(&*state.store, &endpoint_id).await?;

    match row.endpoint.responses.get(status) {
        Some(body) => Ok(Json(extract_fields(body))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No response stored for that status")),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestBodyUpdate {
    pub request_body: String,
}

pub async fn set_request_body<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
    RequestJson(update): RequestJson<RequestBodyUpdate>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;
    row.endpoint.request_body = Some(update.request_body);

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}

/// Replace the endpoint's query-parameter examples. Row keys must be
/// non-empty and unique; raw values are inferred into typed examples.
pub async fn set_query_params<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
    RequestJson(rows): RequestJson<Vec<QueryParamRow>>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let mut params: HashMap<String, QueryParamExample> = HashMap::new();
    for row in &rows {
        let key = row.key.trim();
        if key.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Every query parameter row needs a key")),
            ));
        }
        if params.contains_key(key) {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(&format!("Duplicate key: {}", key))),
            ));
        }
        params.insert(
            key.to_string(),
            QueryParamExample {
                value: infer_param_value(&row.value),
                description: row.description.clone(),
            },
        );
    }

    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;
    row.endpoint.query_params = params;

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct MoveEndpointRequest {
    pub group: String,
}

/// Re-home an endpoint into another named group of the same project, the
/// API counterpart of dragging an endpoint between group headers.
pub async fn move_endpoint_to_group<S: Store>(
    State(state): State<AppState<S>>,
    Path(endpoint_id): Path<Id>,
    RequestJson(request): RequestJson<MoveEndpointRequest>,
) -> Result<Json<EndpointWithGroup>, HandlerError> {
    let mut row = fetch_endpoint(&*state.store, &endpoint_id).await?;

    if row.group == request.group {
        return Ok(Json(row));
    }

    let current_group = match state.store.get_group(&row.endpoint.group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Current group not found")),
            ))
        }
        Err(e) => return Err(internal_error(format!("Failed to fetch group: {}", e))),
    };

    let target = match state
        .store
        .find_group_by_name(&current_group.project_id, &request.group)
        .await
    {
        Ok(Some(group)) => group,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Target group not found")),
            ))
        }
        Err(e) => return Err(internal_error(format!("Failed to look up group: {}", e))),
    };

    row.endpoint.group_id = target.id.clone();
    row.group = target.name.clone();

    save_endpoint(&*state.store, row.endpoint.clone()).await?;
    Ok(Json(row))
}
