//! Workflow CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use eventide_shared::WorkflowId;

use super::dto::{WorkflowRequest, WorkflowResponse};
use super::error::ApiError;
use super::AppState;

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<WorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    let workflow = state.workflows.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(workflow.into())))
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkflowResponse>>, ApiError> {
    let workflows = state.workflows.list().await?;
    Ok(Json(workflows.into_iter().map(Into::into).collect()))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state.workflows.get(WorkflowId::from_uuid(id)).await?;
    Ok(Json(workflow.into()))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state
        .workflows
        .update(WorkflowId::from_uuid(id), request.into())
        .await?;
    Ok(Json(workflow.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.workflows.delete(WorkflowId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let workflow = state
        .workflows
        .toggle_status(WorkflowId::from_uuid(id))
        .await?;
    Ok(Json(workflow.into()))
}
