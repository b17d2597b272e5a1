use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::database::{DeleteResult, Document, InsertOneResult, UpdateResult};
use crate::error::ApiResult;
use crate::services::applications;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Value,
}

/// GET /job-applications/jobs/:job_id - who applied to a job
pub async fn by_job(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(applications::list_for_job(state.store.as_ref(), &job_id).await?))
}

/// POST /job-applications
pub async fn post(
    State(state): State<AppState>,
    Json(application): Json<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    Ok(Json(applications::submit(state.store.as_ref(), application).await?))
}

/// PATCH /job-applications/:id - set the application status
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<UpdateResult>> {
    Ok(Json(applications::set_status(state.store.as_ref(), &id, update.status).await?))
}

/// DELETE /job-applications/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<DeleteResult>> {
    Ok(Json(applications::withdraw(state.store.as_ref(), &id).await?))
}
