use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::database::{parse_id, Collection, Document, Filter, InsertOneResult};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    /// Restrict to jobs posted by this HR email
    pub email: Option<String>,
}

/// GET /jobs - all jobs, or only those whose hr_email matches `?email=`
pub async fn list(State(state): State<AppState>, Query(query): Query<JobsQuery>) -> ApiResult<Json<Vec<Document>>> {
    let filter = match query.email.filter(|e| !e.is_empty()) {
        Some(email) => Filter::eq("hr_email", email),
        None => Filter::all(),
    };
    let jobs = state.store.find(Collection::Jobs, &filter).await?;
    Ok(Json(jobs))
}

/// GET /jobs/:id - the job, or `null` when no job has that id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Option<Document>>> {
    let id = parse_id(&id)?;
    Ok(Json(state.store.find_by_id(Collection::Jobs, id).await?))
}

/// POST /jobs - store the posted job as-is
pub async fn post(State(state): State<AppState>, Json(job): Json<Document>) -> ApiResult<Json<InsertOneResult>> {
    let result = state.store.insert_one(Collection::Jobs, job).await?;
    tracing::info!("Job {} posted", result.inserted_id);
    Ok(Json(result))
}
