use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::database::Document;
use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::services::applications;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MineQuery {
    pub email: Option<String>,
}

/// GET /job-applications?email= - the caller's own applications, enriched
/// with job display fields. The token identity must match `email`.
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MineQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    user.require_email(query.email.as_deref())?;
    Ok(Json(applications::list_for_applicant(state.store.as_ref(), &user.email).await?))
}
