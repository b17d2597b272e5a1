use serde_json::Value;
use uuid::Uuid;

use crate::database::{
    parse_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, UpdateResult,
};
use crate::error::ApiError;

use super::enrichment::enrich_applications;

/// Counter on a job bumped once per submitted application
pub const APPLICATION_COUNT_FIELD: &str = "applicationCount";

/// Applications submitted by `email`, each carrying its job's display fields
pub async fn list_for_applicant(store: &dyn DocumentStore, email: &str) -> Result<Vec<Document>, ApiError> {
    let applications = store
        .find(Collection::JobApplications, &Filter::eq("applicant_email", email))
        .await?;
    Ok(enrich_applications(store, applications).await?)
}

/// Applications referencing `job_id`, as stored
pub async fn list_for_job(store: &dyn DocumentStore, job_id: &str) -> Result<Vec<Document>, ApiError> {
    Ok(store
        .find(Collection::JobApplications, &Filter::eq("job_id", job_id))
        .await?)
}

/// Store an application and bump its job's application count.
///
/// The parent job must exist and carry a count that can still be bumped;
/// otherwise nothing is inserted. `job_id` is stored in its canonical form so
/// the application is found again by [`list_for_job`]. If the increment fails
/// after the insert, the application is removed again.
pub async fn submit(store: &dyn DocumentStore, mut application: Document) -> Result<InsertOneResult, ApiError> {
    let raw_job_id = application
        .get("job_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("job_id is required"))?;
    let job_id = parse_id(raw_job_id)?;

    let Some(job) = store.find_by_id(Collection::Jobs, job_id).await? else {
        tracing::warn!("Application rejected: job {} does not exist", job_id);
        return Err(ApiError::not_found(format!("Job {} not found", job_id)));
    };
    ensure_countable(&job, job_id)?;

    application.insert("job_id".to_string(), Value::from(job_id.to_string()));
    let inserted = store.insert_one(Collection::JobApplications, application).await?;

    let bumped = match store.increment(Collection::Jobs, job_id, APPLICATION_COUNT_FIELD, 1).await {
        Ok(bumped) => bumped,
        Err(e) => {
            tracing::warn!(
                "Rolling back application {} in {}: count update failed",
                inserted.inserted_id,
                Collection::JobApplications.name()
            );
            store.delete_by_id(Collection::JobApplications, inserted.inserted_id).await?;
            return Err(e.into());
        }
    };
    if bumped.matched_count == 0 {
        // Job removed between the existence check and the increment
        tracing::warn!("Job {} vanished before its application count was updated", job_id);
    }

    tracing::info!("Application {} submitted for job {}", inserted.inserted_id, job_id);
    Ok(inserted)
}

/// The job's count must be absent, null, or an integer below the maximum
fn ensure_countable(job: &Document, job_id: Uuid) -> Result<(), ApiError> {
    let current = match job.get(APPLICATION_COUNT_FIELD) {
        None | Some(Value::Null) => Some(0),
        Some(v) => v.as_i64(),
    };
    match current.and_then(|n| n.checked_add(1)) {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(
                "Application rejected: {} of job {} cannot be incremented ({:?})",
                APPLICATION_COUNT_FIELD,
                job_id,
                job.get(APPLICATION_COUNT_FIELD)
            );
            Err(ApiError::conflict(format!(
                "Job {} has an {} that cannot be incremented",
                job_id, APPLICATION_COUNT_FIELD
            )))
        }
    }
}

/// `$set` the status of one application
pub async fn set_status(store: &dyn DocumentStore, id: &str, status: Value) -> Result<UpdateResult, ApiError> {
    let id = parse_id(id)?;
    let mut fields = Document::new();
    fields.insert("status".to_string(), status);
    Ok(store.update_set(Collection::JobApplications, id, fields).await?)
}

pub async fn withdraw(store: &dyn DocumentStore, id: &str) -> Result<DeleteResult, ApiError> {
    let id = parse_id(id)?;
    Ok(store.delete_by_id(Collection::JobApplications, id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::http::StatusCode;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn submit_increments_application_count() {
        let store = MemoryStore::new();
        let job = store.insert_one(Collection::Jobs, doc(json!({ "title": "T" }))).await.unwrap().inserted_id;

        for _ in 0..2 {
            submit(&store, doc(json!({ "job_id": job.to_string(), "applicant_email": "a@b.c" })))
                .await
                .unwrap();
        }

        let stored = store.find_by_id(Collection::Jobs, job).await.unwrap().unwrap();
        assert_eq!(stored[APPLICATION_COUNT_FIELD], json!(2));
    }

    #[tokio::test]
    async fn submit_against_missing_job_is_not_found_and_inserts_nothing() {
        let store = MemoryStore::new();
        let err = submit(&store, doc(json!({ "job_id": uuid::Uuid::new_v4().to_string() })))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let all = store.find(Collection::JobApplications, &Filter::all()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn submit_without_job_id_is_bad_request() {
        let store = MemoryStore::new();
        let err = submit(&store, doc(json!({ "applicant_email": "a@b.c" }))).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = submit(&store, doc(json!({ "job_id": "nope" }))).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_request() {
        let store = MemoryStore::new();
        let err = set_status(&store, "xyz", json!("accepted")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = withdraw(&store, "xyz").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn uncountable_job_rejects_application_and_inserts_nothing() {
        let store = MemoryStore::new();
        for count in [json!("5"), json!(1.5), json!(i64::MAX)] {
            let job = store
                .insert_one(Collection::Jobs, doc(json!({ "title": "T", "applicationCount": count.clone() })))
                .await
                .unwrap()
                .inserted_id;

            let err = submit(&store, doc(json!({ "job_id": job.to_string(), "applicant_email": "a@b.c" })))
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "count {}", count);

            let stored = store.find_by_id(Collection::Jobs, job).await.unwrap().unwrap();
            assert_eq!(stored[APPLICATION_COUNT_FIELD], count);
        }

        let all = store.find(Collection::JobApplications, &Filter::all()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn null_count_is_treated_as_zero() {
        let store = MemoryStore::new();
        let job = store
            .insert_one(Collection::Jobs, doc(json!({ "title": "T", "applicationCount": null })))
            .await
            .unwrap()
            .inserted_id;

        submit(&store, doc(json!({ "job_id": job.to_string() }))).await.unwrap();

        let stored = store.find_by_id(Collection::Jobs, job).await.unwrap().unwrap();
        assert_eq!(stored[APPLICATION_COUNT_FIELD], json!(1));
    }

    #[tokio::test]
    async fn submit_stores_canonical_job_id() {
        let store = MemoryStore::new();
        let job = store.insert_one(Collection::Jobs, doc(json!({ "title": "T" }))).await.unwrap().inserted_id;

        let padded = format!("  {}  ", job.to_string().to_uppercase());
        let id = submit(&store, doc(json!({ "job_id": padded }))).await.unwrap().inserted_id;

        let stored = store.find_by_id(Collection::JobApplications, id).await.unwrap().unwrap();
        assert_eq!(stored["job_id"], json!(job.to_string()));

        let listed = list_for_job(&store, &job.to_string()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
