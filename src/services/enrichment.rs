use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::database::{Collection, Document, DocumentStore, StoreError, ID_FIELD};

/// Job fields copied onto each application for display
pub const DISPLAY_FIELDS: [&str; 4] = ["title", "company", "company_logo", "location"];

/// Copy display fields from each application's parent job onto the application.
///
/// All referenced jobs are fetched in one batched lookup. Applications whose
/// `job_id` is missing, malformed or points at no job are returned untouched;
/// order is preserved.
pub async fn enrich_applications(
    store: &dyn DocumentStore,
    mut applications: Vec<Document>,
) -> Result<Vec<Document>, StoreError> {
    let job_ids: Vec<Uuid> = applications
        .iter()
        .filter_map(referenced_job_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if job_ids.is_empty() {
        return Ok(applications);
    }

    let jobs: HashMap<Uuid, Document> = store
        .find_by_ids(Collection::Jobs, &job_ids)
        .await?
        .into_iter()
        .filter_map(|job| {
            let id = job.get(ID_FIELD).and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())?;
            Some((id, job))
        })
        .collect();

    tracing::debug!(
        "Enriching {} applications from {} of {} referenced jobs",
        applications.len(),
        jobs.len(),
        job_ids.len()
    );

    for application in applications.iter_mut() {
        if let Some(job) = referenced_job_id(application).and_then(|id| jobs.get(&id)) {
            project_display_fields(job, application);
        }
    }

    Ok(applications)
}

fn referenced_job_id(application: &Document) -> Option<Uuid> {
    application
        .get("job_id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

// A field the job lacks is cleared on the application too, so the
// response always reflects the job as it is now.
fn project_display_fields(job: &Document, application: &mut Document) {
    for field in DISPLAY_FIELDS {
        match job.get(field) {
            Some(value) => {
                application.insert(field.to_string(), value.clone());
            }
            None => {
                application.remove(field);
            }
        }
    }
}
