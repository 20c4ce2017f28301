//! Job endpoints: the executor's status callback and a point read.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::debug;

use crate::github::GatewayFactory;
use crate::store::{JobStore, OrganizationStore, StoreError, WorkflowStore};
use crate::types::{BuildJob, JobId, StatusFlags};

use super::AppState;

#[derive(Debug, Error)]
pub enum JobApiError {
    #[error("{0}")]
    NotFound(StoreError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for JobApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::JobNotFound(_) => JobApiError::NotFound(e),
            other => JobApiError::Store(other),
        }
    }
}

impl IntoResponse for JobApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            JobApiError::NotFound(_) => StatusCode::NOT_FOUND,
            JobApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// `POST /api/v1/jobs/{id}/status`
///
/// The external build executor reports its flags here. The flags are written
/// verbatim; the synchronizer reacts to the resulting change notification,
/// not to this request.
pub async fn update_status_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<String>,
    Json(status): Json<StatusFlags>,
) -> Result<Json<BuildJob>, JobApiError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
{
    let id = JobId::new(id);
    debug!(job_id = %id, ?status, "status callback");
    let change = state.store().update_status(&id, status).await?;
    Ok(Json(change.new))
}

/// `GET /api/v1/jobs/{id}`
pub async fn get_job_handler<S, F>(
    State(state): State<AppState<S, F>>,
    Path(id): Path<String>,
) -> Result<Json<BuildJob>, JobApiError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Send + Sync + 'static,
{
    let job = state.store().get_job(&JobId::new(id)).await?;
    Ok(Json(job))
}
