//! The status path: one job write to its idempotent external effects.
//!
//! Invoked once per change notification with the before/after snapshot pair.
//! The edge is derived from that pair alone; global state is never re-read to
//! decide what happened. Check-run updates are plain REST overwrites and safe
//! to repeat; the comment and the counter are guarded by the persisted
//! success claim, so a redelivered success edge does neither twice.

use thiserror::Error;
use tracing::{info, warn};

use crate::github::{
    CheckConclusion, CheckRunGateway, CheckRunUpdate, GatewayFactory, GitHubApiError,
};
use crate::store::{JobChange, JobStore, OrganizationStore, StoreError, WorkflowStore};
use crate::types::BuildState;

use super::comment::upsert_build_comment;
use super::transition::{transition, StatusEdge};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    GitHub(#[from] GitHubApiError),
}

/// Applies the external effects for one observed job write.
///
/// Returns the edge that was acted on. Invalid transitions are logged and
/// reported as [`StatusEdge::None`]; an error return means an effect failed
/// and the invocation should be marked failed (the dispatcher may redeliver).
pub async fn handle_job_change<S, F>(
    store: &S,
    factory: &F,
    change: &JobChange,
) -> Result<StatusEdge, SyncError>
where
    S: JobStore + WorkflowStore + OrganizationStore + Sync,
    F: GatewayFactory,
{
    let job = &change.new;
    // A creating write has no prior snapshot; it starts from NotStarted, and
    // with all-false flags it produces no edge.
    let old_state = change
        .old
        .as_ref()
        .map(|j| j.status.state())
        .unwrap_or(BuildState::NotStarted);
    let new_state = job.status.state();

    let edge = match transition(old_state, new_state) {
        Ok(edge) => edge,
        Err(invalid) => {
            warn!(job_id = %job.id, error = %invalid, "ignoring invalid status transition");
            return Ok(StatusEdge::None);
        }
    };

    if edge == StatusEdge::None {
        return Ok(StatusEdge::None);
    }

    let gateway = factory.gateway_for(&job.github)?;
    let check_run_id = job.github_checks.check_run_id;

    match edge {
        StatusEdge::None => unreachable!("filtered above"),
        StatusEdge::StartedProcessing => {
            gateway
                .update_check_run(check_run_id, CheckRunUpdate::InProgress)
                .await?;
            info!(job_id = %job.id, %check_run_id, "build started");
        }
        StatusEdge::Failed => {
            gateway
                .update_check_run(
                    check_run_id,
                    CheckRunUpdate::Completed {
                        conclusion: CheckConclusion::Failure,
                    },
                )
                .await?;
            info!(job_id = %job.id, %check_run_id, "build failed");
        }
        StatusEdge::Succeeded => {
            gateway
                .update_check_run(
                    check_run_id,
                    CheckRunUpdate::Completed {
                        conclusion: CheckConclusion::Success,
                    },
                )
                .await?;

            // Everything past the claim runs at most once per job, however
            // many times the success edge is delivered.
            if store.claim_success(&job.id).await? {
                let workflow = store.get_workflow(&job.workflow_id).await?;
                let build_number = store
                    .increment_build_number(&workflow.organization_id, job.platform)
                    .await?;
                upsert_build_comment(
                    &gateway,
                    job.github_checks.issue_number,
                    &workflow.workflow_name,
                    build_number,
                )
                .await?;
                info!(
                    job_id = %job.id,
                    %check_run_id,
                    build_number,
                    "build succeeded, reported build number"
                );
            } else {
                info!(job_id = %job.id, "success already notified, skipping report");
            }
        }
    }

    Ok(edge)
}
