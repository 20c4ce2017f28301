//! The creation path: pull-request event to persisted jobs.

use thiserror::Error;
use tracing::{info, warn};

use crate::github::{CheckRunGateway, GatewayFactory, GitHubApiError};
use crate::registry::{self, RegistryError};
use crate::store::{JobStore, StoreError, WorkflowStore};
use crate::types::{BranchSnapshot, BuildJob, CheckHandles, GitHubAddress, JobId};
use crate::webhooks::PullRequestEvent;

#[derive(Debug, Error)]
pub enum TriggerError {
    /// The delivery carried no installation: the app cannot act on the
    /// repository.
    #[error("webhook delivery has no installation id")]
    MissingInstallation,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    GitHub(#[from] GitHubApiError),
}

/// Handles one pull-request event: resolves the registered workflows, and for
/// each branch-matching candidate creates a queued check run and persists a
/// fresh job.
///
/// A failing candidate aborts only itself; the remaining candidates are still
/// attempted, and the first failure is returned afterwards so the delivery is
/// marked failed and redelivered. There is no cross-candidate transaction:
/// a redelivery after a partial failure re-runs the successful candidates
/// too.
pub async fn handle_pull_request<S, F>(
    store: &S,
    factory: &F,
    app_id: Option<u64>,
    event: &PullRequestEvent,
) -> Result<Vec<JobId>, TriggerError>
where
    S: JobStore + WorkflowStore + Sync,
    F: GatewayFactory,
{
    let installation_id = event
        .installation_id
        .ok_or(TriggerError::MissingInstallation)?;

    let address = GitHubAddress {
        repository_url: event.repository_url.clone(),
        owner: event.repo.owner.clone(),
        repository_name: event.repo.repo.clone(),
        installation_id,
        app_id,
    };
    let gateway = factory.gateway_for(&address)?;

    let workflows = registry::find_workflows(store, &event.repository_url).await?;

    let mut created = Vec::new();
    let mut first_error: Option<TriggerError> = None;

    for workflow in workflows {
        if !registry::matches(&workflow, &event.base_branch, &event.head_branch) {
            continue;
        }

        match gateway
            .create_check_run(&workflow.workflow_name, &event.head_sha)
            .await
        {
            Ok(check_run_id) => {
                let job = BuildJob::new(
                    workflow.platform,
                    workflow.id.clone(),
                    BranchSnapshot {
                        base_branch: event.base_branch.clone(),
                        build_branch: event.head_branch.clone(),
                    },
                    address.clone(),
                    CheckHandles {
                        issue_number: event.pr_number,
                        check_run_id,
                    },
                );
                let job_id = job.id.clone();
                match store.create_job(job).await {
                    Ok(()) => {
                        info!(
                            job_id = %job_id,
                            workflow_id = %workflow.id,
                            pr = %event.pr_number,
                            "created build job"
                        );
                        created.push(job_id);
                    }
                    Err(e) => {
                        warn!(workflow_id = %workflow.id, error = %e, "failed to persist job");
                        first_error.get_or_insert(TriggerError::Store(e));
                    }
                }
            }
            Err(e) => {
                warn!(
                    workflow_id = %workflow.id,
                    pr = %event.pr_number,
                    error = %e,
                    "failed to create check run"
                );
                first_error.get_or_insert(TriggerError::GitHub(e));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(created),
    }
}
