//! Workflow registry: which configured workflows apply to a pull request.

use thiserror::Error;
use tracing::debug;

use crate::store::{StoreError, WorkflowStore};
use crate::types::WorkflowConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The repository has no registered workflows at all. Distinct from "has
    /// workflows but none match this PR", which is not an error.
    #[error("no workflows registered for repository {repository_url}")]
    NoWorkflows { repository_url: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Looks up every workflow registered for the repository URL.
///
/// Errors when the repository has zero registered workflows; branch matching
/// is the caller's per-candidate concern, not this lookup's.
pub async fn find_workflows<W: WorkflowStore>(
    store: &W,
    repository_url: &str,
) -> Result<Vec<WorkflowConfig>, RegistryError> {
    let workflows = store.workflows_for_repository(repository_url).await?;
    if workflows.is_empty() {
        return Err(RegistryError::NoWorkflows {
            repository_url: repository_url.to_string(),
        });
    }
    debug!(
        repository_url,
        count = workflows.len(),
        "resolved registered workflows"
    );
    Ok(workflows)
}

/// Whether a workflow applies to a PR with the given base and head branches.
///
/// True iff the base branches are equal AND the workflow either has no branch
/// pattern or the head branch contains the pattern as a literal substring
/// (never a glob or regex).
pub fn matches(config: &WorkflowConfig, base_branch: &str, head_branch: &str) -> bool {
    if config.base_branch != base_branch {
        return false;
    }
    match &config.branch_pattern {
        None => true,
        Some(pattern) => head_branch.contains(pattern.as_str()),
    }
}
