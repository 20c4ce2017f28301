//! Build-number comment upsert.
//!
//! Each workflow owns at most one comment per PR, recognized by a stable
//! prefix derived from the workflow name. Re-running the upsert overwrites
//! that comment instead of stacking a new one, so success redeliveries and
//! repeated builds of the same PR stay at one comment per workflow.

use tracing::debug;

use crate::github::{CheckRunGateway, GitHubApiError};
use crate::types::PrNumber;

/// The identifying prefix of a workflow's build-number comment.
///
/// Comment ownership is keyed on this prefix alone; the number after it
/// changes between builds.
pub fn comment_prefix(workflow_name: &str) -> String {
    format!("{workflow_name}: Build Number:")
}

/// The full comment body for a reported build number.
pub fn comment_body(workflow_name: &str, build_number: u64) -> String {
    format!("{} {}", comment_prefix(workflow_name), build_number)
}

/// Creates or overwrites the workflow's build-number comment on the PR.
///
/// Lists the PR's comments, finds the first whose body starts with the
/// workflow's prefix, and updates it in place; creates the comment when no
/// owner exists yet.
pub async fn upsert_build_comment<G: CheckRunGateway>(
    gateway: &G,
    pr: PrNumber,
    workflow_name: &str,
    build_number: u64,
) -> Result<(), GitHubApiError> {
    let prefix = comment_prefix(workflow_name);
    let body = comment_body(workflow_name, build_number);

    let comments = gateway.list_comments(pr).await?;
    match comments.iter().find(|c| c.body.starts_with(&prefix)) {
        Some(existing) => {
            debug!(%pr, comment_id = %existing.id, build_number, "updating build-number comment");
            gateway.update_comment(existing.id, &body).await
        }
        None => {
            let id = gateway.create_comment(pr, &body).await?;
            debug!(%pr, comment_id = %id, build_number, "created build-number comment");
            Ok(())
        }
    }
}
