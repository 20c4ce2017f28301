//! Typed webhook events.
//!
//! Only the fields the trigger path actually consumes are carried; everything
//! else in GitHub's payload is dropped at parse time.

use crate::types::{PrNumber, RepoId, Sha};

/// A parsed GitHub webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEvent {
    PullRequest(PullRequestEvent),
}

/// Pull-request actions that trigger builds.
///
/// All other actions (labeled, assigned, closed, ...) are dropped during
/// parsing and never reach the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrAction {
    Opened,
    Reopened,
    Synchronize,
    Edited,
}

impl PrAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrAction::Opened => "opened",
            PrAction::Reopened => "reopened",
            PrAction::Synchronize => "synchronize",
            PrAction::Edited => "edited",
        }
    }
}

/// A pull-request event carrying everything the creation path needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub repo: RepoId,
    /// The repository's HTML URL, matched against workflow configurations.
    pub repository_url: String,
    pub action: PrAction,
    pub pr_number: PrNumber,
    pub head_sha: Sha,
    pub base_branch: String,
    pub head_branch: String,
    /// Absent when the app is not installed on the repository; the handler
    /// rejects such deliveries.
    pub installation_id: Option<u64>,
}
