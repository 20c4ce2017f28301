//! The build-job record and its status model.
//!
//! A [`BuildJob`] is the durable record tracking one triggered build from
//! creation to terminal status. The record's addressing fields are immutable
//! after creation; only `status` (written by the external build executor) and
//! `success_notified` (written by the synchronizer's success claim) change.
//!
//! # Wire shapes
//!
//! Job documents have existed in two shapes. The current shape nests the
//! GitHub addressing fields under `github` and the PR/check-run handles under
//! `githubChecks`. The legacy shape carried an access token inside `github`
//! and the handles under `checks` together with owner/repo/installation.
//! Deserialization accepts both and normalizes into the one canonical
//! [`BuildJob`] before the state machine ever sees the record; serialization
//! always emits the current shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{CheckRunId, JobId, Platform, PrNumber, RepoId, WorkflowId};

/// The three status flags written by the external build executor.
///
/// Flags are monotonic by contract: the executor only ever flips a flag
/// false→true, and at most one of `failure`/`success` becomes true. The core
/// does not enforce this on write; the transition logic tolerates any
/// observed combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub processing: bool,
    pub failure: bool,
    pub success: bool,
}

impl StatusFlags {
    /// Collapses the flag set into the closed state model.
    ///
    /// Terminal flags win over `processing` (a job can be observed with
    /// `processing` and a terminal flag both true).
    pub fn state(&self) -> BuildState {
        if self.success {
            BuildState::Succeeded
        } else if self.failure {
            BuildState::Failed
        } else if self.processing {
            BuildState::Processing
        } else {
            BuildState::NotStarted
        }
    }
}

/// The closed state model derived from [`StatusFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    NotStarted,
    Processing,
    Succeeded,
    Failed,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildState::Succeeded | BuildState::Failed)
    }
}

/// Snapshot of the PR's branches at job-creation time; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSnapshot {
    pub base_branch: String,
    pub build_branch: String,
}

/// Addressing information needed to call the GitHub API later without
/// re-deriving it from the original webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubAddress {
    pub repository_url: String,
    pub owner: String,
    pub repository_name: String,
    pub installation_id: u64,
    /// Absent on records normalized from the legacy shape.
    #[serde(default)]
    pub app_id: Option<u64>,
}

impl GitHubAddress {
    pub fn repo(&self) -> RepoId {
        RepoId::new(self.owner.clone(), self.repository_name.clone())
    }
}

/// Handles to the PR and the check run created at job-start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckHandles {
    pub issue_number: PrNumber,
    pub check_run_id: CheckRunId,
}

/// The central entity: one triggered build's durable lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildJob {
    #[serde(rename = "documentId")]
    pub id: JobId,
    pub platform: Platform,
    pub workflow_id: WorkflowId,
    pub branch: BranchSnapshot,
    pub github: GitHubAddress,
    pub github_checks: CheckHandles,
    #[serde(rename = "buildStatus")]
    pub status: StatusFlags,
    pub created_at: DateTime<Utc>,
    /// Persisted success-claim marker: set once by the synchronizer when the
    /// success edge is first acted on, so redelivered or concurrent success
    /// notifications do not repeat the comment and the counter increment.
    #[serde(default)]
    pub success_notified: bool,
}

impl BuildJob {
    /// Builds a fresh job with all-false status flags.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Platform,
        workflow_id: WorkflowId,
        branch: BranchSnapshot,
        github: GitHubAddress,
        github_checks: CheckHandles,
    ) -> Self {
        BuildJob {
            id: JobId::generate(),
            platform,
            workflow_id,
            branch,
            github,
            github_checks,
            status: StatusFlags::default(),
            created_at: Utc::now(),
            success_notified: false,
        }
    }
}

// ─── Versioned wire boundary ─────────────────────────────────────────────────

/// Accepted wire shapes for a job document.
///
/// Untagged: the current shape is tried first (distinguished by the
/// `githubChecks` key and the addressing fields inside `github`); anything
/// that fails it is tried against the legacy shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobRecord {
    Current(CurrentDoc),
    Legacy(LegacyDoc),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentDoc {
    document_id: JobId,
    platform: Platform,
    workflow_id: WorkflowId,
    branch: BranchSnapshot,
    github: GitHubAddress,
    github_checks: CheckHandles,
    build_status: StatusFlags,
    created_at: DateTime<Utc>,
    #[serde(default)]
    success_notified: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyDoc {
    document_id: JobId,
    platform: Platform,
    workflow_id: WorkflowId,
    branch: BranchSnapshot,
    github: LegacyGitHub,
    checks: LegacyChecks,
    build_status: StatusFlags,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    success_notified: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyGitHub {
    /// The legacy shape embedded an access token; it is discarded on
    /// normalization (tokens are minted per call, never persisted).
    #[serde(rename = "PAT", default)]
    _pat: Option<String>,
    repository_url: String,
    issue_number: PrNumber,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyChecks {
    check_run_id: CheckRunId,
    owner: String,
    repository_name: String,
    installation_id: u64,
}

impl JobRecord {
    fn normalize(self) -> BuildJob {
        match self {
            JobRecord::Current(doc) => BuildJob {
                id: doc.document_id,
                platform: doc.platform,
                workflow_id: doc.workflow_id,
                branch: doc.branch,
                github: doc.github,
                github_checks: doc.github_checks,
                status: doc.build_status,
                created_at: doc.created_at,
                success_notified: doc.success_notified,
            },
            JobRecord::Legacy(doc) => BuildJob {
                id: doc.document_id,
                platform: doc.platform,
                workflow_id: doc.workflow_id,
                branch: doc.branch,
                github: GitHubAddress {
                    repository_url: doc.github.repository_url,
                    owner: doc.checks.owner,
                    repository_name: doc.checks.repository_name,
                    installation_id: doc.checks.installation_id,
                    app_id: None,
                },
                github_checks: CheckHandles {
                    issue_number: doc.github.issue_number,
                    check_run_id: doc.checks.check_run_id,
                },
                status: doc.build_status,
                created_at: doc.created_at.unwrap_or(DateTime::UNIX_EPOCH),
                success_notified: doc.success_notified,
            },
        }
    }
}

impl<'de> Deserialize<'de> for BuildJob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        JobRecord::deserialize(deserializer).map(JobRecord::normalize)
    }
}
