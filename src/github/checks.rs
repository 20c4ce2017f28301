//! Check-run and issue-comment operations.
//!
//! [`CheckRunGateway`] is the seam between the synchronizer and the GitHub
//! REST API; tests substitute a recording fake. The real implementation runs
//! on an [`InstallationClient`]. Check-run endpoints have no octocrab builder
//! coverage, so those calls go through the raw `post`/`patch` route helpers;
//! comments use the issues builder.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{CheckRunId, CommentId, GitHubAddress, PrNumber, Sha};

use super::client::{GitHubApp, InstallationClient};
use super::error::GitHubApiError;

/// A check-run status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRunUpdate {
    InProgress,
    Completed { conclusion: CheckConclusion },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckConclusion {
    Success,
    Failure,
}

impl CheckConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
        }
    }
}

/// An issue comment, reduced to what the upsert needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    pub id: CommentId,
    pub body: String,
}

/// Repository-scoped GitHub operations used by the synchronizer.
pub trait CheckRunGateway {
    /// Creates a check run in the `queued` state; returns its id.
    fn create_check_run(
        &self,
        name: &str,
        head_sha: &Sha,
    ) -> impl Future<Output = Result<CheckRunId, GitHubApiError>> + Send;

    fn update_check_run(
        &self,
        id: CheckRunId,
        update: CheckRunUpdate,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    /// All comments on the PR, across every page.
    fn list_comments(
        &self,
        pr: PrNumber,
    ) -> impl Future<Output = Result<Vec<IssueComment>, GitHubApiError>> + Send;

    fn create_comment(
        &self,
        pr: PrNumber,
        body: &str,
    ) -> impl Future<Output = Result<CommentId, GitHubApiError>> + Send;

    fn update_comment(
        &self,
        id: CommentId,
        body: &str,
    ) -> impl Future<Output = Result<(), GitHubApiError>> + Send;
}

/// Hands out a [`CheckRunGateway`] for a given installation and repository.
///
/// The server implements the status path generically over this, so scenario
/// tests can route every job to a shared in-memory fake.
pub trait GatewayFactory {
    type Gateway: CheckRunGateway + Send + Sync;

    fn gateway_for(&self, address: &GitHubAddress) -> Result<Self::Gateway, GitHubApiError>;
}

impl GatewayFactory for GitHubApp {
    type Gateway = InstallationClient;

    fn gateway_for(&self, address: &GitHubAddress) -> Result<InstallationClient, GitHubApiError> {
        self.installation_client(address.installation_id, address.repo())
    }
}

#[derive(Serialize)]
struct CreateCheckRunRequest<'a> {
    name: &'a str,
    head_sha: &'a str,
    status: &'a str,
}

#[derive(Deserialize)]
struct CheckRunResponse {
    id: u64,
}

#[derive(Serialize)]
struct UpdateCheckRunRequest<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conclusion: Option<&'a str>,
}

impl CheckRunGateway for InstallationClient {
    async fn create_check_run(
        &self,
        name: &str,
        head_sha: &Sha,
    ) -> Result<CheckRunId, GitHubApiError> {
        let url = format!("/repos/{}/{}/check-runs", self.owner(), self.repo_name());
        let request = CreateCheckRunRequest {
            name,
            head_sha: head_sha.as_str(),
            status: "queued",
        };

        let response: CheckRunResponse = self
            .inner()
            .post(&url, Some(&request))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(CheckRunId(response.id))
    }

    async fn update_check_run(
        &self,
        id: CheckRunId,
        update: CheckRunUpdate,
    ) -> Result<(), GitHubApiError> {
        let url = format!(
            "/repos/{}/{}/check-runs/{}",
            self.owner(),
            self.repo_name(),
            id.0
        );
        let request = match update {
            CheckRunUpdate::InProgress => UpdateCheckRunRequest {
                status: "in_progress",
                conclusion: None,
            },
            CheckRunUpdate::Completed { conclusion } => UpdateCheckRunRequest {
                status: "completed",
                conclusion: Some(conclusion.as_str()),
            },
        };

        let _: serde_json::Value = self
            .inner()
            .patch(&url, Some(&request))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }

    async fn list_comments(&self, pr: PrNumber) -> Result<Vec<IssueComment>, GitHubApiError> {
        let mut page = 1u32;
        let mut all_comments = Vec::new();

        loop {
            let page_result = self
                .inner()
                .issues(self.owner(), self.repo_name())
                .list_comments(pr.0)
                .per_page(100)
                .page(page)
                .send()
                .await
                .map_err(GitHubApiError::from_octocrab)?;

            let items = page_result.items;
            let is_last_page = items.len() < 100;

            for comment in items {
                all_comments.push(IssueComment {
                    id: CommentId(comment.id.into_inner()),
                    body: comment.body.unwrap_or_default(),
                });
            }

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(all_comments)
    }

    async fn create_comment(&self, pr: PrNumber, body: &str) -> Result<CommentId, GitHubApiError> {
        let comment = self
            .inner()
            .issues(self.owner(), self.repo_name())
            .create_comment(pr.0, body)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(CommentId(comment.id.into_inner()))
    }

    async fn update_comment(&self, id: CommentId, body: &str) -> Result<(), GitHubApiError> {
        let url = format!(
            "/repos/{}/{}/issues/comments/{}",
            self.owner(),
            self.repo_name(),
            id.0
        );

        #[derive(Serialize)]
        struct UpdateRequest<'a> {
            body: &'a str,
        }

        let _: serde_json::Value = self
            .inner()
            .patch(&url, Some(&UpdateRequest { body }))
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(())
    }
}
