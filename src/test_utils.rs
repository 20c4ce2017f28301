//! Shared test fixtures: a recording fake gateway and sample domain values.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::github::{
    CheckRunGateway, CheckRunUpdate, GatewayFactory, GitHubApiError, IssueComment,
};
use crate::types::{
    BranchSnapshot, BuildJob, CheckHandles, CheckRunId, CommentId, GitHubAddress, Organization,
    OrganizationId, Platform, PrNumber, Sha, WorkflowConfig, WorkflowId,
};
use crate::webhooks::{PrAction, PullRequestEvent};

pub const REPO_URL: &str = "https://github.com/acme/app";

/// One recorded gateway invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateCheckRun { name: String, head_sha: Sha },
    UpdateCheckRun { id: CheckRunId, update: CheckRunUpdate },
    ListComments { pr: PrNumber },
    CreateComment { pr: PrNumber, body: String },
    UpdateComment { id: CommentId, body: String },
}

#[derive(Default)]
struct FakeGatewayState {
    calls: Vec<GatewayCall>,
    comments: Vec<IssueComment>,
    next_check_run_id: u64,
    next_comment_id: u64,
    failing_check_runs: HashSet<String>,
}

/// In-memory [`CheckRunGateway`] that records every call and simulates the
/// comment collection. Clones share state, and the fake is its own factory,
/// so every job in a test routes to the same recorder.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn comments(&self) -> Vec<IssueComment> {
        self.state.lock().unwrap().comments.clone()
    }

    /// Makes `create_check_run` fail for the given workflow name.
    pub fn fail_check_run_for(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_check_runs
            .insert(name.to_string());
    }

    pub fn seed_comment(&self, body: &str) -> CommentId {
        let mut state = self.state.lock().unwrap();
        state.next_comment_id += 1;
        let id = CommentId(state.next_comment_id);
        state.comments.push(IssueComment {
            id,
            body: body.to_string(),
        });
        id
    }
}

impl CheckRunGateway for FakeGateway {
    async fn create_check_run(
        &self,
        name: &str,
        head_sha: &Sha,
    ) -> Result<CheckRunId, GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::CreateCheckRun {
            name: name.to_string(),
            head_sha: head_sha.clone(),
        });
        if state.failing_check_runs.contains(name) {
            return Err(GitHubApiError::permanent_without_source(format!(
                "simulated check-run failure for {name}"
            )));
        }
        state.next_check_run_id += 1;
        Ok(CheckRunId(state.next_check_run_id))
    }

    async fn update_check_run(
        &self,
        id: CheckRunId,
        update: CheckRunUpdate,
    ) -> Result<(), GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::UpdateCheckRun { id, update });
        Ok(())
    }

    async fn list_comments(&self, pr: PrNumber) -> Result<Vec<IssueComment>, GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::ListComments { pr });
        Ok(state.comments.clone())
    }

    async fn create_comment(&self, pr: PrNumber, body: &str) -> Result<CommentId, GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::CreateComment {
            pr,
            body: body.to_string(),
        });
        state.next_comment_id += 1;
        let id = CommentId(state.next_comment_id);
        state.comments.push(IssueComment {
            id,
            body: body.to_string(),
        });
        Ok(id)
    }

    async fn update_comment(&self, id: CommentId, body: &str) -> Result<(), GitHubApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::UpdateComment {
            id,
            body: body.to_string(),
        });
        if let Some(comment) = state.comments.iter_mut().find(|c| c.id == id) {
            comment.body = body.to_string();
            Ok(())
        } else {
            Err(GitHubApiError::permanent_without_source(format!(
                "no such comment: {id}"
            )))
        }
    }
}

impl GatewayFactory for FakeGateway {
    type Gateway = FakeGateway;

    fn gateway_for(&self, _address: &GitHubAddress) -> Result<FakeGateway, GitHubApiError> {
        Ok(self.clone())
    }
}

pub fn sample_workflow(id: &str, platform: Platform) -> WorkflowConfig {
    WorkflowConfig {
        id: WorkflowId::new(id),
        organization_id: OrganizationId::new("org-1"),
        repository_url: REPO_URL.to_string(),
        base_branch: "main".to_string(),
        branch_pattern: None,
        platform,
        workflow_name: format!("{platform} build ({id})"),
    }
}

pub fn sample_organization() -> Organization {
    Organization {
        id: OrganizationId::new("org-1"),
        build_number: Default::default(),
    }
}

pub fn sample_address() -> GitHubAddress {
    GitHubAddress {
        repository_url: REPO_URL.to_string(),
        owner: "acme".to_string(),
        repository_name: "app".to_string(),
        installation_id: 777,
        app_id: Some(42),
    }
}

pub fn sample_pr_event() -> PullRequestEvent {
    PullRequestEvent {
        repo: crate::types::RepoId::new("acme", "app"),
        repository_url: REPO_URL.to_string(),
        action: PrAction::Opened,
        pr_number: PrNumber(12),
        head_sha: Sha::new("a".repeat(40)),
        base_branch: "main".to_string(),
        head_branch: "feature/x".to_string(),
        installation_id: Some(777),
    }
}

pub fn sample_job(workflow: &WorkflowConfig) -> BuildJob {
    BuildJob::new(
        workflow.platform,
        workflow.id.clone(),
        BranchSnapshot {
            base_branch: "main".to_string(),
            build_branch: "feature/x".to_string(),
        },
        sample_address(),
        CheckHandles {
            issue_number: PrNumber(12),
            check_run_id: CheckRunId(9001),
        },
    )
}
