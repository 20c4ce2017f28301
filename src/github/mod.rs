//! GitHub integration: app authentication, repo-scoped clients, check-run and
//! comment operations, categorized errors.

pub mod checks;
pub mod client;
pub mod error;

pub use checks::{
    CheckConclusion, CheckRunGateway, CheckRunUpdate, GatewayFactory, IssueComment,
};
pub use client::{GitHubApp, InstallationClient};
pub use error::{GitHubApiError, GitHubErrorKind};
