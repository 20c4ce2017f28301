//! Core domain types.

pub mod ids;
pub mod job;
pub mod workflow;

pub use ids::{
    CheckRunId, CommentId, DeliveryId, JobId, OrganizationId, Platform, PrNumber, RepoId, Sha,
    WorkflowId,
};
pub use job::{BranchSnapshot, BuildJob, BuildState, CheckHandles, GitHubAddress, StatusFlags};
pub use workflow::{BuildCounters, Organization, WorkflowConfig};
