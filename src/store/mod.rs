//! Durable storage traits and the change-notification stream.
//!
//! The store is the durability boundary: job records, workflow configurations
//! and organization counters live behind these traits, and every job write
//! emits a [`JobChange`] carrying the before/after pair. The synchronizer
//! consumes those notifications and never re-reads global state to decide
//! what happened.

use std::future::Future;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::types::{
    BuildJob, JobId, Organization, OrganizationId, Platform, StatusFlags, WorkflowConfig,
    WorkflowId,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),
}

/// Before/after pair emitted for every job write.
///
/// `old` is `None` for the creating write. Consumers derive status edges from
/// this pair alone.
#[derive(Debug, Clone)]
pub struct JobChange {
    pub old: Option<BuildJob>,
    pub new: BuildJob,
}

/// Job records: create, point read, status write, success claim.
pub trait JobStore {
    /// Persists a fresh job and emits a change notification with `old: None`.
    fn create_job(&self, job: BuildJob) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_job(&self, id: &JobId) -> impl Future<Output = Result<BuildJob, StoreError>> + Send;

    /// Writes the status flags verbatim and emits a change notification.
    ///
    /// The flags are not validated here; the transition logic downstream
    /// decides what any observed combination means.
    fn update_status(
        &self,
        id: &JobId,
        status: StatusFlags,
    ) -> impl Future<Output = Result<JobChange, StoreError>> + Send;

    /// Atomically sets the job's success-claim marker.
    ///
    /// Returns `Ok(true)` exactly once per job, for the caller that flipped
    /// the marker; every later caller gets `Ok(false)`. The marker write does
    /// not emit a change notification.
    fn claim_success(&self, id: &JobId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Subscribes to the job-change stream.
    fn subscribe(&self) -> broadcast::Receiver<JobChange>;
}

/// Workflow configurations, keyed by id and queryable by repository URL.
pub trait WorkflowStore {
    /// All workflows registered for the repository URL; may be empty.
    fn workflows_for_repository(
        &self,
        repository_url: &str,
    ) -> impl Future<Output = Result<Vec<WorkflowConfig>, StoreError>> + Send;

    fn get_workflow(
        &self,
        id: &WorkflowId,
    ) -> impl Future<Output = Result<WorkflowConfig, StoreError>> + Send;
}

/// Organizations and their per-platform build counters.
pub trait OrganizationStore {
    fn get_organization(
        &self,
        id: &OrganizationId,
    ) -> impl Future<Output = Result<Organization, StoreError>> + Send;

    /// Atomic fetch-and-increment of the platform's build counter.
    ///
    /// Returns the pre-increment value; concurrent callers each observe a
    /// distinct value. A reserved number that is never reported (because a
    /// later step fails) leaves a gap, which is acceptable; collisions are
    /// not.
    fn increment_build_number(
        &self,
        id: &OrganizationId,
        platform: Platform,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
