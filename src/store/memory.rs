//! In-memory store.
//!
//! Backs the server and the tests. Each collection sits behind its own
//! `tokio::sync::RwLock`; the compare-and-set operations (`claim_success`,
//! `increment_build_number`) do their read and write under a single write
//! guard, which is what makes them atomic with respect to concurrent tasks.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};

use crate::types::{
    BuildJob, JobId, Organization, OrganizationId, Platform, StatusFlags, WorkflowConfig,
    WorkflowId,
};

use super::{JobChange, JobStore, OrganizationStore, StoreError, WorkflowStore};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct MemoryStore {
    jobs: RwLock<HashMap<JobId, BuildJob>>,
    workflows: RwLock<HashMap<WorkflowId, WorkflowConfig>>,
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
    changes: broadcast::Sender<JobChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        MemoryStore {
            jobs: RwLock::new(HashMap::new()),
            workflows: RwLock::new(HashMap::new()),
            organizations: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Seeds the workflow and organization collections, typically from
    /// configuration at startup.
    pub async fn seed(&self, workflows: Vec<WorkflowConfig>, organizations: Vec<Organization>) {
        let mut wf = self.workflows.write().await;
        for workflow in workflows {
            wf.insert(workflow.id.clone(), workflow);
        }
        drop(wf);
        let mut orgs = self.organizations.write().await;
        for organization in organizations {
            orgs.insert(organization.id.clone(), organization);
        }
    }

    fn notify(&self, change: JobChange) {
        // No receivers is fine (e.g., before the dispatcher subscribes).
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for MemoryStore {
    async fn create_job(&self, job: BuildJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        drop(jobs);
        self.notify(JobChange { old: None, new: job });
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> Result<BuildJob, StoreError> {
        let jobs = self.jobs.read().await;
        jobs.get(id)
            .cloned()
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))
    }

    async fn update_status(
        &self,
        id: &JobId,
        status: StatusFlags,
    ) -> Result<JobChange, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        let old = job.clone();
        job.status = status;
        let change = JobChange {
            old: Some(old),
            new: job.clone(),
        };
        drop(jobs);
        self.notify(change.clone());
        Ok(change)
    }

    async fn claim_success(&self, id: &JobId) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        if job.success_notified {
            Ok(false)
        } else {
            job.success_notified = true;
            Ok(true)
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<JobChange> {
        self.changes.subscribe()
    }
}

impl WorkflowStore for MemoryStore {
    async fn workflows_for_repository(
        &self,
        repository_url: &str,
    ) -> Result<Vec<WorkflowConfig>, StoreError> {
        let workflows = self.workflows.read().await;
        let mut matching: Vec<WorkflowConfig> = workflows
            .values()
            .filter(|w| w.repository_url == repository_url)
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; keep results deterministic.
        matching.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(matching)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<WorkflowConfig, StoreError> {
        let workflows = self.workflows.read().await;
        workflows
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::WorkflowNotFound(id.clone()))
    }
}

impl OrganizationStore for MemoryStore {
    async fn get_organization(&self, id: &OrganizationId) -> Result<Organization, StoreError> {
        let organizations = self.organizations.read().await;
        organizations
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::OrganizationNotFound(id.clone()))
    }

    async fn increment_build_number(
        &self,
        id: &OrganizationId,
        platform: Platform,
    ) -> Result<u64, StoreError> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .get_mut(id)
            .ok_or_else(|| StoreError::OrganizationNotFound(id.clone()))?;
        let counter = organization.build_number.get_mut(platform);
        let previous = *counter;
        *counter += 1;
        Ok(previous)
    }
}
