//! Workflow configurations and organization records.

use serde::{Deserialize, Serialize};

use super::ids::{OrganizationId, Platform, WorkflowId};

/// One configured build pipeline for a repository.
///
/// Immutable to the core; loaded at startup and only read thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    #[serde(rename = "documentId")]
    pub id: WorkflowId,
    pub organization_id: OrganizationId,
    /// Matched exactly against the webhook payload's repository URL.
    pub repository_url: String,
    pub base_branch: String,
    /// When set, the head branch must contain this as a literal substring.
    #[serde(default)]
    pub branch_pattern: Option<String>,
    pub platform: Platform,
    /// Human-readable name; used as the check-run name and the comment prefix.
    pub workflow_name: String,
}

/// Per-platform monotonically increasing build numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCounters {
    pub ios: u64,
    pub android: u64,
}

impl BuildCounters {
    pub fn get(&self, platform: Platform) -> u64 {
        match platform {
            Platform::Ios => self.ios,
            Platform::Android => self.android,
        }
    }

    pub fn get_mut(&mut self, platform: Platform) -> &mut u64 {
        match platform {
            Platform::Ios => &mut self.ios,
            Platform::Android => &mut self.android,
        }
    }
}

/// An organization owning workflows and their build counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "documentId")]
    pub id: OrganizationId,
    #[serde(default)]
    pub build_number: BuildCounters,
}
