//! GitHub App authentication and repository-scoped clients.
//!
//! The service authenticates as a GitHub App: an app-level `Octocrab` is
//! built once from the app id and RSA private key, and a per-installation
//! client is derived for each delivery. All API operations go through an
//! [`InstallationClient`], which scopes the installation client to one
//! repository.

use jsonwebtoken::EncodingKey;
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;

use crate::types::RepoId;

use super::error::GitHubApiError;

/// App-level client; hands out per-installation clients.
#[derive(Clone)]
pub struct GitHubApp {
    client: Octocrab,
    app_id: u64,
}

impl GitHubApp {
    /// Builds the app-level client from the app id and its RSA private key
    /// (PEM).
    pub fn new(app_id: u64, private_key_pem: &str) -> Result<Self, GitHubApiError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| {
            GitHubApiError::permanent_without_source(format!("invalid app private key: {e}"))
        })?;
        let client = Octocrab::builder()
            .app(AppId(app_id), key)
            .build()
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(GitHubApp { client, app_id })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Derives a client authenticated as the given installation, scoped to
    /// one repository.
    pub fn installation_client(
        &self,
        installation_id: u64,
        repo: RepoId,
    ) -> Result<InstallationClient, GitHubApiError> {
        let client = self
            .client
            .installation(InstallationId(installation_id))
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(InstallationClient::new(client, repo))
    }
}

impl std::fmt::Debug for GitHubApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApp")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// An installation-authenticated client scoped to a specific repository.
#[derive(Clone)]
pub struct InstallationClient {
    client: Octocrab,
    repo: RepoId,
}

impl InstallationClient {
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

impl std::fmt::Debug for InstallationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
