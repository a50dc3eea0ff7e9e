//! Installation storage.
//!
//! The receiver never touches credentials itself; listeners look up the
//! workspace's bot token through an [`InstallationStore`]. Records are keyed
//! by enterprise for org-wide installs and by `enterprise-team` otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallationError {
    /// Neither an enterprise nor a team id was available to build a key.
    #[error("installation has no enterprise or team id")]
    MissingIdentity,
}

/// One app installation, as returned by the OAuth flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub enterprise_id: Option<String>,
    #[serde(default)]
    pub is_enterprise_install: bool,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub bot_user_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_token: Option<String>,
}

/// Identity of the workspace an incoming event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationQuery {
    pub team_id: Option<String>,
    pub enterprise_id: Option<String>,
    #[serde(default)]
    pub is_enterprise_install: bool,
}

impl From<&Installation> for InstallationQuery {
    fn from(installation: &Installation) -> Self {
        Self {
            team_id: installation.team_id.clone(),
            enterprise_id: installation.enterprise_id.clone(),
            is_enterprise_install: installation.is_enterprise_install,
        }
    }
}

/// Compose the storage key for an installation or lookup.
///
/// - Org-wide install: `E123`
/// - Workspace in an org: `E123-T456`
/// - Standalone workspace: `none-T456`
pub fn installation_key(query: &InstallationQuery) -> Result<String, InstallationError> {
    let enterprise = query.enterprise_id.as_deref().filter(|s| !s.is_empty());
    let team = query.team_id.as_deref().filter(|s| !s.is_empty());

    match (query.is_enterprise_install, enterprise, team) {
        (true, Some(enterprise), _) => Ok(enterprise.to_string()),
        (_, enterprise, Some(team)) => Ok(format!("{}-{}", enterprise.unwrap_or("none"), team)),
        (false, Some(enterprise), None) => Ok(enterprise.to_string()),
        _ => Err(InstallationError::MissingIdentity),
    }
}

/// Long-term credential storage.
#[async_trait]
pub trait InstallationStore: Send + Sync {
    async fn store(&self, installation: Installation) -> Result<(), InstallationError>;

    /// `Ok(None)` means nothing is stored for this workspace yet.
    async fn fetch(
        &self,
        query: &InstallationQuery,
    ) -> Result<Option<Installation>, InstallationError>;
}

/// In-process store for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemoryInstallationStore {
    inner: Arc<RwLock<HashMap<String, Installation>>>,
}

impl MemoryInstallationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstallationStore for MemoryInstallationStore {
    async fn store(&self, installation: Installation) -> Result<(), InstallationError> {
        let key = installation_key(&InstallationQuery::from(&installation))?;
        info!(key = %key, "installation_stored");
        self.inner.write().await.insert(key, installation);
        Ok(())
    }

    async fn fetch(
        &self,
        query: &InstallationQuery,
    ) -> Result<Option<Installation>, InstallationError> {
        let key = installation_key(query)?;
        let installation = self.inner.read().await.get(&key).cloned();
        debug!(key = %key, found = installation.is_some(), "installation_fetch");
        Ok(installation)
    }
}
