//! Sync run configuration.

use chrono::{DateTime, Utc};
use overleaf_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inputs for one sync run.
#[derive(Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Instance connection settings, including the host.
    pub client: ClientConfig,

    pub email: String,

    /// Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,

    /// Root directory; each project lands in its own subdirectory.
    pub downloads_path: PathBuf,

    /// Accept all pending project invites before listing projects.
    #[serde(default)]
    pub accept_invites: bool,

    /// Project ids or names to include. `None` includes everything.
    #[serde(default)]
    pub projects: Option<Vec<String>>,

    /// Tag names to include. `None` includes everything.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Only mirror projects changed at or after this instant.
    #[serde(default)]
    pub changed_after: Option<DateTime<Utc>>,
}

impl SyncConfig {
    pub fn new(
        host: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        downloads_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client: ClientConfig::for_host(host),
            email: email.into(),
            password: password.into(),
            downloads_path: downloads_path.into(),
            accept_invites: false,
            projects: None,
            tags: None,
            changed_after: None,
        }
    }

    pub fn host(&self) -> &str {
        self.client.base_url()
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("client", &self.client)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("downloads_path", &self.downloads_path)
            .field("accept_invites", &self.accept_invites)
            .field("projects", &self.projects)
            .field("tags", &self.tags)
            .field("changed_after", &self.changed_after)
            .finish()
    }
}
