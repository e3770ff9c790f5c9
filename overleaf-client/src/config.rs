//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for talking to one Overleaf instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the instance (e.g., "https://overleaf.example.org").
    pub host: String,

    /// Name of the session cookie issued by the instance.
    pub session_cookie_name: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            session_cookie_name: "sharelatex.sid".to_string(),
            request_timeout_secs: 60,
            user_agent: concat!("overleaf-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a config for the given host with default settings.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Host with any trailing slash removed, used as URL prefix and `Origin`.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }

    /// Builds a full URL from an absolute path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}
