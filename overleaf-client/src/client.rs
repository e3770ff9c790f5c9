//! Domain operations against an Overleaf Community Edition instance.
//!
//! Every operation except [`OverleafClient::login`] needs an active session
//! and fails with [`ClientError::SessionRequired`] without one.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::{HttpSession, SessionState, is_login_redirect};
use crate::types::{Invite, Project, join_projects};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Path of the project dashboard, which embeds projects, tags and notifications.
const OVERVIEW_PATH: &str = "/project";

/// Client for one Overleaf instance and one user session.
pub struct OverleafClient {
    session: HttpSession,
}

impl OverleafClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            session: HttpSession::new(config)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Direct access to the session, for callers that need raw requests.
    pub fn session_mut(&mut self) -> &mut HttpSession {
        &mut self.session
    }

    // ── Auth ──

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<()> {
        self.session.login(email, password).await?;
        info!("logged in to {} as {email}", self.config().base_url());
        Ok(())
    }

    /// See [`HttpSession::logout`]: the local session is always cleared.
    pub async fn logout(&mut self) -> ClientResult<()> {
        self.session.logout().await?;
        debug!("logged out of {}", self.config().base_url());
        Ok(())
    }

    // ── Invites ──

    /// Lists pending project invites for the logged-in user.
    pub async fn get_invites(&mut self) -> ClientResult<Vec<Invite>> {
        self.session.require_active()?;
        let page = self.session.get_page(OVERVIEW_PATH).await?;
        let invites = page.invites()?;
        debug!("found {} pending invites", invites.len());
        Ok(invites)
    }

    /// Accepts an invite. Consumes it on the server side.
    pub async fn accept_invite(&mut self, invite: &Invite) -> ClientResult<()> {
        self.session.require_active()?;
        let csrf = self.session.mutation_csrf().await?;
        let path = format!(
            "/project/{}/invite/token/{}/accept",
            invite.project_id, invite.token
        );
        self.session.post_mutation(&path, &csrf, &json!({})).await?;
        Ok(())
    }

    // ── Projects ──

    /// Lists all projects visible to the user, with their tags.
    ///
    /// Projects and tags come from the same page fetch.
    pub async fn get_projects(&mut self) -> ClientResult<Vec<Project>> {
        self.session.require_active()?;
        let page = self.session.get_page(OVERVIEW_PATH).await?;
        let raw_projects = page.projects()?;
        let tags = page.tags()?;
        Ok(join_projects(raw_projects, &tags))
    }

    /// Starts downloading a project's source as a zip archive.
    ///
    /// The body is not read here; consume it with [`ProjectDownload`].
    pub async fn download_project(&mut self, project: &Project) -> ClientResult<ProjectDownload> {
        self.session.require_active()?;
        let path = format!("/project/{}/download/zip", project.id);
        let resp = self.session.auth_get_stream(&path).await?;

        if is_login_redirect(&resp) {
            return Err(ClientError::Download(format!(
                "session rejected while downloading {} (redirected to login)",
                project.id
            )));
        }
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Download(format!(
                "server answered {status} for project {}",
                project.id
            )));
        }
        let is_html = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if is_html {
            return Err(ClientError::Download(format!(
                "expected a zip archive for project {}, got an HTML page",
                project.id
            )));
        }

        Ok(ProjectDownload {
            content_length: resp.content_length(),
            stream: Box::pin(resp.bytes_stream()),
        })
    }
}

/// A project archive being streamed from the server.
pub struct ProjectDownload {
    content_length: Option<u64>,
    stream: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
}

impl ProjectDownload {
    /// Size announced by the server, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Next chunk of the archive, or `None` at the end.
    pub async fn next_chunk(&mut self) -> ClientResult<Option<Bytes>> {
        match self.stream.next().await {
            Some(chunk) => Ok(Some(chunk.map_err(|e| ClientError::Download(e.to_string()))?)),
            None => Ok(None),
        }
    }

    /// Streams the whole archive into `writer`, returning the byte count.
    pub async fn write_to<W: AsyncWrite + Unpin>(mut self, writer: &mut W) -> ClientResult<u64> {
        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        if let Some(expected) = self.content_length {
            if expected != written {
                return Err(ClientError::Download(format!(
                    "archive truncated: expected {expected} bytes, got {written}"
                )));
            }
        }
        Ok(written)
    }
}
