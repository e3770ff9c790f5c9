//! Cookie session handling for Overleaf.
//!
//! Overleaf has no token API: a session is a cookie obtained by posting the
//! login form, and every mutation needs an anti-CSRF token. [`HttpSession`]
//! owns the session as an explicit [`SessionState`] and checks it at every
//! entry point. The token is replaced whenever a response rotates it.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::extract::Page;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, ORIGIN};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const CSRF_HEADER: &str = "x-csrf-token";

/// An established session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveSession {
    token: String,
    csrf: Option<String>,
}

impl ActiveSession {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// CSRF token seen since the session token last changed, if any.
    pub fn cached_csrf(&self) -> Option<&str> {
        self.csrf.as_deref()
    }
}

/// Whether the client is logged in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(ActiveSession),
}

/// HTTP plumbing plus the session state for one Overleaf instance.
pub struct HttpSession {
    http: Client,
    config: ClientConfig,
    state: SessionState,
}

impl HttpSession {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.host.trim().is_empty() {
            return Err(ClientError::Config("host must not be empty".to_string()));
        }

        // Redirects are not followed: a redirect to /login is how Overleaf
        // reports a stale session, and Set-Cookie must be seen on every hop.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            config,
            state: SessionState::Unauthenticated,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Returns the active session or [`ClientError::SessionRequired`].
    pub fn require_active(&self) -> ClientResult<&ActiveSession> {
        match &self.state {
            SessionState::Authenticated(session) => Ok(session),
            SessionState::Unauthenticated => Err(ClientError::SessionRequired),
        }
    }

    // ── Auth ──

    /// Logs in with the two-step form handshake.
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<()> {
        self.state = SessionState::Unauthenticated;

        // Step 1: the login page hands out an anonymous session and a CSRF token.
        let login_url = self.config.url("/login");
        let initial = self.http.get(&login_url).timeout(self.timeout()).send().await?;
        let mut token = self.session_cookie(&initial).ok_or_else(|| {
            ClientError::AuthFailed("login page did not issue a session cookie".to_string())
        })?;
        let initial = ensure_success(initial)?;
        let page = Page::parse(&initial.text().await?);

        let csrf = match page.csrf_token() {
            Ok(csrf) => csrf,
            Err(e) => {
                debug!("login page has no CSRF token ({e}), asking the dispenser");
                let (csrf, rotated) = self.dispense_csrf(&token).await?;
                if let Some(rotated) = rotated {
                    token = rotated;
                }
                csrf
            }
        };

        // Step 2: post the credentials with the anonymous session.
        let resp = self
            .http
            .post(&login_url)
            .timeout(self.timeout())
            .headers(self.headers_for(&token)?)
            .header(CSRF_HEADER, csrf.as_str())
            .json(&json!({ "email": email, "password": password, "_csrf": csrf }))
            .send()
            .await?;

        // A token issued to the anonymous session is not reused once the
        // login response hands out a new session.
        let mut cached_csrf = Some(csrf);
        if let Some(rotated) = self.session_cookie(&resp) {
            if rotated != token {
                cached_csrf = None;
            }
            token = rotated;
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::AuthFailed(format!(
                "login rejected with status {status}"
            )));
        }
        if token.is_empty() {
            return Err(ClientError::AuthFailed("no session after login".to_string()));
        }

        self.state = SessionState::Authenticated(ActiveSession {
            token,
            csrf: cached_csrf,
        });
        Ok(())
    }

    /// Logs out and clears the local session.
    ///
    /// The session is cleared even when the logout request fails, since the
    /// server may already have invalidated it. That failure is still returned.
    pub async fn logout(&mut self) -> ClientResult<()> {
        self.require_active()?;

        let result = self.post_logout().await;
        self.state = SessionState::Unauthenticated;

        if let Err(e) = &result {
            warn!("logout request failed, local session cleared anyway: {e}");
        }
        result
    }

    async fn post_logout(&mut self) -> ClientResult<()> {
        let csrf = self.csrf_token().await?;
        self.post_mutation("/logout", &csrf, &json!({ "_csrf": csrf }))
            .await?;
        Ok(())
    }

    /// Session cookie and origin headers for authenticated requests.
    pub fn auth_headers(&self) -> ClientResult<HeaderMap> {
        let session = self.require_active()?;
        self.headers_for(&session.token)
    }

    /// Fetches a fresh CSRF token from the token dispenser.
    pub async fn csrf_token(&mut self) -> ClientResult<String> {
        let token = self.require_active()?.token.clone();
        let (csrf, rotated) = self.dispense_csrf(&token).await?;
        if let SessionState::Authenticated(session) = &mut self.state {
            if let Some(rotated) = rotated {
                session.token = rotated;
            }
            session.csrf = Some(csrf.clone());
        }
        Ok(csrf)
    }

    /// CSRF token for a mutation: the one cached from the last page fetch of
    /// this session, or a fresh one from the dispenser.
    pub async fn mutation_csrf(&mut self) -> ClientResult<String> {
        if let Some(csrf) = self.require_active()?.cached_csrf() {
            return Ok(csrf.to_string());
        }
        self.csrf_token().await
    }

    /// Asks `/dev/csrf` for a token using `token` as session. Returns the
    /// CSRF token and the session token if the response rotated it.
    async fn dispense_csrf(&self, token: &str) -> ClientResult<(String, Option<String>)> {
        let resp = self
            .http
            .get(self.config.url("/dev/csrf"))
            .timeout(self.timeout())
            .headers(self.headers_for(token)?)
            .send()
            .await?;
        let rotated = self.session_cookie(&resp);
        let csrf = ensure_success(resp)?.text().await?.trim().to_string();
        Ok((csrf, rotated))
    }

    // ── Requests ──

    /// Fetches an HTML page with the session and remembers its CSRF token.
    pub async fn get_page(&mut self, path: &str) -> ClientResult<Page> {
        let resp = self.auth_get(path).await?;
        let page = Page::parse(&resp.text().await?);

        if let (Ok(csrf), SessionState::Authenticated(session)) =
            (page.csrf_token(), &mut self.state)
        {
            session.csrf = Some(csrf);
        }
        Ok(page)
    }

    /// Authenticated GET; any non-2xx status is an error.
    pub async fn auth_get(&mut self, path: &str) -> ClientResult<Response> {
        let resp = self
            .http
            .get(self.config.url(path))
            .timeout(self.timeout())
            .headers(self.auth_headers()?)
            .send()
            .await?;
        self.rotate(&resp);
        ensure_success(resp)
    }

    /// Authenticated GET without a total timeout, for large bodies.
    /// The status is left for the caller to judge.
    pub async fn auth_get_stream(&mut self, path: &str) -> ClientResult<Response> {
        let resp = self
            .http
            .get(self.config.url(path))
            .headers(self.auth_headers()?)
            .send()
            .await?;
        self.rotate(&resp);
        Ok(resp)
    }

    /// Authenticated POST carrying a CSRF token. Success and redirect
    /// statuses are accepted, since Overleaf redirects after most actions.
    pub async fn post_mutation(
        &mut self,
        path: &str,
        csrf: &str,
        body: &serde_json::Value,
    ) -> ClientResult<Response> {
        let url = self.config.url(path);
        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout())
            .headers(self.auth_headers()?)
            .header(CSRF_HEADER, csrf)
            .json(body)
            .send()
            .await?;
        self.rotate(&resp);

        let status = resp.status();
        if status.is_success() || status.is_redirection() {
            Ok(resp)
        } else {
            Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            })
        }
    }

    // ── Internals ──

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    fn headers_for(&self, token: &str) -> ClientResult<HeaderMap> {
        let cookie = format!("{}={}", self.config.session_cookie_name, token);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie)
                .map_err(|_| ClientError::Config("session token is not a valid header".into()))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(self.config.base_url())
                .map_err(|_| ClientError::Config("host is not a valid origin".into()))?,
        );
        Ok(headers)
    }

    fn session_cookie(&self, resp: &Response) -> Option<String> {
        resp.cookies()
            .find(|c| c.name() == self.config.session_cookie_name && !c.value().is_empty())
            .map(|c| c.value().to_string())
    }

    /// Adopts a rotated session token from `resp`, if it carries one.
    fn rotate(&mut self, resp: &Response) {
        let Some(token) = self.session_cookie(resp) else {
            return;
        };
        if let SessionState::Authenticated(session) = &mut self.state {
            if session.token != token {
                debug!("session token rotated by {}", resp.url().path());
                session.token = token;
                session.csrf = None;
            }
        }
    }
}

fn ensure_success(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    Err(ClientError::UnexpectedStatus {
        status: status.as_u16(),
        url: resp.url().to_string(),
    })
}

/// True when a response is Overleaf bouncing an unauthenticated request.
pub fn is_login_redirect(resp: &Response) -> bool {
    if !resp.status().is_redirection() && resp.status() != StatusCode::UNAUTHORIZED {
        return false;
    }
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|l| l.to_str().ok())
        .is_none_or(|l| l.contains("/login"))
}
