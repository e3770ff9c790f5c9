//! Shared fixtures: a fake Overleaf instance on a wiremock server.

#![allow(dead_code)]

use overleaf_client::{ClientConfig, OverleafClient};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_SESSION: &str = "anon-sid";
pub const SESSION: &str = "user-sid";
pub const LOGIN_CSRF: &str = "csrf-login";
pub const DISPENSED_CSRF: &str = "csrf-dispensed";

pub fn client_for(server: &MockServer) -> OverleafClient {
    OverleafClient::new(ClientConfig::for_host(server.uri())).unwrap()
}

/// Escapes a string for use inside a double-quoted HTML attribute.
pub fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn meta(name: &str, value: &Value) -> String {
    format!(
        r#"<meta name="{name}" data-type="json" content="{}">"#,
        attr_escape(&value.to_string())
    )
}

pub fn page(metas: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Overleaf</title>{}</head><body></body></html>",
        metas.join("\n")
    )
}

pub fn overview_page(projects: &Value, tags: &Value, notifications: &Value) -> String {
    page(&[
        r#"<meta name="ol-csrfToken" content="csrf-page">"#.to_string(),
        meta("ol-projects", projects),
        meta("ol-tags", tags),
        meta("ol-notifications", notifications),
    ])
}

pub fn session_cookie(value: &str) -> String {
    format!("sharelatex.sid={value}; Path=/; HttpOnly")
}

pub fn authed() -> wiremock::matchers::HeaderExactMatcher {
    header("cookie", format!("sharelatex.sid={SESSION}").as_str())
}

/// Mounts the two-step login handshake.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", session_cookie(ANON_SESSION).as_str())
                .set_body_string(page(&[format!(
                    r#"<meta name="ol-csrfToken" content="{LOGIN_CSRF}">"#
                )])),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("cookie", format!("sharelatex.sid={ANON_SESSION}").as_str()))
        .and(header("x-csrf-token", LOGIN_CSRF))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", session_cookie(SESSION).as_str())
                .set_body_json(serde_json::json!({ "redir": "/project" })),
        )
        .mount(server)
        .await;
}

/// Mounts the CSRF dispenser for the logged-in session.
pub async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/dev/csrf"))
        .and(authed())
        .respond_with(ResponseTemplate::new(200).set_body_string(DISPENSED_CSRF))
        .mount(server)
        .await;
}

pub async fn mount_logout(server: &MockServer) {
    mount_csrf(server).await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(authed())
        .and(header("x-csrf-token", DISPENSED_CSRF))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(server)
        .await;
}

pub async fn mount_overview(server: &MockServer, html: String) {
    Mock::given(method("GET"))
        .and(path("/project"))
        .and(authed())
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

pub async fn logged_in(server: &MockServer) -> OverleafClient {
    mount_login(server).await;
    let mut client = client_for(server);
    client.login("user@example.com", "secret").await.unwrap();
    client
}
