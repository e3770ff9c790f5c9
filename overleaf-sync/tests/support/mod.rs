//! Shared fixtures: a fake Overleaf instance and zip archive builders.

#![allow(dead_code)]

use overleaf_sync::SyncConfig;
use serde_json::Value;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const SESSION: &str = "user-sid";
pub const CSRF: &str = "csrf-dispensed";

/// Builds a zip archive in memory. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

pub fn config_for(server: &MockServer, downloads: &Path) -> SyncConfig {
    SyncConfig::new(server.uri(), "user@example.com", "secret", downloads)
}

pub fn project_json(id: &str, name: &str) -> Value {
    serde_json::json!({ "id": id, "name": name, "archived": false, "trashed": false })
}

fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn meta(name: &str, value: &Value) -> String {
    format!(r#"<meta name="{name}" content="{}">"#, attr_escape(&value.to_string()))
}

pub fn overview_page(projects: &Value, tags: &Value, notifications: &Value) -> String {
    format!(
        "<!DOCTYPE html><html><head>{}\n{}\n{}</head><body></body></html>",
        meta("ol-projects", projects),
        meta("ol-tags", tags),
        meta("ol-notifications", notifications),
    )
}

fn session_cookie(value: &str) -> String {
    format!("sharelatex.sid={value}; Path=/; HttpOnly")
}

fn authed() -> wiremock::matchers::HeaderExactMatcher {
    header("cookie", format!("sharelatex.sid={SESSION}").as_str())
}

/// Mounts login, the CSRF dispenser and a logout that must be called.
pub async fn mount_session(server: &MockServer) {
    mount_session_with_logout(server, 302).await;
}

pub async fn mount_session_with_logout(server: &MockServer, logout_status: u16) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", session_cookie("anon-sid").as_str())
                .set_body_string(
                    r#"<html><head><meta name="ol-csrfToken" content="csrf-login"></head></html>"#,
                ),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", session_cookie(SESSION).as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dev/csrf"))
        .and(authed())
        .respond_with(ResponseTemplate::new(200).set_body_string(CSRF))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(authed())
        .respond_with(ResponseTemplate::new(logout_status).insert_header("location", "/login"))
        .expect(1..)
        .named("logout")
        .mount(server)
        .await;
}

pub async fn mount_overview(server: &MockServer, projects: Value, tags: Value, notifications: Value) {
    Mock::given(method("GET"))
        .and(path("/project"))
        .and(authed())
        .respond_with(
            ResponseTemplate::new(200).set_body_string(overview_page(&projects, &tags, &notifications)),
        )
        .mount(server)
        .await;
}

pub async fn mount_download(server: &MockServer, project_id: &str, archive: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/project/{project_id}/download/zip")))
        .and(authed())
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(archive),
        )
        .mount(server)
        .await;
}

/// Relative paths and contents of every file below `root`, sorted.
pub fn tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path: PathBuf = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out.sort();
    out
}

/// Names of the entries directly below `root`, sorted.
pub fn entries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
