//! Extraction of JSON payloads embedded in `<meta>` tags.
//!
//! Overleaf renders its client-side state into attributes like
//! `<meta name="ol-projects" data-type="json" content="[...]">`. A [`Page`]
//! scans a document once and hands out typed, validated payloads. Failures
//! carry an [`ExtractionFailure`] kind so callers can tell a missing tag from
//! malformed JSON or a shape change.

use crate::error::{ExtractionError, ExtractionFailure};
use crate::types::{Invite, RawProject, RawTag, parse_timestamp};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

pub const PROJECTS_KEY: &str = "ol-projects";
pub const TAGS_KEY: &str = "ol-tags";
pub const NOTIFICATIONS_KEY: &str = "ol-notifications";
pub const CSRF_KEY: &str = "ol-csrfToken";

/// `templateKey` of notifications that represent project invites.
pub const INVITE_TEMPLATE: &str = "notification_project_invite";

static META_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b((?:\s+[^\s=>/]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*/?>"#)
        .expect("meta tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

/// A scanned HTML document: meta tag name → decoded `content`.
#[derive(Debug, Default)]
pub struct Page {
    meta: HashMap<String, String>,
}

impl Page {
    /// Scans `html` for named meta tags. The first tag with a given name wins.
    pub fn parse(html: &str) -> Self {
        let mut meta = HashMap::new();

        for tag in META_TAG.captures_iter(html) {
            let attrs = tag.get(1).map_or("", |m| m.as_str());
            let mut name = None;
            let mut content = None;

            for attr in ATTRIBUTE.captures_iter(attrs) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map(|m| m.as_str());
                match attr[1].to_ascii_lowercase().as_str() {
                    "name" => name = value,
                    "content" => content = value,
                    _ => {}
                }
            }

            if let (Some(name), Some(content)) = (name, content) {
                meta.entry(decode_entities(name))
                    .or_insert_with(|| decode_entities(content));
            }
        }

        Self { meta }
    }

    /// Raw decoded content of a meta tag. Empty content counts as missing.
    pub fn content(&self, key: &str) -> Result<&str, ExtractionError> {
        match self.meta.get(key) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ExtractionError::new(key, ExtractionFailure::MissingAttribute)),
        }
    }

    /// Content of a meta tag parsed as JSON.
    pub fn json(&self, key: &str) -> Result<Value, ExtractionError> {
        let raw = self.content(key)?;
        serde_json::from_str(raw).map_err(|e| {
            ExtractionError::with_detail(key, ExtractionFailure::InvalidJson, e.to_string())
        })
    }

    /// Anti-CSRF token embedded in most pages.
    pub fn csrf_token(&self) -> Result<String, ExtractionError> {
        self.content(CSRF_KEY).map(str::to_string)
    }

    /// Projects listed on the overview page. Every element must be well formed.
    pub fn projects(&self) -> Result<Vec<RawProject>, ExtractionError> {
        self.typed_array(PROJECTS_KEY)
    }

    /// Tags listed on the overview page. Every element must be well formed.
    pub fn tags(&self) -> Result<Vec<RawTag>, ExtractionError> {
        self.typed_array(TAGS_KEY)
    }

    /// Pending project invites from the notification feed.
    ///
    /// Notifications of other types, and invite notifications missing one of
    /// the required fields, are skipped.
    pub fn invites(&self) -> Result<Vec<Invite>, ExtractionError> {
        let value = self.json(NOTIFICATIONS_KEY)?;
        let Value::Array(items) = value else {
            return Err(ExtractionError::with_detail(
                NOTIFICATIONS_KEY,
                ExtractionFailure::SchemaMismatch,
                "expected an array",
            ));
        };

        let invites = items
            .into_iter()
            .filter(|n| n.get("templateKey").and_then(Value::as_str) == Some(INVITE_TEMPLATE))
            .filter_map(|n| match serde_json::from_value::<InviteNotification>(n) {
                Ok(notification) => Some(notification.into_invite()),
                Err(e) => {
                    debug!("dropping malformed invite notification: {e}");
                    None
                }
            })
            .collect();

        Ok(invites)
    }

    fn typed_array<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, ExtractionError> {
        let value = self.json(key)?;
        if !value.is_array() {
            return Err(ExtractionError::with_detail(
                key,
                ExtractionFailure::SchemaMismatch,
                "expected an array",
            ));
        }
        serde_json::from_value(value).map_err(|e| {
            ExtractionError::with_detail(key, ExtractionFailure::SchemaMismatch, e.to_string())
        })
    }
}

#[derive(Deserialize)]
struct InviteNotification {
    #[serde(rename = "messageOpts")]
    message_opts: InviteMessageOpts,
    #[serde(default)]
    expires: Option<Value>,
}

#[derive(Deserialize)]
struct InviteMessageOpts {
    #[serde(rename = "projectName")]
    project_name: String,
    #[serde(rename = "projectId")]
    project_id: String,
    token: String,
    #[serde(default, rename = "userName")]
    user_name: Option<Value>,
}

impl InviteNotification {
    fn into_invite(self) -> Invite {
        Invite {
            project_name: self.message_opts.project_name,
            project_id: self.message_opts.project_id,
            token: self.message_opts.token,
            username: self
                .message_opts
                .user_name
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_string),
            expires_at: self.expires.as_ref().and_then(parse_timestamp),
        }
    }
}

/// Decodes the HTML character references that appear in attribute values.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&end| end <= 12).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "quot" => Some('"'),
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            ch.map(|c| (c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
