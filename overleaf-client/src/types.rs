//! Domain types scraped from Overleaf pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project visible to the logged-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Tag names in the order the tags are listed, without duplicates.
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub is_trashed: bool,
    /// `None` when the server sent nothing, or something unparsable.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Project {
    /// Archived and trashed projects are never mirrored.
    pub fn is_active(&self) -> bool {
        !self.is_archived && !self.is_trashed
    }

    /// Fail-open change-date check: an unknown date always counts as changed.
    pub fn changed_since(&self, cutoff: DateTime<Utc>) -> bool {
        match self.last_updated {
            Some(ts) => ts >= cutoff,
            None => true,
        }
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// A pending invitation to collaborate on a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub project_name: String,
    pub project_id: String,
    pub token: String,
    pub username: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Project record as embedded in `ol-projects`.
#[derive(Clone, Debug, Deserialize)]
pub struct RawProject {
    pub id: String,
    pub name: String,
    pub archived: bool,
    pub trashed: bool,
    /// Left untyped; parsed permissively when building [`Project`].
    #[serde(default, rename = "lastUpdated")]
    pub last_updated: Option<serde_json::Value>,
}

/// Tag record as embedded in `ol-tags`.
#[derive(Clone, Debug, Deserialize)]
pub struct RawTag {
    pub name: String,
    pub project_ids: Vec<String>,
}

/// Parses an RFC 3339 timestamp, returning `None` on anything else.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Joins raw project records with raw tags on project id.
pub fn join_projects(projects: Vec<RawProject>, tags: &[RawTag]) -> Vec<Project> {
    projects
        .into_iter()
        .map(|raw| {
            let mut tag_names: Vec<String> = Vec::new();
            for tag in tags.iter().filter(|t| t.project_ids.contains(&raw.id)) {
                if !tag_names.contains(&tag.name) {
                    tag_names.push(tag.name.clone());
                }
            }

            Project {
                last_updated: raw.last_updated.as_ref().and_then(parse_timestamp),
                id: raw.id,
                name: raw.name,
                tags: tag_names,
                is_archived: raw.archived,
                is_trashed: raw.trashed,
            }
        })
        .collect()
}
