//! Project selection.

use crate::config::SyncConfig;
use overleaf_client::Project;
use tracing::debug;

/// Picks the projects a run should mirror, in listing order.
///
/// Archived and trashed projects are always dropped. Then, when configured:
/// the id/name selector (a project matches on either), the tag selector
/// (any listed tag), and the change-date cutoff (projects without a usable
/// date are kept).
pub fn select_projects(projects: Vec<Project>, config: &SyncConfig) -> Vec<Project> {
    let mut selected: Vec<Project> = projects.into_iter().filter(Project::is_active).collect();

    if let Some(selectors) = &config.projects {
        debug!("applying project id/name filter");
        selected.retain(|p| matches_selector(p, selectors));
    }

    if let Some(tags) = &config.tags {
        debug!("applying project tag filter");
        selected.retain(|p| p.has_any_tag(tags));
    }

    if let Some(cutoff) = config.changed_after {
        debug!("applying project change date filter with cutoff {cutoff}");
        selected.retain(|p| p.changed_since(cutoff));
    }

    selected
}

/// True if the project's id or its name is listed.
pub fn matches_selector(project: &Project, selectors: &[String]) -> bool {
    selectors.iter().any(|s| *s == project.id || *s == project.name)
}

/// Parses a newline separated list of project ids, names or tags.
///
/// Items are trimmed, a single pair of surrounding quotes is removed, and
/// blank lines are skipped.
pub fn parse_selector_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| unquote(line.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
