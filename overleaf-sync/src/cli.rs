//! Command line parsing for the `overleaf-sync` binary.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::filter::parse_selector_list;
use crate::last_run;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

/// Command line of the `overleaf-sync` binary.
#[derive(Parser, Debug)]
#[command(name = "overleaf-sync")]
#[command(about = "Mirror Overleaf Community Edition projects to a local directory", long_about = None)]
pub struct Cli {
    /// Base URL of the Overleaf instance
    #[arg(long, env = "OVERLEAF_HOST", value_name = "URL")]
    pub host: String,

    /// Account email
    #[arg(long, env = "OVERLEAF_EMAIL")]
    pub email: String,

    /// Account password
    #[arg(long, env = "OVERLEAF_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Directory that receives one subdirectory per project
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub downloads_path: PathBuf,

    /// Accept all pending project invites first
    #[arg(long)]
    pub accept_invites: bool,

    /// Only sync this project id or name (repeatable)
    #[arg(long = "project", value_name = "ID|NAME")]
    pub projects: Vec<String>,

    /// File with one project id or name per line
    #[arg(long, value_name = "FILE")]
    pub projects_file: Option<PathBuf>,

    /// Only sync projects carrying this tag (repeatable)
    #[arg(long = "tag", value_name = "NAME")]
    pub tags: Vec<String>,

    /// Only sync projects changed at or after this RFC 3339 instant
    #[arg(long, value_name = "RFC3339", value_parser = parse_rfc3339)]
    pub changed_after: Option<DateTime<Utc>>,

    /// Ignore and do not update the last-run marker
    #[arg(long)]
    pub force_download: bool,

    /// Where the last-run marker is kept
    #[arg(long, value_name = "FILE", default_value = last_run::DEFAULT_FILE)]
    pub last_run_file: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the run configuration. Reads `--projects-file` if given.
    pub fn into_config(self) -> SyncResult<SyncConfig> {
        let mut config = SyncConfig::new(self.host, self.email, self.password, self.downloads_path);
        config.accept_invites = self.accept_invites;
        config.changed_after = self.changed_after;

        let mut projects = normalize(self.projects);
        if let Some(path) = &self.projects_file {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                SyncError::Config(format!("cannot read projects file {}: {e}", path.display()))
            })?;
            projects.extend(parse_selector_list(&raw));
        }
        if !projects.is_empty() || self.projects_file.is_some() {
            config.projects = Some(projects);
        }

        let tags = normalize(self.tags);
        if !tags.is_empty() {
            config.tags = Some(tags);
        }

        Ok(config)
    }
}

fn normalize(items: Vec<String>) -> Vec<String> {
    parse_selector_list(&items.join("\n"))
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec![
            "overleaf-sync",
            "--host",
            "http://overleaf.local",
            "--email",
            "me@example.com",
            "--password",
            "secret",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(!cli.accept_invites);
        assert!(!cli.force_download);
        assert_eq!(cli.last_run_file, PathBuf::from(".lastrun"));

        let config = cli.into_config().unwrap();
        assert_eq!(config.host(), "http://overleaf.local");
        assert_eq!(config.downloads_path, PathBuf::from("downloads"));
        assert_eq!(config.projects, None);
        assert_eq!(config.tags, None);
        assert_eq!(config.changed_after, None);
    }

    #[test]
    fn repeatable_selectors_are_unquoted() {
        let config = parse(&["--project", "\"My Paper\"", "--project", "abc", "--tag", " thesis "])
            .into_config()
            .unwrap();
        assert_eq!(config.projects, Some(vec!["My Paper".into(), "abc".into()]));
        assert_eq!(config.tags, Some(vec!["thesis".into()]));
    }

    #[test]
    fn projects_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("projects.txt");
        std::fs::write(&file, "'Thesis'\n\nxyz\n").unwrap();

        let config = parse(&["--project", "abc", "--projects-file", file.to_str().unwrap()])
            .into_config()
            .unwrap();
        assert_eq!(
            config.projects,
            Some(vec!["abc".into(), "Thesis".into(), "xyz".into()])
        );
    }

    #[test]
    fn empty_projects_file_selects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("projects.txt");
        std::fs::write(&file, "\n").unwrap();

        let config = parse(&["--projects-file", file.to_str().unwrap()])
            .into_config()
            .unwrap();
        assert_eq!(config.projects, Some(vec![]));
    }

    #[test]
    fn missing_projects_file_is_a_config_error() {
        let err = parse(&["--projects-file", "/nonexistent/projects.txt"])
            .into_config()
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn changed_after_must_be_rfc3339() {
        let cli = parse(&["--changed-after", "2024-01-01T00:00:00Z"]);
        assert_eq!(
            cli.changed_after,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );

        let argv = [
            "overleaf-sync",
            "--host",
            "h",
            "--email",
            "e",
            "--password",
            "p",
            "--changed-after",
            "yesterday",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
