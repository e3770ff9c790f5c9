//! Timestamp of the last clean run, kept in a flat file.

use crate::config::SyncConfig;
use crate::report::{SyncReport, UnitKind};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default file name, relative to the working directory.
pub const DEFAULT_FILE: &str = ".lastrun";

#[derive(Debug, Clone)]
pub struct LastRun {
    path: PathBuf,
}

impl LastRun {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored timestamp. A missing or unparsable file yields `None`.
    pub async fn read(&self) -> Option<DateTime<Utc>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no last-run marker at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("cannot read last-run marker {}: {e}", self.path.display());
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                warn!("ignoring unparsable last-run marker {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Overwrites the marker with `at`.
    pub async fn write(&self, at: DateTime<Utc>) -> io::Result<()> {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        tokio::fs::write(&self.path, stamp).await
    }

    /// Uses the stored timestamp as the change-date cutoff, unless the
    /// config already has one.
    pub async fn apply_cutoff(&self, config: &mut SyncConfig) {
        if config.changed_after.is_some() {
            return;
        }
        config.changed_after = self.read().await;
        if let Some(at) = config.changed_after {
            info!("only syncing projects changed since last run at {at}");
        }
    }

    /// Advances the marker to `started` after a run.
    ///
    /// If any project failed the marker is left untouched, so the next run's
    /// cutoff still covers the failed projects. Returns whether it was written.
    pub async fn record(&self, report: &SyncReport, started: DateTime<Utc>) -> io::Result<bool> {
        let failed = report.failures_of(UnitKind::Project).count();
        if failed > 0 {
            warn!(
                "{failed} projects failed; keeping last-run marker {} unchanged",
                self.path.display()
            );
            return Ok(false);
        }
        self.write(started).await?;
        Ok(true)
    }
}
