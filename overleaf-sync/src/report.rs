//! Outcome of a sync run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kind of unit a run processes independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Invite,
    Project,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Invite => f.write_str("invite"),
            UnitKind::Project => f.write_str("project"),
        }
    }
}

/// A project that was mirrored to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncedProject {
    pub id: String,
    pub name: String,
    pub dir: PathBuf,
    pub files: usize,
    pub bytes: u64,
}

/// A unit that failed without aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    pub kind: UnitKind,
    pub id: String,
    pub name: String,
    pub error: String,
}

/// Result of processing one unit.
#[derive(Debug)]
pub enum UnitOutcome {
    InviteAccepted,
    ProjectSynced(SyncedProject),
    Failed(UnitFailure),
}

/// What a run did. Built up one unit at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub invites_accepted: usize,
    pub projects_synced: Vec<SyncedProject>,
    pub failures: Vec<UnitFailure>,
    /// Set when the closing logout failed. Not counted as a unit failure.
    pub logout_error: Option<String>,
}

impl SyncReport {
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::InviteAccepted => self.invites_accepted += 1,
            UnitOutcome::ProjectSynced(project) => self.projects_synced.push(project),
            UnitOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    /// True when every unit succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_units(&self) -> usize {
        self.failures.len()
    }

    pub fn failures_of(&self, kind: UnitKind) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}
