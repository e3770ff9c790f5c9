//! Mirrors the projects of an Overleaf Community Edition account to disk.
//!
//! [`SyncOrchestrator`] logs in, optionally accepts pending invites, selects
//! projects ([`filter`]) and replaces each project's local directory with
//! its current archive ([`archive`]). Per-unit outcomes land in a
//! [`SyncReport`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod last_run;
pub mod orchestrator;
pub mod report;

pub use config::SyncConfig;
pub use error::{ArchiveError, SyncError, SyncResult};
pub use last_run::LastRun;
pub use orchestrator::SyncOrchestrator;
pub use report::{SyncReport, SyncedProject, UnitFailure, UnitKind, UnitOutcome};
