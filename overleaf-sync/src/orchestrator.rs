//! Sync orchestrator: drives one mirror run end to end.
//!
//! login → optional invite acceptance → list and filter projects →
//! download and extract each project → logout.
//!
//! Invites and projects are independent units. A failing unit is logged and
//! recorded in the [`SyncReport`]; the run carries on with the next one.
//! Login failure and failure to list projects abort the run, but logout is
//! still attempted once a session exists.

use crate::archive;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::filter::select_projects;
use crate::report::{SyncReport, SyncedProject, UnitFailure, UnitKind, UnitOutcome};
use overleaf_client::{ClientError, Invite, OverleafClient, Project};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Prefix of the temporary archive files written next to project directories.
const TEMP_PREFIX: &str = ".overleaf-";

pub struct SyncOrchestrator {
    client: OverleafClient,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        if config.email.is_empty() {
            return Err(SyncError::Config("email must not be empty".into()));
        }
        if config.downloads_path.as_os_str().is_empty() {
            return Err(SyncError::Config("downloads path must not be empty".into()));
        }
        let client = OverleafClient::new(config.client.clone())?;
        Ok(Self::with_client(client, config))
    }

    /// Uses an already constructed client.
    pub fn with_client(client: OverleafClient, config: SyncConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &OverleafClient {
        &self.client
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs a full sync and returns what happened to each unit.
    pub async fn run(&mut self) -> SyncResult<SyncReport> {
        info!(
            "syncing {} into {}",
            self.config.host(),
            self.config.downloads_path.display()
        );
        self.client
            .login(&self.config.email, &self.config.password)
            .await?;

        let mut report = SyncReport::default();
        let result = self.sync_all(&mut report).await;

        match self.client.logout().await {
            Ok(()) => info!("logged out"),
            Err(e) => {
                warn!("logout failed: {e}");
                report.logout_error = Some(e.to_string());
            }
        }

        result?;
        info!(
            "sync finished: {} projects synced, {} invites accepted, {} failures",
            report.projects_synced.len(),
            report.invites_accepted,
            report.failed_units()
        );
        Ok(report)
    }

    async fn sync_all(&mut self, report: &mut SyncReport) -> SyncResult<()> {
        if self.config.accept_invites {
            self.accept_invites(report).await?;
        }

        let projects = self.client.get_projects().await?;
        let listed = projects.len();
        // Directories come from the whole active listing, so a project keeps
        // its directory whatever the selectors or cutoff pick this time.
        let mut dirs = assign_dir_names(projects.iter().filter(|p| p.is_active()));
        let selected = select_projects(projects, &self.config);
        info!("{} of {listed} projects selected", selected.len());

        for project in selected {
            let dir_name = dirs
                .remove(&project.id)
                .unwrap_or_else(|| archive::project_dir_name(&project.name, &project.id));
            let outcome = match self.sync_project(&project, &dir_name).await {
                Ok(synced) => UnitOutcome::ProjectSynced(synced),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    error!("project {} ({}) failed: {e}", project.name, project.id);
                    UnitOutcome::Failed(UnitFailure {
                        kind: UnitKind::Project,
                        id: project.id.clone(),
                        name: project.name.clone(),
                        error: e.to_string(),
                    })
                }
            };
            report.record(outcome);
        }
        Ok(())
    }

    async fn accept_invites(&mut self, report: &mut SyncReport) -> SyncResult<()> {
        let invites = match self.client.get_invites().await {
            Ok(invites) => invites,
            Err(ClientError::SessionRequired) => return Err(ClientError::SessionRequired.into()),
            Err(e) => {
                warn!("cannot list invites: {e}");
                report.record(UnitOutcome::Failed(UnitFailure {
                    kind: UnitKind::Invite,
                    id: String::new(),
                    name: "pending invites".into(),
                    error: e.to_string(),
                }));
                return Ok(());
            }
        };

        for invite in invites {
            report.record(self.accept_invite(&invite).await?);
        }
        Ok(())
    }

    async fn accept_invite(&mut self, invite: &Invite) -> SyncResult<UnitOutcome> {
        match self.client.accept_invite(invite).await {
            Ok(()) => {
                info!("accepted invite to {}", invite.project_name);
                Ok(UnitOutcome::InviteAccepted)
            }
            Err(ClientError::SessionRequired) => Err(ClientError::SessionRequired.into()),
            Err(e) => {
                warn!("cannot accept invite to {}: {e}", invite.project_name);
                Ok(UnitOutcome::Failed(UnitFailure {
                    kind: UnitKind::Invite,
                    id: invite.project_id.clone(),
                    name: invite.project_name.clone(),
                    error: e.to_string(),
                }))
            }
        }
    }

    /// Replaces `downloads_path/<dir_name>` with the project's current archive.
    async fn sync_project(
        &mut self,
        project: &Project,
        dir_name: &str,
    ) -> SyncResult<SyncedProject> {
        let root = &self.config.downloads_path;
        let target = root.join(dir_name);
        info!("syncing {} ({}) into {}", project.name, project.id, target.display());

        archive::remove_dir(&target)?;
        tokio::fs::create_dir_all(root).await?;

        let download = self.client.download_project(project).await?;

        // Deleted on drop if anything below fails.
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".zip")
            .tempfile_in(root)?;
        let mut file = tokio::fs::File::from_std(temp.reopen()?);
        let downloaded = download.write_to(&mut file).await?;
        drop(file);
        debug!("downloaded {downloaded} bytes to {}", temp.path().display());

        let summary = archive::extract_file(temp.path().to_path_buf(), target.clone()).await?;
        temp.close()?;

        debug!(
            "extracted {} files ({} bytes) for {}",
            summary.files, summary.bytes, project.id
        );
        Ok(SyncedProject {
            id: project.id.clone(),
            name: project.name.clone(),
            dir: target,
            files: summary.files,
            bytes: summary.bytes,
        })
    }
}

/// Session loss mid-run cannot be recovered per project.
fn is_fatal(err: &SyncError) -> bool {
    matches!(err, SyncError::Client(ClientError::SessionRequired))
}

/// Maps project ids to directory names.
///
/// Projects are visited in id order. A name that collides with an earlier
/// project gets the project id appended, so the mapping only changes when
/// the colliding projects themselves change.
pub fn assign_dir_names<'a>(
    projects: impl IntoIterator<Item = &'a Project>,
) -> HashMap<String, String> {
    let mut ordered: Vec<&Project> = projects.into_iter().collect();
    ordered.sort_by(|a, b| a.id.cmp(&b.id));

    let mut used = HashSet::new();
    let mut dirs = HashMap::with_capacity(ordered.len());
    for project in ordered {
        let mut dir = archive::project_dir_name(&project.name, &project.id);
        if used.contains(&dir) {
            let unique = archive::project_dir_name(
                &format!("{} ({})", project.name, project.id),
                &project.id,
            );
            warn!("directory {dir} is shared by several projects; {} uses {unique}", project.id);
            dir = unique;
        }
        used.insert(dir.clone());
        dirs.insert(project.id.clone(), dir);
    }
    dirs
}
