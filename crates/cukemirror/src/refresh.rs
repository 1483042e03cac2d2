//! Refresh orchestration: fetch from upstream, then replace the scope snapshot.
//!
//! A refresh moves through `fetching -> replacing -> done`, or ends in
//! `failed`. A fetch failure never touches the store. What a replace failure
//! leaves behind depends on the [`ReplaceStrategy`]:
//!
//! - `Atomic`: the previous snapshot is still in place.
//! - `BestEffort`: a failed delete is logged and the inserts run anyway; the
//!   first failed insert stops the refresh and keeps the rows inserted so far.
//!
//! Refreshes of the same scope and kind are serialised through [`ScopeLocks`].

use crate::error::{Result, SyncError};
use crate::locks::ScopeLocks;
use cukemirror_db::{MirrorDb, ReplaceReport, ReplaceStrategy};
use cukemirror_protocol::{MirrorKind, Project, Scenario, Scope, UserAccount};
use cukemirror_upstream::StudioSource;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a refresh is in its lifecycle. Used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Fetching,
    Replacing,
    Done,
    Failed,
}

impl RefreshPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Replacing => "replacing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RefreshPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinates upstream fetches with store replacement.
#[derive(Clone)]
pub struct Refresher {
    db: MirrorDb,
    source: Arc<dyn StudioSource>,
    locks: ScopeLocks,
    strategy: ReplaceStrategy,
}

impl Refresher {
    pub fn new(db: MirrorDb, source: Arc<dyn StudioSource>) -> Self {
        Self {
            db,
            source,
            locks: ScopeLocks::new(),
            strategy: ReplaceStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    pub fn db(&self) -> &MirrorDb {
        &self.db
    }

    /// Replace the folder snapshot of `(project_id, user)` with upstream state.
    pub async fn refresh_folders(
        &self,
        user: &UserAccount,
        project_id: i64,
    ) -> Result<ReplaceReport> {
        let scope = user.scope(project_id);
        let kind = MirrorKind::Folders;
        let _guard = self.locks.lock(scope, kind).await;
        info!(%scope, %kind, phase = %RefreshPhase::Fetching, "Refreshing folders");

        let folders = match self.source.fetch_folders(&user.credentials(), project_id).await {
            Ok(folders) => folders,
            Err(err) => return Err(self.failed(scope, kind, SyncError::fetch("folders", err))),
        };
        debug!(%scope, count = folders.len(), "Fetched folders from Cucumber Studio");

        let report = self.replace(scope, kind, |db, strategy| async move {
            db.replace_folders(scope, &folders, strategy).await
        })
        .await?;

        info!(
            %scope,
            %kind,
            phase = %RefreshPhase::Done,
            deleted = report.deleted,
            inserted = report.inserted,
            "Successfully refreshed folders"
        );
        Ok(report)
    }

    /// Replace the scenario snapshot of `(project_id, user)` with upstream
    /// state. Returns the scenarios as fetched.
    pub async fn refresh_scenarios(
        &self,
        user: &UserAccount,
        project_id: i64,
    ) -> Result<Vec<Scenario>> {
        let scope = user.scope(project_id);
        let kind = MirrorKind::Scenarios;
        let _guard = self.locks.lock(scope, kind).await;
        info!(%scope, %kind, phase = %RefreshPhase::Fetching, "Refreshing scenarios");

        let scenarios = match self.source.fetch_scenarios(&user.credentials(), project_id).await {
            Ok(scenarios) => scenarios,
            Err(err) => return Err(self.failed(scope, kind, SyncError::fetch("scenarios", err))),
        };
        debug!(%scope, count = scenarios.len(), "Fetched scenarios from Cucumber Studio");

        let report = self.replace(scope, kind, |db, strategy| {
            let scenarios = &scenarios;
            async move { db.replace_scenarios(scope, scenarios, strategy).await }
        })
        .await?;

        info!(
            %scope,
            %kind,
            phase = %RefreshPhase::Done,
            deleted = report.deleted,
            inserted = report.inserted,
            "Successfully refreshed scenarios"
        );
        Ok(scenarios)
    }

    /// Fetch the user's project list and cache it on the user row.
    pub async fn refresh_projects(&self, user: &UserAccount) -> Result<Vec<Project>> {
        let projects = self
            .source
            .fetch_projects(&user.credentials())
            .await
            .map_err(|err| SyncError::fetch("projects", err))?;

        self.db.update_user_projects(user.id, &projects).await?;
        info!(user_id = user.id, count = projects.len(), "Projects refreshed");
        Ok(projects)
    }

    /// Refresh scenarios for every upstream project of the user.
    ///
    /// Projects with non-numeric ids are skipped and per-project failures are
    /// logged without stopping the sweep. Fails with
    /// [`SyncError::NoProjectRefreshed`] when projects exist but nothing was
    /// collected.
    pub async fn refresh_all_scenarios(&self, user: &UserAccount) -> Result<Vec<Scenario>> {
        let projects = self
            .source
            .fetch_projects(&user.credentials())
            .await
            .map_err(|err| SyncError::fetch("projects", err))?;

        let mut all = Vec::new();
        for project in &projects {
            let Some(project_id) = project.numeric_id() else {
                warn!(project_id = %project.id, "Invalid project ID, skipping");
                continue;
            };

            match self.refresh_scenarios(user, project_id).await {
                Ok(scenarios) => all.extend(scenarios),
                Err(err) => {
                    warn!(project_id, error = %err, "Failed to refresh scenarios for project, continuing");
                }
            }
        }

        if all.is_empty() && !projects.is_empty() {
            return Err(SyncError::NoProjectRefreshed);
        }
        Ok(all)
    }

    async fn replace<F, Fut>(&self, scope: Scope, kind: MirrorKind, run: F) -> Result<ReplaceReport>
    where
        F: FnOnce(MirrorDb, ReplaceStrategy) -> Fut,
        Fut: std::future::Future<Output = cukemirror_db::Result<ReplaceReport>>,
    {
        debug!(%scope, %kind, phase = %RefreshPhase::Replacing, strategy = %self.strategy, "Replacing snapshot");

        match run(self.db.clone(), self.strategy).await {
            Ok(report) => {
                if let Some(ref delete_error) = report.delete_error {
                    warn!(%scope, %kind, error = %delete_error, "Old rows were not deleted before insert");
                }
                Ok(report)
            }
            Err(err) => Err(self.failed(scope, kind, SyncError::replace(kind, scope, err))),
        }
    }

    fn failed(&self, scope: Scope, kind: MirrorKind, err: SyncError) -> SyncError {
        warn!(%scope, %kind, phase = %RefreshPhase::Failed, error = %err, "Refresh failed");
        err
    }
}
