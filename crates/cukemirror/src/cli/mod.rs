//! CLI subcommands.

pub mod config;
pub mod folders;
pub mod output;
pub mod projects;
pub mod scenarios;
pub mod user;

use anyhow::{Context as _, Result};
use cukemirror::config::MirrorConfig;
use cukemirror::{MirrorDb, Refresher, SyncError};
use cukemirror_protocol::UserAccount;
use cukemirror_upstream::StudioClient;
use std::sync::Arc;

/// Opened store plus resolved configuration, shared by subcommands.
pub struct Context {
    pub config: MirrorConfig,
    pub db: MirrorDb,
}

impl Context {
    pub async fn open(config: MirrorConfig) -> Result<Self> {
        let path = config.store_path();
        let db = MirrorDb::open(&path)
            .await
            .with_context(|| format!("Failed to open mirror database at {}", path.display()))?;
        Ok(Self { config, db })
    }

    pub fn refresher(&self) -> Result<Refresher> {
        let client = StudioClient::new(
            self.config.upstream.base_url.clone(),
            self.config.upstream.timeout(),
        )
        .context("Failed to build Cucumber Studio client")?;

        Ok(Refresher::new(self.db.clone(), Arc::new(client))
            .with_strategy(self.config.refresh.strategy))
    }

    /// Look up the user a command runs as.
    pub async fn user(&self, email: &str) -> Result<UserAccount> {
        self.db
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| SyncError::UnknownUser(email.to_string()))
            .with_context(|| "TRY: cukemirror user add --email <EMAIL> --client-id <ID> --access-token <TOKEN>")
    }
}
