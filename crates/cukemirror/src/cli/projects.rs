//! `cukemirror projects`

use super::output::print_envelope;
use super::Context;
use anyhow::{Context as _, Result};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ProjectsAction {
    /// Fetch the project list from Cucumber Studio and cache it
    Refresh {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,
    },

    /// Show the cached project list
    List {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,
    },
}

pub async fn run(ctx: &Context, action: ProjectsAction) -> Result<()> {
    match action {
        ProjectsAction::Refresh { user } => {
            let account = ctx.user(&user).await?;
            let projects = ctx
                .refresher()?
                .refresh_projects(&account)
                .await
                .context("Failed to refresh projects")?;
            print_envelope("Projects refreshed successfully", "projects", &projects)
        }
        ProjectsAction::List { user } => {
            let account = ctx.user(&user).await?;
            let projects = ctx.db.cached_projects(account.id).await?;
            print_envelope("Projects retrieved successfully", "projects", &projects)
        }
    }
}
