//! `cukemirror folders`

use super::output::print_envelope;
use super::Context;
use anyhow::{Context as _, Result};
use clap::Subcommand;
use cukemirror::service;

#[derive(Subcommand, Debug)]
pub enum FoldersAction {
    /// Replace the local folder mirror of a project with upstream state
    Refresh {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,

        #[arg(long)]
        project: i64,
    },

    /// Print the folder hierarchy of a project from the local mirror
    Tree {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,

        #[arg(long)]
        project: i64,

        /// Include the dangling and cyclic folder report
        #[arg(long)]
        report: bool,
    },
}

pub async fn run(ctx: &Context, action: FoldersAction) -> Result<()> {
    match action {
        FoldersAction::Refresh { user, project } => {
            let account = ctx.user(&user).await?;
            let report = ctx
                .refresher()?
                .refresh_folders(&account, project)
                .await
                .context("Failed to refresh folders")?;
            print_envelope("Folders refreshed successfully", "refresh", &report)
        }
        FoldersAction::Tree {
            user,
            project,
            report,
        } => {
            let account = ctx.user(&user).await?;
            let forest = service::folders_hierarchy(&ctx.db, account.scope(project))
                .await
                .context("Failed to get folder hierarchy")?;

            if report {
                print_envelope("Folder hierarchy retrieved successfully", "hierarchy", &forest)
            } else {
                print_envelope(
                    "Folder hierarchy retrieved successfully",
                    "folders",
                    &forest.into_roots(),
                )
            }
        }
    }
}
