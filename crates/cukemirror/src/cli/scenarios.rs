//! `cukemirror scenarios`

use super::output::print_envelope;
use super::Context;
use anyhow::{Context as _, Result};
use clap::Subcommand;
use cukemirror::{service, ScenarioQuery};

#[derive(Subcommand, Debug)]
pub enum ScenariosAction {
    /// Replace the local scenario mirror of a project with upstream state
    Refresh {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,

        #[arg(long)]
        project: i64,
    },

    /// Refresh scenarios of every project the user can see
    RefreshAll {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,
    },

    /// Query mirrored scenarios. Precedence: --tags, --folder, --keyword
    List {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,

        #[arg(long)]
        project: i64,

        /// Comma-separated key:value filters, all of which must match
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        folder: Option<i64>,

        /// Case-insensitive substring of the scenario name
        #[arg(long)]
        keyword: Option<String>,
    },
}

pub async fn run(ctx: &Context, action: ScenariosAction) -> Result<()> {
    match action {
        ScenariosAction::Refresh { user, project } => {
            let account = ctx.user(&user).await?;
            let scenarios = ctx
                .refresher()?
                .refresh_scenarios(&account, project)
                .await
                .context("Failed to refresh scenarios")?;
            print_envelope("Scenarios refreshed successfully", "scenarios", &scenarios)
        }
        ScenariosAction::RefreshAll { user } => {
            let account = ctx.user(&user).await?;
            let scenarios = ctx
                .refresher()?
                .refresh_all_scenarios(&account)
                .await
                .context("Failed to refresh scenarios")?;
            print_envelope("All scenarios refreshed successfully", "scenarios", &scenarios)
        }
        ScenariosAction::List {
            user,
            project,
            tags,
            folder,
            keyword,
        } => {
            let account = ctx.user(&user).await?;
            let query = ScenarioQuery::from_params(tags.as_deref(), folder, keyword.as_deref());
            let scenarios = service::scenarios(&ctx.db, account.scope(project), &query)
                .await
                .context("Failed to get scenarios")?;
            print_envelope("Scenarios retrieved successfully", "scenarios", &scenarios)
        }
    }
}
