//! `cukemirror user` - local users and upstream credentials.

use super::output::print_envelope;
use super::Context;
use anyhow::{Context as _, Result};
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a user and fetch their project list
    Add {
        /// Cucumber Studio account e-mail (sent as `uid`)
        #[arg(long)]
        email: String,

        /// Cucumber Studio client id
        #[arg(long, env = "CUKEMIRROR_CLIENT_ID")]
        client_id: String,

        /// Cucumber Studio access token
        #[arg(long, env = "CUKEMIRROR_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Skip the initial project fetch
        #[arg(long)]
        offline: bool,
    },

    /// Replace the stored Cucumber Studio credentials of a user
    SetCredentials {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,

        #[arg(long, env = "CUKEMIRROR_CLIENT_ID")]
        client_id: String,

        #[arg(long, env = "CUKEMIRROR_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },

    /// Show a user and their cached projects
    Show {
        #[arg(long, env = "CUKEMIRROR_USER")]
        user: String,
    },
}

pub async fn run(ctx: &Context, action: UserAction) -> Result<()> {
    match action {
        UserAction::Add {
            email,
            client_id,
            access_token,
            offline,
        } => {
            let mut user = ctx
                .db
                .create_user(&email, &client_id, &access_token)
                .await
                .context("Failed to create user")?;

            if !offline {
                user.projects = ctx
                    .refresher()?
                    .refresh_projects(&user)
                    .await
                    .context("Failed to fetch initial projects")?;
            }
            info!(user_id = user.id, projects = user.projects.len(), "User registered");
            print_envelope("User registered successfully", "user", &user)
        }
        UserAction::SetCredentials {
            user,
            client_id,
            access_token,
        } => {
            let account = ctx.user(&user).await?;
            ctx.db
                .update_user_credentials(account.id, &client_id, &access_token)
                .await
                .context("Failed to update Cucumber Studio credentials")?;
            let updated = ctx.db.require_user(account.id).await?;
            print_envelope("Credentials updated successfully", "user", &updated)
        }
        UserAction::Show { user } => {
            let account = ctx.user(&user).await?;
            print_envelope("User retrieved successfully", "user", &account)
        }
    }
}
