//! HTTP client for the Cucumber Studio API.
//!
//! Single-shot requests, no retries and no pagination. Each call is bounded by
//! the client timeout, and dropping the returned future cancels the request.

use crate::error::{Result, UpstreamError};
use crate::wire::{FoldersDocument, ProjectsDocument, ScenariosDocument};
use async_trait::async_trait;
use cukemirror_protocol::{Folder, Project, Scenario, StudioCredentials};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://studio.cucumber.io/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT: &str = "application/vnd.api+json; version=1";

/// Source of upstream projects, folders and scenarios.
///
/// [`StudioClient`] is the production implementation; the refresh
/// orchestrator only depends on this trait.
#[async_trait]
pub trait StudioSource: Send + Sync {
    async fn fetch_projects(&self, credentials: &StudioCredentials) -> Result<Vec<Project>>;

    async fn fetch_folders(
        &self,
        credentials: &StudioCredentials,
        project_id: i64,
    ) -> Result<Vec<Folder>>;

    /// Scenarios with their tags resolved from the included resources.
    async fn fetch_scenarios(
        &self,
        credentials: &StudioCredentials,
        project_id: i64,
    ) -> Result<Vec<Scenario>>;
}

/// reqwest-backed [`StudioSource`].
#[derive(Debug, Clone)]
pub struct StudioClient {
    http: reqwest::Client,
    base_url: String,
}

impl StudioClient {
    /// Create a client for `base_url` (e.g. `https://studio.cucumber.io/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credentials: &StudioCredentials,
        path: &str,
        resource: &'static str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, resource, "Fetching from Cucumber Studio");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("access-token", &credentials.access_token)
            .header("client", &credentials.client_id)
            .header("uid", &credentials.email)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode { resource, source })
    }
}

#[async_trait]
impl StudioSource for StudioClient {
    async fn fetch_projects(&self, credentials: &StudioCredentials) -> Result<Vec<Project>> {
        let doc: ProjectsDocument = self.get_json(credentials, "/projects", "projects").await?;
        Ok(doc.into_projects())
    }

    async fn fetch_folders(
        &self,
        credentials: &StudioCredentials,
        project_id: i64,
    ) -> Result<Vec<Folder>> {
        let path = format!("/projects/{project_id}/folders");
        let doc: FoldersDocument = self.get_json(credentials, &path, "folders").await?;
        Ok(doc.into_folders())
    }

    async fn fetch_scenarios(
        &self,
        credentials: &StudioCredentials,
        project_id: i64,
    ) -> Result<Vec<Scenario>> {
        let path = format!("/projects/{project_id}/scenarios?include=tags");
        let doc: ScenariosDocument = self.get_json(credentials, &path, "scenarios").await?;
        Ok(doc.into_scenarios(project_id))
    }
}
