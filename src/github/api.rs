use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn create_installation_token(
        &self,
        app_jwt: &str,
        installation_id: u64,
    ) -> anyhow::Result<InstallationToken>;

    async fn create_issue_comment(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct OctocrabApi {
    base_uri: String,
}

impl OctocrabApi {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
        }
    }

    fn client(&self, bearer: &str) -> anyhow::Result<Octocrab> {
        Octocrab::builder()
            .base_uri(self.base_uri.as_str())
            .with_context(|| format!("Invalid GitHub API url {}", self.base_uri))?
            .personal_token(bearer.to_string())
            .build()
            .context("Failed to build GitHub client")
    }
}

#[async_trait]
impl GithubApi for OctocrabApi {
    async fn create_installation_token(
        &self,
        app_jwt: &str,
        installation_id: u64,
    ) -> anyhow::Result<InstallationToken> {
        let route = format!("/app/installations/{installation_id}/access_tokens");

        let token: InstallationToken = self
            .client(app_jwt)?
            .post(route, None::<&()>)
            .await
            .with_context(|| {
                format!("Failed to create access token for installation {installation_id}")
            })?;

        debug!(
            installation_id,
            expires_at = ?token.expires_at,
            "Received installation token"
        );
        Ok(token)
    }

    async fn create_issue_comment(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        let github = self.client(token)?;
        let comment = github
            .issues(owner, repo)
            .create_comment(issue_number, body)
            .await
            .with_context(|| {
                format!("Failed to comment on {owner}/{repo}#{issue_number}")
            })?;

        debug!(comment_id = %comment.id, "Created issue comment");
        Ok(())
    }
}
