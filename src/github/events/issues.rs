use crate::app::App;
use crate::github::auth::mint_app_jwt;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

pub const THANK_YOU_COMMENT: &str = concat!(
    "¡Gracias por abrir este issue! Nuestro equipo lo revisará pronto. 🚀\n\n",
    "Thanks for opening this issue! Our team will review it soon. 🚀",
);

#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub installation: Option<Installation>,
}

impl IssuesEvent {
    /// Only a JSON object is an event, even though every field is optional.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("webhook payload is not a JSON object"));
        }
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    NotOpened,
    MissingAppId,
    MissingInstallation,
    MissingIssue,
    MissingRepository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAt {
    Mint,
    TokenExchange,
    PostComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored(Ignored),
    Commented,
    Failed(FailedAt),
}

#[instrument(skip_all, fields(action = event.action.as_deref().unwrap_or_default()))]
pub async fn handle(event: IssuesEvent, app: &App) -> Outcome {
    if event.action.as_deref() != Some("opened") {
        debug!("Not an issue opened event, skipping");
        return Outcome::Ignored(Ignored::NotOpened);
    }

    let Some(number) = event.issue.as_ref().map(|issue| issue.number) else {
        warn!("Opened event has no issue");
        return Outcome::Ignored(Ignored::MissingIssue);
    };

    info!(issue = number, "New issue opened");

    let Some(app_id) = app.config.app_id else {
        error!("APP_ID is not configured, dropping event");
        return Outcome::Ignored(Ignored::MissingAppId);
    };

    let Some(repository) = event.repository else {
        warn!(issue = number, "Opened event has no repository");
        return Outcome::Ignored(Ignored::MissingRepository);
    };
    let owner = repository.owner.login;
    let repo = repository.name;

    let Some(installation) = event.installation else {
        warn!(issue = number, "No installation data found in event for {}/{}", owner, repo);
        return Outcome::Ignored(Ignored::MissingInstallation);
    };

    debug!(app_id, "Minting app jwt");
    let jwt = match mint_app_jwt(app_id, &app.key) {
        Ok(jwt) => jwt,
        Err(e) => {
            error!(%e, "Failed to mint app jwt");
            return Outcome::Failed(FailedAt::Mint);
        },
    };

    info!(installation = installation.id, "Requesting installation token");
    let token = match app.github.create_installation_token(&jwt, installation.id).await {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to get installation token: {e:#}");
            return Outcome::Failed(FailedAt::TokenExchange);
        },
    };

    info!("Posting comment on issue #{} in {}/{}", number, owner, repo);
    match app
        .github
        .create_issue_comment(&token.token, &owner, &repo, number, THANK_YOU_COMMENT)
        .await
    {
        Ok(()) => {
            info!("Comment posted");
            Outcome::Commented
        },
        Err(e) => {
            error!("Failed to create comment: {e:#}");
            Outcome::Failed(FailedAt::PostComment)
        },
    }
}
