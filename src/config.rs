use crate::github::api::DEFAULT_API_URL;
use anyhow::Context;
use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PRIVATE_KEY_PATH: &str = "autoresponderbot.private-key.pem";

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub app_id: Option<u64>,
    pub private_key_path: PathBuf,
    pub webhook_secret: Option<String>,
    pub api_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("app_id", &self.app_id)
            .field("private_key_path", &self.private_key_path)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT {port:?}"))?,
            None => DEFAULT_PORT,
        };

        let app_id = match var("APP_ID") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(%e, app_id = raw, "APP_ID is not a number, ignoring opened issues");
                    None
                },
            },
            None => {
                warn!("APP_ID is not set, opened issues will be ignored");
                None
            },
        };

        let private_key_path = var("PRIVATE_KEY_PATH")
            .unwrap_or_else(|| DEFAULT_PRIVATE_KEY_PATH.to_string())
            .into();

        let webhook_secret = var("GITHUB_WEBHOOK_SECRET");
        if webhook_secret.is_none() {
            warn!("GITHUB_WEBHOOK_SECRET is not set, webhook signatures will not be verified");
        }

        let api_url = var("GITHUB_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            port,
            app_id,
            private_key_path,
            webhook_secret,
            api_url,
        })
    }
}
