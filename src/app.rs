use crate::config::Config;
use crate::github::api::{GithubApi, OctocrabApi};
use crate::github::auth::AppKey;
use std::sync::Arc;

#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub key: AppKey,
    pub github: Arc<dyn GithubApi>,
}

impl App {
    pub fn new(config: Config, key: AppKey) -> Self {
        let github = OctocrabApi::new(config.api_url.clone());
        Self::with_api(config, key, Arc::new(github))
    }

    pub fn with_api(config: Config, key: AppKey, github: Arc<dyn GithubApi>) -> Self {
        Self {
            config: Arc::new(config),
            key,
            github,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::github::api::InstallationToken;
    use crate::github::auth::tests::{test_key, PUBLIC_KEY};
    use crate::github::auth::AppClaims;
    use async_trait::async_trait;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        InstallationToken { app_id: u64, installation_id: u64 },
        Comment {
            token: String,
            owner: String,
            repo: String,
            issue_number: u64,
            body: String,
        },
    }

    /// Records every upstream call instead of talking to GitHub.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingApi {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_token: bool,
        fail_comment: bool,
    }

    impl RecordingApi {
        pub(crate) const TOKEN: &'static str = "ghs_test_installation";

        pub(crate) fn failing_token_exchange() -> Self {
            Self {
                fail_token: true,
                ..Self::default()
            }
        }

        pub(crate) fn failing_comment() -> Self {
            Self {
                fail_comment: true,
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GithubApi for RecordingApi {
        async fn create_installation_token(
            &self,
            app_jwt: &str,
            installation_id: u64,
        ) -> anyhow::Result<InstallationToken> {
            let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes())?;
            let validation = Validation::new(Algorithm::RS256);
            let claims = decode::<AppClaims>(app_jwt, &key, &validation)?.claims;

            self.calls.lock().unwrap().push(Call::InstallationToken {
                app_id: claims.iss,
                installation_id,
            });

            if self.fail_token {
                anyhow::bail!("GitHub API error: 401 Unauthorized");
            }

            Ok(InstallationToken {
                token: Self::TOKEN.to_string(),
                expires_at: None,
            })
        }

        async fn create_issue_comment(
            &self,
            token: &str,
            owner: &str,
            repo: &str,
            issue_number: u64,
            body: &str,
        ) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(Call::Comment {
                token: token.to_string(),
                owner: owner.to_string(),
                repo: repo.to_string(),
                issue_number,
                body: body.to_string(),
            });

            if self.fail_comment {
                anyhow::bail!("GitHub API error: 403 Forbidden");
            }

            Ok(())
        }
    }

    pub(crate) fn test_config(app_id: Option<u64>) -> Config {
        Config {
            port: 0,
            app_id,
            private_key_path: "unused.pem".into(),
            webhook_secret: None,
            api_url: crate::github::api::DEFAULT_API_URL.to_string(),
        }
    }

    pub(crate) fn test_app(app_id: Option<u64>, api: RecordingApi) -> App {
        App::with_api(test_config(app_id), test_key(), Arc::new(api))
    }
}
