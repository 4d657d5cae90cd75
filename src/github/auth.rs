//! GitHub App authentication: private key loading and App JWT minting.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// GitHub rejects App JWTs that live longer than ten minutes.
pub const APP_JWT_LIFETIME_SECS: i64 = 600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read private key {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse private key {path}: {source}")]
    ParseKey {
        path: PathBuf,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("failed to sign app jwt: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// The App's RSA signing key. Cheap to clone, read-only once loaded.
#[derive(Clone)]
pub struct AppKey(Arc<EncodingKey>);

impl AppKey {
    pub fn from_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        EncodingKey::from_rsa_pem(pem).map(|key| Self(Arc::new(key)))
    }
}

impl std::fmt::Debug for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AppKey([REDACTED])")
    }
}

/// Reads a PKCS#1 or PKCS#8 PEM encoded RSA private key.
pub fn load_private_key(path: impl AsRef<Path>) -> Result<AppKey, AuthError> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading private key");

    let pem = std::fs::read(path).map_err(|source| AuthError::ReadKey {
        path: path.to_path_buf(),
        source,
    })?;

    let key = AppKey::from_pem(&pem).map_err(|source| AuthError::ParseKey {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Private key loaded");
    Ok(key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: u64,
}

impl AppClaims {
    pub fn new(app_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            iat: now.timestamp(),
            exp: (now + Duration::seconds(APP_JWT_LIFETIME_SECS)).timestamp(),
            iss: app_id,
        }
    }
}

pub fn mint_app_jwt(app_id: u64, key: &AppKey) -> Result<String, AuthError> {
    mint_app_jwt_at(app_id, key, Utc::now())
}

pub fn mint_app_jwt_at(
    app_id: u64,
    key: &AppKey,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = AppClaims::new(app_id, now);
    let token = encode(&Header::new(Algorithm::RS256), &claims, &key.0)
        .map_err(AuthError::Sign)?;

    debug!(app_id, exp = claims.exp, "Minted app jwt");
    Ok(token)
}
