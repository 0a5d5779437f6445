//! OAuth2 access tokens for the HTTP v1 protocol.
//!
//! A service account key is exchanged for a short-lived access token using
//! the JWT bearer grant. Tokens are cached until shortly before they expire.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::ResolvedCredential;
use crate::errors::{AppError, AppResult};

/// OAuth scope required to send messages
pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Seconds of remaining validity below which a cached token is refreshed
const REFRESH_MARGIN_SECS: i64 = 60;

/// Fields of a Google service account key used for token minting
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_slice(bytes: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| AppError::credentials_with_source("Invalid service account key", e))
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    pub(crate) fn for_key(key: &ServiceAccountKey, issued_at: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: MESSAGING_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            exp: issued_at + Duration::hours(1).num_seconds(),
            iat: issued_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + REFRESH_MARGIN_SECS
    }
}

/// Mints and caches access tokens for one service account
pub struct AccessTokenProvider {
    credential: ResolvedCredential,
    http_client: reqwest::Client,
    cache: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(credential: ResolvedCredential, http_client: reqwest::Client) -> Self {
        Self {
            credential,
            http_client,
            cache: Mutex::new(None),
        }
    }

    /// Get an access token, reusing the cached one while it is still fresh
    pub async fn access_token(&self) -> AppResult<String> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();

        if let Some(cached) = cache.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(cached.access_token.clone());
        }

        let key = ServiceAccountKey::from_slice(&self.credential.read().await?)?;
        let assertion = sign_assertion(&key, now)?;

        debug!(
            client_email = %key.client_email,
            credential = %self.credential.filename(),
            "Requesting OAuth2 access token"
        );

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::credentials(format!(
                "Token request failed: {} - {}",
                status, error_text
            )));
        }

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::credentials_with_source("Failed to parse token response", e))?;

        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: now + token.expires_in,
        });

        Ok(token.access_token)
    }
}

fn sign_assertion(key: &ServiceAccountKey, now: i64) -> AppResult<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| AppError::credentials_with_source("Failed to parse private key", e))?;

    Ok(encode(&header, &JwtClaims::for_key(key, now), &encoding_key)?)
}
