use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::auth::AccessTokenProvider;
use super::{ModernCredentials, Transport, TransportFactory, TransportResponse, OUTCOME_SUCCESS};
use crate::errors::{AppError, AppResult};

pub const DEFAULT_LEGACY_URL: &str = "https://fcm.googleapis.com/fcm/send";
pub const DEFAULT_V1_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_USER_AGENT: &str = concat!("fcm-push/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every HTTP transport a factory builds
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub legacy_url: String,
    pub v1_base_url: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            legacy_url: DEFAULT_LEGACY_URL.to_string(),
            v1_base_url: DEFAULT_V1_BASE_URL.to_string(),
        }
    }
}

enum Protocol {
    Legacy {
        server_key: String,
    },
    V1 {
        project_id: Option<String>,
        api_token: Option<String>,
        token_provider: Option<AccessTokenProvider>,
    },
}

/// reqwest-backed FCM transport
pub struct HttpTransport {
    client: Client,
    settings: TransportSettings,
    protocol: Protocol,
}

impl HttpTransport {
    /// Create a transport for the legacy server-key protocol
    pub fn legacy(settings: TransportSettings, server_key: &str) -> AppResult<Self> {
        let client = build_client(&settings)?;
        Ok(Self {
            client,
            settings,
            protocol: Protocol::Legacy {
                server_key: server_key.to_string(),
            },
        })
    }

    /// Create a transport for the HTTP v1 protocol.
    ///
    /// Missing credentials are not an error here; they surface when sending.
    pub fn v1(settings: TransportSettings, credentials: ModernCredentials) -> AppResult<Self> {
        let client = build_client(&settings)?;
        let token_provider = credentials
            .credential
            .map(|credential| AccessTokenProvider::new(credential, client.clone()));

        Ok(Self {
            client,
            settings,
            protocol: Protocol::V1 {
                project_id: credentials.project_id,
                api_token: credentials.api_token.filter(|token| !token.trim().is_empty()),
                token_provider,
            },
        })
    }

    fn v1_url(&self, project_id: &str) -> AppResult<Url> {
        let base = Url::parse(&self.settings.v1_base_url)?;
        Ok(base.join(&format!("v1/projects/{}/messages:send", project_id))?)
    }

    fn legacy_request(&self, server_key: &str, token: &str, payload: &Value) -> AppResult<Request> {
        self.build_request(
            &self.settings.legacy_url,
            &format!("key={}", server_key),
            &legacy_body(token, payload),
        )
    }

    fn v1_request(&self, project_id: &str, bearer: &str, payload: &Value) -> AppResult<Request> {
        let url = self.v1_url(project_id)?;
        self.build_request(
            url.as_str(),
            &format!("Bearer {}", bearer),
            &json!({ "message": payload }),
        )
    }

    fn build_request(&self, url: &str, authorization: &str, body: &Value) -> AppResult<Request> {
        let auth_value = HeaderValue::from_str(authorization)
            .map_err(|e| AppError::transport_with_source("Invalid authorization header", e))?;

        Ok(self
            .client
            .post(url)
            .header(AUTHORIZATION, auth_value)
            .json(body)
            .build()?)
    }

    async fn execute(&self, request: Request) -> AppResult<TransportResponse> {
        let url = request.url().to_string();
        let response = self.client.execute(request).await?;

        let status_code = response.status().as_u16();
        let body = response.text().await?;
        debug!(status_code, url = %url, "FCM responded");

        Ok(TransportResponse::new(status_code, body, Some(describe_status(status_code))))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_legacy(&self, token: &str, payload: &Value) -> AppResult<TransportResponse> {
        let server_key = match &self.protocol {
            Protocol::Legacy { server_key } => server_key,
            Protocol::V1 { .. } => {
                return Err(AppError::transport("Transport was built for the HTTP v1 protocol"))
            }
        };

        let request = self.legacy_request(server_key, token, payload)?;
        self.execute(request).await
    }

    async fn send_v1(&self, payload: &Value) -> AppResult<TransportResponse> {
        let (project_id, api_token, token_provider) = match &self.protocol {
            Protocol::V1 {
                project_id,
                api_token,
                token_provider,
            } => (project_id, api_token, token_provider),
            Protocol::Legacy { .. } => {
                return Err(AppError::transport("Transport was built for the legacy protocol"))
            }
        };

        let project_id = project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::transport("A Firebase project id is required for HTTP v1"))?;
        let bearer = match (api_token, token_provider) {
            (Some(token), _) => token.clone(),
            (None, Some(provider)) => provider.access_token().await?,
            (None, None) => {
                return Err(AppError::transport(
                    "Service account credentials are required for HTTP v1",
                ))
            }
        };

        let request = self.v1_request(project_id, &bearer, payload)?;
        self.execute(request).await
    }
}

fn build_client(settings: &TransportSettings) -> AppResult<Client> {
    let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(30));

    let mut client_builder = Client::builder()
        .timeout(timeout)
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90));

    if let Some(user_agent) = &settings.user_agent {
        client_builder = client_builder.user_agent(user_agent);
    }

    client_builder
        .build()
        .map_err(|e| AppError::transport_with_source("Failed to create HTTP client", e))
}

/// Legacy requests address the recipient through `registration_ids`
fn legacy_body(token: &str, payload: &Value) -> Value {
    let mut body = json!({ "registration_ids": [token] });
    if let (Some(body), Some(payload)) = (body.as_object_mut(), payload.as_object()) {
        for (key, value) in payload {
            body.insert(key.clone(), value.clone());
        }
    }
    body
}

/// Outcome label for a provider status code
fn describe_status(status_code: u16) -> String {
    match status_code {
        200 => OUTCOME_SUCCESS.to_string(),
        400 => "Only applies for JSON requests. Indicates that the request could not be parsed as JSON, or it contained invalid fields.".to_string(),
        401 => "There was an error authenticating the sender account.".to_string(),
        503 => "Server is temporarily unavailable.".to_string(),
        500..=599 => format!("FCM service error: {}", status_code),
        other => format!("Unexpected status: {}", other),
    }
}

/// Builds [`HttpTransport`]s with shared settings
#[derive(Debug, Clone, Default)]
pub struct HttpTransportFactory {
    settings: TransportSettings,
}

impl HttpTransportFactory {
    pub fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }
}

impl TransportFactory for HttpTransportFactory {
    fn legacy(&self, api_key: &str) -> AppResult<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::legacy(self.settings.clone(), api_key)?))
    }

    fn modern(&self, credentials: ModernCredentials) -> AppResult<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::v1(self.settings.clone(), credentials)?))
    }
}
