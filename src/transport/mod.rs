//! Transport seam between payload shaping and the FCM HTTP endpoints
//!
//! The push client only ever talks to a [`Transport`]: it hands over a fully
//! shaped payload and gets back the raw status code and body. Transports are
//! built by a [`TransportFactory`] every time a client's credentials change,
//! which keeps the client testable with an in-process double.
//!
//! ## Architecture
//!
//! - **Transport**: `send_legacy(token, payload)` and `send_v1(payload)`
//! - **TransportFactory**: builds a transport from a legacy server key or from
//!   the HTTP v1 credential set
//! - **HttpTransport**: reqwest-backed implementation talking to FCM

pub mod auth;
pub mod http;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::credentials::ResolvedCredential;
use crate::errors::AppResult;

pub use http::{HttpTransport, HttpTransportFactory, TransportSettings};

/// Outcome label reported by a transport when the provider accepted the message
pub const OUTCOME_SUCCESS: &str = "success";

/// Raw result of a single send, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: u16,
    /// Unparsed response body
    pub body: String,
    /// Transport-level outcome label, [`OUTCOME_SUCCESS`] when accepted
    pub outcome: Option<String>,
}

impl TransportResponse {
    pub fn new(status_code: u16, body: impl Into<String>, outcome: Option<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            outcome,
        }
    }
}

/// Message transport to the notification provider
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a payload through the legacy server-key protocol
    async fn send_legacy(&self, token: &str, payload: &Value) -> AppResult<TransportResponse>;

    /// Send a payload through the HTTP v1 protocol
    async fn send_v1(&self, payload: &Value) -> AppResult<TransportResponse>;
}

/// Credential set for the HTTP v1 protocol
#[derive(Debug, Clone, Default)]
pub struct ModernCredentials {
    /// Explicit bearer token; when absent one is minted from `credential`
    pub api_token: Option<String>,
    pub credential: Option<ResolvedCredential>,
    pub project_id: Option<String>,
}

/// Builds transports for a client's current credentials
pub trait TransportFactory: Send + Sync {
    /// Build a transport for the legacy protocol from a server key
    fn legacy(&self, api_key: &str) -> AppResult<Arc<dyn Transport>>;

    /// Build a transport for the HTTP v1 protocol
    fn modern(&self, credentials: ModernCredentials) -> AppResult<Arc<dyn Transport>>;
}
