//! Common test utilities and helpers
//!
//! Shared by the integration tests: an in-process transport double built on
//! the public transport traits, plus helpers for driving the CLI binary.

#![allow(dead_code)]

use assert_cmd::Command;
use async_trait::async_trait;
use fcm_push::client::Mode;
use fcm_push::transport::{ModernCredentials, Transport, TransportFactory, TransportResponse, OUTCOME_SUCCESS};
use fcm_push::AppResult;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One message captured by [`CapturingFactory`]
#[derive(Debug, Clone)]
pub struct Captured {
    pub mode: Mode,
    pub token: Option<String>,
    pub payload: Value,
}

struct CapturingTransport {
    log: Arc<Mutex<Vec<Captured>>>,
    reply: TransportResponse,
}

#[async_trait]
impl Transport for CapturingTransport {
    async fn send_legacy(&self, token: &str, payload: &Value) -> AppResult<TransportResponse> {
        self.log.lock().unwrap().push(Captured {
            mode: Mode::Legacy,
            token: Some(token.to_string()),
            payload: payload.clone(),
        });
        Ok(self.reply.clone())
    }

    async fn send_v1(&self, payload: &Value) -> AppResult<TransportResponse> {
        self.log.lock().unwrap().push(Captured {
            mode: Mode::Modern,
            token: None,
            payload: payload.clone(),
        });
        Ok(self.reply.clone())
    }
}

/// Transport factory whose transports record payloads instead of sending them
#[derive(Clone, Default)]
pub struct CapturingFactory {
    log: Arc<Mutex<Vec<Captured>>>,
}

impl CapturingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.log.lock().unwrap().clone()
    }
}

impl TransportFactory for CapturingFactory {
    fn legacy(&self, _api_key: &str) -> AppResult<Arc<dyn Transport>> {
        Ok(Arc::new(CapturingTransport {
            log: Arc::clone(&self.log),
            reply: TransportResponse::new(
                200,
                r#"{"multicast_id":1,"success":1,"failure":0}"#,
                Some(OUTCOME_SUCCESS.to_string()),
            ),
        }))
    }

    fn modern(&self, _credentials: ModernCredentials) -> AppResult<Arc<dyn Transport>> {
        Ok(Arc::new(CapturingTransport {
            log: Arc::clone(&self.log),
            reply: TransportResponse::new(
                200,
                r#"{"name":"projects/demo/messages/1"}"#,
                Some(OUTCOME_SUCCESS.to_string()),
            ),
        }))
    }
}

/// A config file inside its own temporary directory
pub struct TestConfig {
    _dir: TempDir,
    path: PathBuf,
}

impl TestConfig {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).expect("Failed to write config");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// CLI command preconfigured with `--config <this file>`
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("fcm-push").expect("Failed to find fcm-push binary");
        cmd.arg("--config").arg(&self.path).env_remove("FCM_PUSH_CONFIG");
        cmd
    }
}

/// Config with one legacy and one HTTP v1 client
pub const TWO_CLIENTS: &str = r#"
log_level = "warn"

[clients.default]
api_key = "legacy-server-key"

[clients.app]
credentials_json = '{"type": "service_account", "client_email": "svc@demo.iam.gserviceaccount.com"}'
project_id = "demo"
"#;
