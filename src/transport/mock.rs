use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::{ModernCredentials, Transport, TransportFactory, TransportResponse, OUTCOME_SUCCESS};
use crate::client::Mode;
use crate::errors::{AppError, AppResult};

/// One call observed by the recording transport
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SentMessage {
    pub mode: Mode,
    pub token: Option<String>,
    pub payload: Value,
}

/// How a transport was built by the recording factory
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Built {
    Legacy(String),
    Modern { project_id: Option<String>, has_credential: bool, api_token: Option<String> },
}

/// Transport double that records every send and replies with canned bodies
#[derive(Clone)]
pub(crate) struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    reply: Arc<Mutex<TransportResponse>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_legacy(&self, token: &str, payload: &Value) -> AppResult<TransportResponse> {
        self.record(Mode::Legacy, Some(token.to_string()), payload)
    }

    async fn send_v1(&self, payload: &Value) -> AppResult<TransportResponse> {
        self.record(Mode::Modern, None, payload)
    }
}

impl RecordingTransport {
    fn record(&self, mode: Mode, token: Option<String>, payload: &Value) -> AppResult<TransportResponse> {
        let mut sent = self.sent.lock().map_err(|_| AppError::internal("mock poisoned"))?;
        sent.push(SentMessage {
            mode,
            token,
            payload: payload.clone(),
        });
        let reply = self.reply.lock().map_err(|_| AppError::internal("mock poisoned"))?;
        Ok(reply.clone())
    }
}

/// Factory double handing out [`RecordingTransport`]s that share one log
#[derive(Clone)]
pub(crate) struct RecordingFactory {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    built: Arc<Mutex<Vec<Built>>>,
    reply: Arc<Mutex<TransportResponse>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            sent: Arc::default(),
            built: Arc::default(),
            reply: Arc::new(Mutex::new(TransportResponse::new(
                200,
                r#"{"success":1,"failure":0}"#,
                Some(OUTCOME_SUCCESS.to_string()),
            ))),
        }
    }

    pub fn reply_with(&self, response: TransportResponse) {
        *self.reply.lock().unwrap() = response;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn built(&self) -> Vec<Built> {
        self.built.lock().unwrap().clone()
    }

    fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(RecordingTransport {
            sent: Arc::clone(&self.sent),
            reply: Arc::clone(&self.reply),
        })
    }
}

impl TransportFactory for RecordingFactory {
    fn legacy(&self, api_key: &str) -> AppResult<Arc<dyn Transport>> {
        self.built.lock().unwrap().push(Built::Legacy(api_key.to_string()));
        Ok(self.transport())
    }

    fn modern(&self, credentials: ModernCredentials) -> AppResult<Arc<dyn Transport>> {
        self.built.lock().unwrap().push(Built::Modern {
            project_id: credentials.project_id,
            has_credential: credentials.credential.is_some(),
            api_token: credentials.api_token,
        });
        Ok(self.transport())
    }
}
