//! Normalized push results
//!
//! The two protocols report success differently. Legacy responses carry
//! `success`/`failure` counters in the body; HTTP v1 success is reported by
//! the transport's outcome label.

use serde::Serialize;
use serde_json::Value;

use crate::client::Mode;
use crate::errors::AppResult;
use crate::transport::{TransportResponse, OUTCOME_SUCCESS};

/// Uniform result of one push
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushResponse {
    success: bool,
    status: u16,
    body: Value,
}

impl PushResponse {
    pub fn new(success: bool, status: u16, body: Value) -> Self {
        Self { success, status, body }
    }

    /// Parse a raw transport response. A body that is not JSON is an error.
    pub fn from_transport(mode: Mode, response: TransportResponse) -> AppResult<Self> {
        let body: Value = serde_json::from_str(&response.body)?;

        let success = match mode {
            Mode::Legacy => counter(&body, "success") > 0 && counter(&body, "failure") == 0,
            Mode::Modern => response.outcome.as_deref() == Some(OUTCOME_SUCCESS),
        };

        Ok(Self::new(success, response.status_code, body))
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Missing or non-numeric counters read as zero
fn counter(body: &Value, key: &str) -> i64 {
    body.get(key).and_then(Value::as_i64).unwrap_or(0)
}
