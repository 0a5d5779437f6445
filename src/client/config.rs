use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::blank::Blank;
use crate::credentials::{CredentialBlob, Credentials};
use crate::errors::{AppError, AppResult};
use crate::transport::ModernCredentials;

/// Wire protocol a client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Server-key protocol (`/fcm/send`)
    Legacy,
    /// Per-project HTTP v1 protocol
    #[default]
    Modern,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials and options for one named client
///
/// Every credential setter re-derives [`mode`](Self::mode): the HTTP v1
/// protocol is used when no legacy key is set, or when the v1 credential set
/// (credentials and project id) is complete. The legacy protocol is only used
/// when a server key is the sole usable credential.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    name: String,
    api_key: Option<String>,
    credentials: Credentials,
    project_id: Option<String>,
    api_token: Option<String>,
    modern_enabled: bool,
    mode: Mode,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: None,
            credentials: Credentials::default(),
            project_id: None,
            api_token: None,
            modern_enabled: true,
            mode: Mode::Modern,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn modern_enabled(&self) -> bool {
        self.modern_enabled
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = Some(api_key.into());
        self.update_mode()
    }

    pub fn clear_api_key(&mut self) -> &mut Self {
        self.api_key = None;
        self.update_mode()
    }

    pub fn set_credentials_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.credentials.set_path(Some(path.into()));
        self.update_mode()
    }

    pub fn set_credentials_blob(&mut self, blob: impl Into<CredentialBlob>) -> &mut Self {
        self.credentials.set_blob(Some(blob.into()));
        self.update_mode()
    }

    pub fn clear_credentials(&mut self) -> &mut Self {
        self.credentials = Credentials::default();
        self.update_mode()
    }

    pub fn set_project_id(&mut self, project_id: impl Into<String>) -> &mut Self {
        self.project_id = Some(project_id.into());
        self.update_mode()
    }

    pub fn clear_project_id(&mut self) -> &mut Self {
        self.project_id = None;
        self.update_mode()
    }

    pub fn set_api_token(&mut self, api_token: impl Into<String>) -> &mut Self {
        self.api_token = Some(api_token.into());
        self.update_mode()
    }

    pub fn clear_api_token(&mut self) -> &mut Self {
        self.api_token = None;
        self.update_mode()
    }

    /// Allow or refuse sending through the HTTP v1 protocol
    pub fn set_modern_enabled(&mut self, enabled: bool) -> &mut Self {
        self.modern_enabled = enabled;
        self
    }

    /// True when both v1 credentials and a project id are usable
    pub fn modern_complete(&self) -> bool {
        self.credentials.is_resolvable() && self.project_id.is_present()
    }

    /// Mode implied by the current credentials
    pub fn derive_mode(&self) -> Mode {
        if self.api_key.is_blank() || self.modern_complete() {
            Mode::Modern
        } else {
            Mode::Legacy
        }
    }

    fn update_mode(&mut self) -> &mut Self {
        self.mode = self.derive_mode();
        self
    }

    /// Check that the config can reach at least one protocol
    pub fn validate(&self) -> AppResult<()> {
        let mut reasons = Vec::new();

        if self.name.is_blank() {
            reasons.push("Required field: name".to_string());
        }

        if !self.modern_complete() && self.api_key.is_blank() {
            reasons.push(
                "Either an API key for the legacy API or the Google application credentials and the Firebase project id are required"
                    .to_string(),
            );
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidClientConfiguration { reasons })
        }
    }

    /// Credential set handed to the transport factory in modern mode
    pub fn modern_credentials(&self) -> AppResult<ModernCredentials> {
        Ok(ModernCredentials {
            api_token: self.api_token.clone(),
            credential: self.credentials.resolve()?.cloned(),
            project_id: self.project_id.clone(),
        })
    }
}
