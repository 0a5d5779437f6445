//! Named push clients
//!
//! A [`PushClient`] owns one [`ClientConfig`] plus the transport built for
//! its current mode. Credentials may be changed after registration: each
//! change re-derives the mode and rebuilds the transport under the client's
//! lock, so a push always uses the protocol active at call time.

pub mod config;

pub use config::{ClientConfig, Mode};

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::payload::{self, NotificationRequest};
use crate::response::PushResponse;
use crate::transport::{Transport, TransportFactory};

struct ClientState {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

/// A registered client ready to push
pub struct PushClient {
    name: String,
    factory: Arc<dyn TransportFactory>,
    state: Mutex<ClientState>,
}

impl fmt::Debug for PushClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushClient").field("name", &self.name).finish()
    }
}

impl PushClient {
    /// Validate the config and build the transport for its mode
    pub fn new(config: ClientConfig, factory: Arc<dyn TransportFactory>) -> AppResult<Self> {
        config.validate()?;
        let transport = build_transport(factory.as_ref(), &config)?;

        Ok(Self {
            name: config.name().to_string(),
            factory,
            state: Mutex::new(ClientState { config, transport }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mode the next push will use
    pub fn mode(&self) -> AppResult<Mode> {
        Ok(self.lock_state()?.config.mode())
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> AppResult<ClientConfig> {
        Ok(self.lock_state()?.config.clone())
    }

    /// Change credentials or options.
    ///
    /// The change only takes effect if a transport can be built for the
    /// resulting mode; otherwise the previous state is kept.
    pub fn update<F>(&self, change: F) -> AppResult<Mode>
    where
        F: FnOnce(&mut ClientConfig),
    {
        let mut state = self.lock_state()?;
        let mut next = state.config.clone();
        change(&mut next);

        let transport = build_transport(self.factory.as_ref(), &next)?;
        let previous = state.config.mode();
        let mode = next.mode();

        state.config = next;
        state.transport = transport;

        if previous != mode {
            info!(client = %self.name, from = %previous, to = %mode, "Client mode changed");
        }
        Ok(mode)
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) -> AppResult<Mode> {
        let api_key = api_key.into();
        self.update(|config| {
            config.set_api_key(api_key);
        })
    }

    pub fn set_credentials_path(&self, path: impl Into<std::path::PathBuf>) -> AppResult<Mode> {
        let path = path.into();
        self.update(|config| {
            config.set_credentials_path(path);
        })
    }

    pub fn set_credentials_blob(
        &self,
        blob: impl Into<crate::credentials::CredentialBlob>,
    ) -> AppResult<Mode> {
        let blob = blob.into();
        self.update(|config| {
            config.set_credentials_blob(blob);
        })
    }

    pub fn set_project_id(&self, project_id: impl Into<String>) -> AppResult<Mode> {
        let project_id = project_id.into();
        self.update(|config| {
            config.set_project_id(project_id);
        })
    }

    pub fn set_api_token(&self, api_token: impl Into<String>) -> AppResult<Mode> {
        let api_token = api_token.into();
        self.update(|config| {
            config.set_api_token(api_token);
        })
    }

    /// Validate a request and build the payload the next push would send
    pub fn preview(&self, request: &NotificationRequest) -> AppResult<(Mode, Value)> {
        let (mode, payload, _) = self.prepare(request)?;
        Ok((mode, payload))
    }

    /// Send one notification and normalize the provider's answer
    pub async fn push(&self, request: &NotificationRequest) -> AppResult<PushResponse> {
        let (mode, payload, transport) = self.prepare(request)?;

        info!(client = %self.name, %mode, "Dispatching push notification");

        let raw = match mode {
            Mode::Legacy => transport.send_legacy(&request.token, &payload).await?,
            Mode::Modern => transport.send_v1(&payload).await?,
        };

        let response = PushResponse::from_transport(mode, raw)?;
        if response.success() {
            debug!(client = %self.name, status = response.status(), "Push accepted");
        } else {
            warn!(
                client = %self.name,
                status = response.status(),
                body = %response.body(),
                "Provider reported a failed push"
            );
        }

        Ok(response)
    }

    /// Validation and payload shaping happen under the lock; sending does not.
    fn prepare(&self, request: &NotificationRequest) -> AppResult<(Mode, Value, Arc<dyn Transport>)> {
        request.validate()?;

        let state = self.lock_state()?;
        let mode = state.config.mode();
        if mode == Mode::Modern && !state.config.modern_enabled() {
            return Err(AppError::NotSupported { mode });
        }

        let payload = payload::build(mode, request)?;
        Ok((mode, payload, Arc::clone(&state.transport)))
    }

    fn lock_state(&self) -> AppResult<MutexGuard<'_, ClientState>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal(format!("State lock poisoned for client '{}'", self.name)))
    }
}

fn build_transport(factory: &dyn TransportFactory, config: &ClientConfig) -> AppResult<Arc<dyn Transport>> {
    debug!(client = %config.name(), mode = %config.mode(), "Building transport");

    match config.mode() {
        Mode::Legacy => factory.legacy(config.api_key().unwrap_or_default()),
        Mode::Modern => factory.modern(config.modern_credentials()?),
    }
}
