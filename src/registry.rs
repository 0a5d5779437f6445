//! Client registry
//!
//! Clients are registered once during a configuration pass and looked up by
//! name afterwards. The registry itself is immutable once built; per-client
//! credential changes go through [`PushClient`]'s own lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fcm_push::registry;
//! use fcm_push::transport::HttpTransportFactory;
//! use fcm_push::NotificationRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = registry::configure(Arc::new(HttpTransportFactory::default()), |c| {
//!     c.client("default", |config| {
//!         config.set_api_key("legacy-server-key");
//!     })?;
//!     Ok(())
//! })?;
//!
//! if let Some(client) = clients.client("default") {
//!     client.push(&NotificationRequest::new("device-token").with_title("Hello")).await?;
//! }
//! # Ok(())
//! # }
//! ```

use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::client::{ClientConfig, PushClient};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::transport::TransportFactory;

static GLOBAL: OnceCell<ClientRegistry> = OnceCell::new();

/// Builder handed to [`configure`]
pub struct Configurator {
    factory: Arc<dyn TransportFactory>,
    clients: BTreeMap<String, Arc<PushClient>>,
}

impl Configurator {
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            clients: BTreeMap::new(),
        }
    }

    /// Register a client built by `build`.
    ///
    /// The config is validated after `build` returns; an invalid config is
    /// never inserted. Registering an existing name replaces it.
    pub fn client<F>(&mut self, name: impl Into<String>, build: F) -> AppResult<Arc<PushClient>>
    where
        F: FnOnce(&mut ClientConfig),
    {
        let mut config = ClientConfig::new(name);
        build(&mut config);

        let client = Arc::new(PushClient::new(config.clone(), Arc::clone(&self.factory))?);
        info!(client = %client.name(), mode = %config.mode(), "Registered push client");

        self.clients.insert(client.name().to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub fn finish(self) -> ClientRegistry {
        ClientRegistry {
            clients: self.clients,
        }
    }
}

/// Register a set of clients; any invalid registration fails the whole call
pub fn configure<F>(factory: Arc<dyn TransportFactory>, register: F) -> AppResult<ClientRegistry>
where
    F: FnOnce(&mut Configurator) -> AppResult<()>,
{
    let mut configurator = Configurator::new(factory);
    register(&mut configurator)?;
    Ok(configurator.finish())
}

/// Named clients, read-only after configuration
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, Arc<PushClient>>,
}

impl ClientRegistry {
    /// Build every client declared in a configuration file
    pub fn from_config(config: &Config, factory: Arc<dyn TransportFactory>) -> AppResult<Self> {
        configure(factory, |c| {
            for (name, section) in &config.clients {
                let section = section.expand_env()?;
                c.client(name.as_str(), |client| section.apply(client))?;
            }
            Ok(())
        })
    }

    /// Look up a client. Unknown names are not an error.
    pub fn client(&self, name: &str) -> Option<Arc<PushClient>> {
        self.clients.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Arc<PushClient>> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Install the process-wide registry. Can only be done once.
pub fn install(registry: ClientRegistry) -> AppResult<&'static ClientRegistry> {
    GLOBAL
        .set(registry)
        .map_err(|_| AppError::config("A global client registry is already installed"))?;
    GLOBAL
        .get()
        .ok_or_else(|| AppError::internal("Global client registry missing after install"))
}

/// The process-wide registry, if one was installed
pub fn global() -> Option<&'static ClientRegistry> {
    GLOBAL.get()
}
