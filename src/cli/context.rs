//! CLI context holding the loaded configuration

use anyhow::Result;
use fcm_push::transport::{HttpTransportFactory, TransportSettings};
use fcm_push::{ClientRegistry, ConfigManager};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    /// Create a new CLI context from an optional config path
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let config_manager = Arc::new(ConfigManager::new(config_path)?);

        Ok(Self {
            verbose,
            config_manager,
        })
    }

    /// Initialize logging based on verbosity and configuration
    pub fn init_logging(&self) -> Result<()> {
        let log_level = if self.verbose {
            "debug"
        } else {
            self.config_manager.config().log_level.as_str()
        };

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(log_level.parse().unwrap_or_else(|_| tracing::Level::INFO.into())),
            )
            .init();

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!("Config path: {:?}", self.config_manager.config_path());
        }

        Ok(())
    }

    /// Build the client registry described by the configuration file
    pub fn registry(&self) -> Result<ClientRegistry> {
        let config = self.config_manager.config();
        let factory = HttpTransportFactory::new(TransportSettings::from(&config.transport));
        Ok(ClientRegistry::from_config(config, Arc::new(factory))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_creation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let context = CliContext::new(Some(path.clone()), false).unwrap();

        assert!(!context.verbose);
        assert_eq!(context.config_manager.config_path(), path.as_path());
        assert!(context.registry().unwrap().is_empty());
    }

    #[test]
    fn test_registry_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[clients.default]\napi_key = \"server-key\"\n").unwrap();

        let context = CliContext::new(Some(path), true).unwrap();
        let registry = context.registry().unwrap();
        assert!(registry.client("default").is_some());
    }
}
