use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;
use crate::errors::{AppError, AppResult};
use crate::transport::http::{DEFAULT_LEGACY_URL, DEFAULT_USER_AGENT, DEFAULT_V1_BASE_URL};
use crate::transport::TransportSettings;

/// Configuration file for the fcm-push CLI
///
/// ```toml
/// log_level = "info"
///
/// [transport]
/// timeout_secs = 30
///
/// [clients.default]
/// api_key = "${FCM_SERVER_KEY}"
///
/// [clients.app]
/// credentials_path = "/etc/fcm/service-account.json"
/// project_id = "my-project"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub clients: BTreeMap<String, ClientSection>,
}

/// Placeholder printed in place of secret values
pub const REDACTED: &str = "<redacted>";

impl Config {
    /// Copy with every client secret replaced by [`REDACTED`]
    ///
    /// Plain `${VAR}` references are kept since they name a variable, not a value.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for section in config.clients.values_mut() {
            section.api_key = redact(&section.api_key);
            section.api_token = redact(&section.api_token);
            section.credentials_json = redact(&section.credentials_json);
        }
        config
    }
}

fn redact(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| {
        let is_reference = v.starts_with("${") && v.ends_with('}') && v.matches("${").count() == 1;
        if is_reference {
            v.clone()
        } else {
            REDACTED.to_string()
        }
    })
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            transport: TransportConfig::default(),
            clients: BTreeMap::new(),
        }
    }
}

/// HTTP settings shared by every client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    #[serde(default = "default_legacy_url")]
    pub legacy_url: String,
    #[serde(default = "default_v1_base_url")]
    pub v1_base_url: String,
}

fn default_legacy_url() -> String {
    DEFAULT_LEGACY_URL.to_string()
}

fn default_v1_base_url() -> String {
    DEFAULT_V1_BASE_URL.to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            legacy_url: default_legacy_url(),
            v1_base_url: default_v1_base_url(),
        }
    }
}

impl From<&TransportConfig> for TransportSettings {
    fn from(config: &TransportConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs,
            user_agent: config.user_agent.clone(),
            legacy_url: config.legacy_url.clone(),
            v1_base_url: config.v1_base_url.clone(),
        }
    }
}

/// One `[clients.<name>]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    pub api_key: Option<String>,
    pub credentials_path: Option<PathBuf>,
    /// Service account JSON given inline instead of as a file
    pub credentials_json: Option<String>,
    pub project_id: Option<String>,
    pub api_token: Option<String>,
    #[serde(default = "default_modern_enabled")]
    pub modern_enabled: bool,
}

fn default_modern_enabled() -> bool {
    true
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            api_key: None,
            credentials_path: None,
            credentials_json: None,
            project_id: None,
            api_token: None,
            modern_enabled: default_modern_enabled(),
        }
    }
}

impl ClientSection {
    /// Copy this section's values onto a client config
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(api_key) = &self.api_key {
            config.set_api_key(api_key.as_str());
        }
        if let Some(json) = &self.credentials_json {
            config.set_credentials_blob(json.as_str());
        }
        if let Some(path) = &self.credentials_path {
            config.set_credentials_path(path.as_path());
        }
        if let Some(project_id) = &self.project_id {
            config.set_project_id(project_id.as_str());
        }
        if let Some(api_token) = &self.api_token {
            config.set_api_token(api_token.as_str());
        }
        config.set_modern_enabled(self.modern_enabled);
    }

    /// Replace `${VAR}` references with values from the environment
    pub fn expand_env(&self) -> AppResult<Self> {
        self.expand_with(|name| std::env::var(name).ok())
    }

    fn expand_with<F>(&self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |value: &Option<String>| -> AppResult<Option<String>> {
            value.as_deref().map(|v| expand_vars(v, &lookup)).transpose()
        };

        let credentials_path = match &self.credentials_path {
            Some(path) => Some(PathBuf::from(expand_vars(&path.to_string_lossy(), &lookup)?)),
            None => None,
        };

        Ok(Self {
            api_key: expand(&self.api_key)?,
            credentials_path,
            credentials_json: expand(&self.credentials_json)?,
            project_id: expand(&self.project_id)?,
            api_token: expand(&self.api_token)?,
            modern_enabled: self.modern_enabled,
        })
    }
}

fn expand_vars<F>(value: &str, lookup: &F) -> AppResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + 2 + len];
        let resolved = lookup(var_name).ok_or_else(|| AppError::EnvVarNotFound {
            var_name: var_name.to_string(),
        })?;

        output.push_str(&rest[..start]);
        output.push_str(&resolved);
        rest = &rest[start + 2 + len + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Loads the configuration file, creating a default one when missing
///
/// The default location is `<config dir>/fcm-push/config.toml`, e.g.
/// `~/.config/fcm-push/config.toml` on Linux.
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load from `path`, or from the default location when `None`
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The configuration directory cannot be determined or created
    /// - The configuration file cannot be read or parsed
    /// - A default configuration cannot be written
    pub fn new(path: Option<PathBuf>) -> AppResult<Self> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };
        let config = Self::load_or_create(&config_path)?;

        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    pub fn default_config_path() -> AppResult<PathBuf> {
        let base_dirs = BaseDirs::new().ok_or_else(|| AppError::config("Failed to get base directories"))?;
        Ok(base_dirs.config_dir().join("fcm-push").join("config.toml"))
    }

    fn load_or_create(path: &Path) -> AppResult<Config> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
            Ok(toml::from_str(&content)?)
        } else {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .map_err(|e| AppError::io_with_source(dir, "create config directory", e))?;
            }
            let config = Config::default();
            let content = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config_with_source("Failed to serialize default config", e))?;
            fs::write(path, content).map_err(|e| AppError::io_with_source(path, "write default config", e))?;
            Ok(config)
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Mode;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            log_level = "debug"

            [transport]
            timeout_secs = 5

            [clients.legacy]
            api_key = "server-key"

            [clients.app]
            credentials_json = '{"client_email": "a@b"}'
            project_id = "demo"
            modern_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.transport.timeout_secs, Some(5));
        assert_eq!(config.transport.legacy_url, DEFAULT_LEGACY_URL);
        assert_eq!(config.clients.len(), 2);
        assert!(!config.clients["app"].modern_enabled);
        assert!(config.clients["legacy"].modern_enabled);
    }

    #[test]
    fn test_section_apply() {
        let section = ClientSection {
            api_key: Some("server-key".to_string()),
            credentials_json: Some("{}".to_string()),
            project_id: Some("demo".to_string()),
            ..Default::default()
        };

        let mut config = ClientConfig::new("app");
        section.apply(&mut config);

        assert_eq!(config.api_key(), Some("server-key"));
        assert_eq!(config.mode(), Mode::Modern);
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = Config::default();
        config.clients.insert(
            "app".to_string(),
            ClientSection {
                api_key: Some("server-key".to_string()),
                api_token: Some("${FCM_TOKEN}".to_string()),
                credentials_json: Some(r#"{"private_key": "pem"}"#.to_string()),
                project_id: Some("demo".to_string()),
                ..Default::default()
            },
        );

        let redacted = config.redacted();
        let section = &redacted.clients["app"];
        assert_eq!(section.api_key.as_deref(), Some(REDACTED));
        assert_eq!(section.api_token.as_deref(), Some("${FCM_TOKEN}"));
        assert_eq!(section.credentials_json.as_deref(), Some(REDACTED));
        assert_eq!(section.project_id.as_deref(), Some("demo"));
        assert_eq!(config.clients["app"].api_key.as_deref(), Some("server-key"));
    }

    #[test]
    fn test_expand_vars() {
        let lookup = |name: &str| match name {
            "KEY" => Some("secret".to_string()),
            _ => None,
        };

        assert_eq!(expand_vars("${KEY}", &lookup).unwrap(), "secret");
        assert_eq!(expand_vars("pre-${KEY}-post", &lookup).unwrap(), "pre-secret-post");
        assert_eq!(expand_vars("no vars", &lookup).unwrap(), "no vars");
        assert_eq!(expand_vars("${unterminated", &lookup).unwrap(), "${unterminated");

        match expand_vars("${MISSING}", &lookup) {
            Err(AppError::EnvVarNotFound { var_name }) => assert_eq!(var_name, "MISSING"),
            other => panic!("Expected EnvVarNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_section_expand_with() {
        let section = ClientSection {
            api_key: Some("${KEY}".to_string()),
            credentials_path: Some(PathBuf::from("${DIR}/creds.json")),
            ..Default::default()
        };
        let lookup = |name: &str| match name {
            "KEY" => Some("secret".to_string()),
            "DIR" => Some("/etc/fcm".to_string()),
            _ => None,
        };

        let expanded = section.expand_with(lookup).unwrap();
        assert_eq!(expanded.api_key.as_deref(), Some("secret"));
        assert_eq!(expanded.credentials_path, Some(PathBuf::from("/etc/fcm/creds.json")));
    }

    #[test]
    fn test_manager_creates_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let manager = ConfigManager::new(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(manager.config_path(), path.as_path());
        assert!(manager.config().clients.is_empty());
    }

    #[test]
    fn test_manager_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "clients = 3").unwrap();

        let err = ConfigManager::new(Some(path)).err().unwrap();
        assert!(matches!(err, AppError::TomlParsing { .. }));
        assert_eq!(err.category(), "config");
    }
}
