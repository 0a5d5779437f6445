//! Configuration inspection handler

use super::super::{CliContext, ConfigAction};
use anyhow::Result;

/// Handler for configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub fn handle_config(&self, action: ConfigAction) -> Result<()> {
        let manager = &self.context.config_manager;

        match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&manager.config().redacted())?);
            }
            ConfigAction::Path => {
                println!("{}", manager.config_path().display());
            }
        }
        Ok(())
    }
}
