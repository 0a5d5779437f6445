//! Command handlers for all CLI operations
//!
//! Parsing lives in `commands`; this module routes each command to the
//! handler that owns it.

mod config;
mod send;

use super::{CliContext, Commands};
use anyhow::Result;
use tracing::debug;

use config::ConfigHandler;
use send::{SendArgs, SendHandler};

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    /// Create a new command handler instance with the provided context
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Send {
                client,
                token,
                title,
                body,
                sound,
                data,
                no_content_available,
                dry_run,
            } => {
                let args = SendArgs {
                    client,
                    token,
                    title,
                    body,
                    sound,
                    data,
                    no_content_available,
                    dry_run,
                };
                SendHandler::new(&self.context).handle_send(args).await
            }
            Commands::Clients => self.handle_clients(),
            Commands::Config { action } => ConfigHandler::new(&self.context).handle_config(action),
        }
    }

    /// List registered clients with the protocol each will use
    fn handle_clients(&self) -> Result<()> {
        let registry = self.context.registry()?;
        debug!("Listing {} configured clients", registry.len());

        if registry.is_empty() {
            println!(
                "No clients configured in {}",
                self.context.config_manager.config_path().display()
            );
            return Ok(());
        }

        for client in registry.clients() {
            println!("{}\t{}", client.name(), client.mode()?);
        }
        Ok(())
    }
}
