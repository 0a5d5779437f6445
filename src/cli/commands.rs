//! Command definitions and structures for the CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "fcm-push")]
#[command(about = "Send push notifications through Firebase Cloud Messaging")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, env = "FCM_PUSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send a notification to one device
    Send {
        /// Name of the configured client
        #[arg(short, long, default_value = "default")]
        client: String,

        /// Recipient registration token
        #[arg(short, long)]
        token: String,

        /// Notification title
        #[arg(long)]
        title: Option<String>,

        /// Notification body
        #[arg(long)]
        body: Option<String>,

        /// Sound to play on receipt
        #[arg(long)]
        sound: Option<String>,

        /// Custom data as a JSON object
        #[arg(short, long)]
        data: Option<String>,

        /// Do not ask Apple devices to wake the app
        #[arg(long)]
        no_content_available: bool,

        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// List configured clients and the protocol each one uses
    Clients,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,
}
