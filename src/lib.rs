//! fcm-push
//!
//! A configuration-driven Firebase Cloud Messaging client. Named clients are
//! registered with their credentials; each client speaks either the legacy
//! server-key protocol or the HTTP v1 protocol depending on which
//! credentials are complete, shapes the payload accordingly, and returns a
//! uniform [`PushResponse`].

mod blank;

pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod payload;
pub mod registry;
pub mod response;
pub mod transport;

// Re-export commonly used types for convenience
pub use client::{ClientConfig, Mode, PushClient};
pub use config::{Config, ConfigManager};
pub use credentials::{CredentialBlob, Credentials};
pub use errors::{AppError, AppResult};
pub use payload::NotificationRequest;
pub use registry::{configure, ClientRegistry, Configurator};
pub use response::PushResponse;
