//! Notification sending handler

use super::super::CliContext;
use anyhow::{bail, Context, Result};
use fcm_push::NotificationRequest;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// Arguments of the `send` command
pub struct SendArgs {
    pub client: String,
    pub token: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub sound: Option<String>,
    pub data: Option<String>,
    pub no_content_available: bool,
    pub dry_run: bool,
}

/// Handler for the `send` command
pub struct SendHandler<'a> {
    context: &'a CliContext,
}

impl<'a> SendHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_send(&self, args: SendArgs) -> Result<()> {
        let registry = self.context.registry()?;
        let Some(client) = registry.client(&args.client) else {
            bail!(
                "Unknown client '{}'. Configured clients: {}",
                args.client,
                registry.names().collect::<Vec<_>>().join(", ")
            );
        };

        let request = build_request(&args)?;

        if args.dry_run {
            let (mode, payload) = client.preview(&request)?;
            println!("Dry run - would send notification:");
            println!("Client: {}", client.name());
            println!("Mode: {mode}");
            println!("Payload: {}", serde_json::to_string_pretty(&payload)?);
            return Ok(());
        }

        debug!("Sending notification via client '{}'", client.name());
        let response = client.push(&request).await?;
        info!(success = response.success(), status = response.status(), "Push finished");

        println!("{}", serde_json::to_string_pretty(&response)?);
        if !response.success() {
            bail!("Push rejected with status {}", response.status());
        }
        Ok(())
    }
}

fn build_request(args: &SendArgs) -> Result<NotificationRequest> {
    let mut request = NotificationRequest::new(args.token.as_str());

    if let Some(raw) = &args.data {
        request = request.with_data(parse_data(raw)?);
    }
    if let Some(title) = &args.title {
        request = request.with_title(title.as_str());
    }
    if let Some(body) = &args.body {
        request = request.with_body(body.as_str());
    }
    if let Some(sound) = &args.sound {
        request = request.with_sound(sound.as_str());
    }
    if args.no_content_available {
        request = request.with_content_available(None);
    }

    Ok(request)
}

fn parse_data(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("Failed to parse --data as JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {}", json!(other)),
    }
}
