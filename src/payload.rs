//! Notification requests and protocol-specific payload shaping
//!
//! Field reference for both protocols:
//!
//! | field               | legacy                 | HTTP v1                                          |
//! |---------------------|------------------------|--------------------------------------------------|
//! | `title`             | `notification.title`   | `message.notification.title`                     |
//! | `body`              | `notification.body`    | `message.notification.body`                      |
//! | `sound`             | `notification.sound`   | `message.android.sound`, `message.apns.payload.aps.sound` |
//! | `content_available` | `content_available`    | `message.apns.payload.aps.content-available`     |
//! | `data`              | `data`                 | `message.data` (string values only)              |
//!
//! When custom data is supplied, title, body and sound are also copied into
//! it so apps can read them from the data channel.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::blank::Blank;
use crate::client::Mode;
use crate::errors::{AppError, AppResult};

/// One notification to one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub token: String,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
    /// Wake flag for Apple devices. `None` is distinct from `Some(false)` on
    /// the legacy protocol, where only `None` disables it.
    #[serde(default = "default_content_available")]
    pub content_available: Option<bool>,
}

fn default_content_available() -> Option<bool> {
    Some(true)
}

impl NotificationRequest {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            data: None,
            title: None,
            body: None,
            sound: None,
            content_available: default_content_available(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    pub fn with_content_available(mut self, content_available: Option<bool>) -> Self {
        self.content_available = content_available;
        self
    }

    /// Reject requests that cannot produce a deliverable notification
    pub fn validate(&self) -> AppResult<()> {
        if self.token.is_blank() {
            return Err(AppError::NoToken);
        }
        if self.data.is_blank() && self.title.is_blank() && self.body.is_blank() {
            return Err(AppError::EmptyNotification);
        }
        Ok(())
    }
}

/// Notification fields with protocol-specific placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationField {
    Title,
    Body,
    Sound,
}

impl NotificationField {
    pub const ALL: [NotificationField; 3] = [Self::Title, Self::Body, Self::Sound];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Sound => "sound",
        }
    }

    fn value<'a>(&self, request: &'a NotificationRequest) -> Option<&'a str> {
        let value = match self {
            Self::Title => request.title.as_deref(),
            Self::Body => request.body.as_deref(),
            Self::Sound => request.sound.as_deref(),
        };
        value.filter(|v| v.is_present())
    }

    /// Place this field's value in the payload for the given protocol
    fn apply(&self, mode: Mode, payload: &mut Value, value: &str) {
        match (*self, mode) {
            (Self::Title, _) | (Self::Body, _) | (Self::Sound, Mode::Legacy) => {
                payload["notification"][self.key()] = json!(value);
            }
            (Self::Sound, Mode::Modern) => {
                payload["apns"]["payload"]["aps"]["sound"] = json!(value);
                payload["android"]["sound"] = json!(value);
            }
        }
    }
}

/// Build the wire payload for a request in the given mode
pub fn build(mode: Mode, request: &NotificationRequest) -> AppResult<Value> {
    let mut payload = base_payload(mode, request);

    if mode == Mode::Modern {
        payload["token"] = json!(request.token);
    }

    handle_data(&mut payload, request);
    handle_notification(mode, &mut payload, request);

    if mode == Mode::Modern {
        stringify_data(&mut payload)?;
    }

    debug!(%mode, "Built notification payload");
    Ok(payload)
}

fn base_payload(mode: Mode, request: &NotificationRequest) -> Value {
    let wake = if request.content_available == Some(true) { 1 } else { 0 };

    match mode {
        Mode::Legacy => json!({
            "content_available": request.content_available.is_some(),
        }),
        Mode::Modern => json!({
            "android": {
                "priority": "high",
            },
            "apns": {
                "payload": {
                    "aps": {
                        "content-available": wake,
                    },
                },
            },
        }),
    }
}

fn handle_data(payload: &mut Value, request: &NotificationRequest) {
    if let Some(data) = request.data.as_ref().filter(|data| data.is_present()) {
        payload["data"] = Value::Object(data.clone());
    }
}

fn handle_notification(mode: Mode, payload: &mut Value, request: &NotificationRequest) {
    if NotificationField::ALL.iter().any(|field| field.value(request).is_some()) {
        payload["notification"] = json!({});
    }

    for field in NotificationField::ALL {
        let Some(value) = field.value(request) else {
            continue;
        };

        field.apply(mode, payload, value);

        if let Some(data) = payload.get_mut("data").and_then(Value::as_object_mut) {
            data.insert(field.key().to_string(), json!(value));
        }
    }
}

/// HTTP v1 only accepts string values in `data`
fn stringify_data(payload: &mut Value) -> AppResult<()> {
    if let Some(data) = payload.get_mut("data").and_then(Value::as_object_mut) {
        for value in data.values_mut() {
            let text = match &*value {
                Value::Object(_) | Value::Array(_) => serde_json::to_string(&*value)?,
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            *value = Value::String(text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validate_requires_token() {
        let request = NotificationRequest::new("  ").with_title("Hi");
        assert!(matches!(request.validate(), Err(AppError::NoToken)));
    }

    #[test]
    fn test_validate_requires_content() {
        let request = NotificationRequest::new("t");
        assert!(matches!(request.validate(), Err(AppError::EmptyNotification)));

        // Sound alone is not content
        let request = NotificationRequest::new("t").with_sound("default").with_data(Map::new());
        assert!(matches!(request.validate(), Err(AppError::EmptyNotification)));

        let request = NotificationRequest::new("t").with_body("hello");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_legacy_title_without_data() {
        let request = NotificationRequest::new("t").with_title("Hi");
        let payload = build(Mode::Legacy, &request).unwrap();

        assert_eq!(payload["notification"]["title"], "Hi");
        assert!(payload.get("data").is_none());
        assert_eq!(payload["content_available"], json!(true));
    }

    #[test]
    fn test_legacy_mirrors_into_data() {
        let request = NotificationRequest::new("t")
            .with_data(data(json!({"k": "v"})))
            .with_title("Hi");
        let payload = build(Mode::Legacy, &request).unwrap();

        assert_eq!(payload["data"], json!({"k": "v", "title": "Hi"}));
        assert_eq!(payload["notification"]["title"], "Hi");
    }

    #[test]
    fn test_legacy_sound_in_notification() {
        let request = NotificationRequest::new("t")
            .with_data(data(json!({"count": 3})))
            .with_body("B")
            .with_sound("ping.caf");
        let payload = build(Mode::Legacy, &request).unwrap();

        assert_eq!(payload["notification"], json!({"body": "B", "sound": "ping.caf"}));
        // Legacy data keeps its original types
        assert_eq!(payload["data"], json!({"count": 3, "body": "B", "sound": "ping.caf"}));
    }

    #[test]
    fn test_legacy_content_available_only_disabled_by_none() {
        let request = NotificationRequest::new("t")
            .with_title("Hi")
            .with_content_available(Some(false));
        assert_eq!(build(Mode::Legacy, &request).unwrap()["content_available"], json!(true));

        let request = request.with_content_available(None);
        assert_eq!(build(Mode::Legacy, &request).unwrap()["content_available"], json!(false));
    }

    #[test]
    fn test_legacy_blank_fields_are_skipped() {
        let request = NotificationRequest::new("t")
            .with_data(data(json!({"k": "v"})))
            .with_title(" ");
        let payload = build(Mode::Legacy, &request).unwrap();

        assert!(payload.get("notification").is_none());
        assert_eq!(payload["data"], json!({"k": "v"}));
    }

    #[test]
    fn test_modern_shape() {
        let request = NotificationRequest::new("device")
            .with_title("Hi")
            .with_body("There")
            .with_sound("default");
        let payload = build(Mode::Modern, &request).unwrap();

        assert_eq!(
            payload,
            json!({
                "token": "device",
                "android": { "priority": "high", "sound": "default" },
                "apns": { "payload": { "aps": { "content-available": 1, "sound": "default" } } },
                "notification": { "title": "Hi", "body": "There" },
            })
        );
    }

    #[test]
    fn test_modern_content_available_flag() {
        let request = NotificationRequest::new("t").with_title("Hi");
        let payload = build(Mode::Modern, &request).unwrap();
        assert_eq!(payload["apns"]["payload"]["aps"]["content-available"], json!(1));

        let request = request.with_content_available(Some(false));
        let payload = build(Mode::Modern, &request).unwrap();
        assert_eq!(payload["apns"]["payload"]["aps"]["content-available"], json!(0));

        let request = request.with_content_available(None);
        let payload = build(Mode::Modern, &request).unwrap();
        assert_eq!(payload["apns"]["payload"]["aps"]["content-available"], json!(0));
    }

    #[test]
    fn test_modern_data_values_are_strings() {
        let request = NotificationRequest::new("t")
            .with_data(data(json!({
                "count": 42,
                "ratio": 1.5,
                "flag": true,
                "missing": null,
                "nested": {"a": [1, 2]},
                "list": ["x", "y"],
                "plain": "text",
            })))
            .with_sound("default");
        let payload = build(Mode::Modern, &request).unwrap();
        let data = payload["data"].as_object().unwrap();

        assert!(data.values().all(Value::is_string));
        assert_eq!(data["count"], "42");
        assert_eq!(data["ratio"], "1.5");
        assert_eq!(data["flag"], "true");
        assert_eq!(data["missing"], "");
        assert_eq!(data["nested"], r#"{"a":[1,2]}"#);
        assert_eq!(data["list"], r#"["x","y"]"#);
        assert_eq!(data["plain"], "text");
        assert_eq!(data["sound"], "default");
    }

    #[test]
    fn test_modern_sound_only_leaves_empty_notification() {
        let request = NotificationRequest::new("t")
            .with_data(data(json!({"k": "v"})))
            .with_sound("default");
        let payload = build(Mode::Modern, &request).unwrap();

        assert_eq!(payload["notification"], json!({}));
        assert_eq!(payload["android"]["sound"], "default");
    }

    #[test]
    fn test_modern_without_data_has_no_data_block() {
        let request = NotificationRequest::new("t").with_title("Hi");
        let payload = build(Mode::Modern, &request).unwrap();
        assert!(payload.get("data").is_none());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: NotificationRequest =
            serde_json::from_value(json!({"token": "t", "title": "Hi"})).unwrap();
        assert_eq!(request.content_available, Some(true));
        assert!(request.data.is_none());
    }
}
