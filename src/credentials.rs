//! Service account credential material for the HTTP v1 protocol.
//!
//! Credentials can be configured either as a path to a file on disk or as an
//! in-memory blob. Blobs are resolved lazily into a [`ResolvedCredential`]
//! holding the raw bytes and a logical filename; the resolution is memoized
//! until the material is reassigned. Nothing here touches the filesystem:
//! path-based credentials are only read by the transport when it sends.

use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::blank::Blank;
use crate::errors::{AppError, AppResult};

/// Logical filename given to credentials resolved from an in-memory blob
pub const CREDENTIALS_FILENAME: &str = "creds.json";

/// In-memory credential material
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialBlob {
    /// The literal contents of a service account file
    Text(String),
    /// A structured service account document, serialized to JSON on resolution
    Json(Value),
    /// Opaque bytes, passed through unchanged
    Bytes(Vec<u8>),
}

impl CredentialBlob {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.is_blank(),
            Self::Json(Value::Null) => true,
            Self::Json(Value::Object(map)) => map.is_empty(),
            Self::Json(Value::Array(items)) => items.is_empty(),
            Self::Json(Value::String(text)) => text.is_blank(),
            Self::Json(_) => false,
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }

    fn to_bytes(&self) -> AppResult<Vec<u8>> {
        Ok(match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Json(value) => serde_json::to_vec(value)?,
            Self::Bytes(bytes) => bytes.clone(),
        })
    }
}

impl From<&str> for CredentialBlob {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for CredentialBlob {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for CredentialBlob {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Credential material ready to hand to a transport
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    Path(PathBuf),
    InMemory { bytes: Arc<[u8]>, filename: String },
}

impl ResolvedCredential {
    /// The filename a transport should report for this credential
    pub fn filename(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::InMemory { filename, .. } => filename.clone(),
        }
    }

    /// Read the credential bytes. Path-based credentials are read from disk here.
    pub async fn read(&self) -> AppResult<Vec<u8>> {
        match self {
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| AppError::io_with_source(path, "read credentials file", e)),
            Self::InMemory { bytes, .. } => Ok(bytes.to_vec()),
        }
    }
}

// Keeps key material out of logs.
impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::InMemory { bytes, filename } => f
                .debug_struct("InMemory")
                .field("filename", filename)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// Configured credential material with memoized resolution
#[derive(Clone, Default)]
pub struct Credentials {
    path: Option<PathBuf>,
    blob: Option<CredentialBlob>,
    resolved: OnceCell<Option<ResolvedCredential>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("path", &self.path)
            .field("has_blob", &self.blob.is_some())
            .finish()
    }
}

impl Credentials {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_blob(blob: impl Into<CredentialBlob>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Default::default()
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn blob(&self) -> Option<&CredentialBlob> {
        self.blob.as_ref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
        self.resolved = OnceCell::new();
    }

    pub fn set_blob(&mut self, blob: Option<CredentialBlob>) {
        self.blob = blob;
        self.resolved = OnceCell::new();
    }

    /// Resolve to a transport-ready credential.
    ///
    /// A non-empty path always wins over a blob. Returns `None` when neither a
    /// path nor a non-blank blob is configured.
    pub fn resolve(&self) -> AppResult<Option<&ResolvedCredential>> {
        let resolved = self.resolved.get_or_try_init(|| -> AppResult<_> {
            if let Some(path) = self.path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
                return Ok(Some(ResolvedCredential::Path(path.clone())));
            }

            match self.blob.as_ref().filter(|blob| !blob.is_blank()) {
                Some(blob) => Ok(Some(ResolvedCredential::InMemory {
                    bytes: Arc::from(blob.to_bytes()?),
                    filename: CREDENTIALS_FILENAME.to_string(),
                })),
                None => Ok(None),
            }
        })?;

        Ok(resolved.as_ref())
    }

    /// True when resolution yields usable credential material
    pub fn is_resolvable(&self) -> bool {
        matches!(self.resolve(), Ok(Some(_)))
    }
}
