use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata supplied by the caller when an upload starts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<BTreeMap<String, String>>,
}

impl UploadMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn insert_custom_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }
}

/// Metadata describing a stored object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub bucket: String,
    pub name: String,
    pub full_path: String,
    pub size: u64,
    #[serde(default)]
    pub time_created: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Base64 SHA-256 digest of the object's bytes.
    #[serde(default)]
    pub content_hash: Option<String>,
    #[serde(default)]
    pub custom_metadata: Option<BTreeMap<String, String>>,
    /// Comma-separated list; the first token signs the public URL.
    #[serde(default)]
    pub download_tokens: Option<String>,
}

impl ObjectMetadata {
    pub fn time_created(&self) -> Option<DateTime<Utc>> {
        self.time_created
            .as_deref()
            .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
            .map(|value| value.with_timezone(&Utc))
    }

    pub fn first_download_token(&self) -> Option<&str> {
        self.download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|token| !token.is_empty()))
    }
}

pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn content_hash(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}
