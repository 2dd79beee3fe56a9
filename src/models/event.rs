//! Object-created notifications in the S3 event JSON shape.
//!
//! ```json
//! {"Records":[{"eventName":"ObjectCreated:Put",
//!              "s3":{"bucket":{"name":"site"},"object":{"key":"build+v1.zip","size":1024}}}]}
//! ```
//!
//! Object keys arrive URL-encoded (`+` for space, percent escapes for the
//! rest) and must go through `services::object_key::decode_object_key`
//! before they are used against the store.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Characters S3 leaves untouched when it encodes keys into event records.
const EVENT_KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'*')
    .remove(b'/');

pub const OBJECT_CREATED_PUT: &str = "ObjectCreated:Put";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("reading event file {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("parsing notification event: {0}")]
    Json(#[from] serde_json::Error),
}

/// An ordered batch of object records delivered by the event source.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NotificationEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectRecord>,
}

/// One record of a notification: which object in which bucket.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ObjectEntity {
    /// URL-encoded object key.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl NotificationEvent {
    pub fn new(records: Vec<ObjectRecord>) -> Self {
        Self { records }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, EventError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load an event from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| EventError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_slice(&bytes)
    }
}

impl ObjectRecord {
    /// Build an `ObjectCreated:Put` record for a plain (not yet encoded) key.
    pub fn object_created(bucket: &str, key: &str, size: Option<u64>) -> Self {
        Self {
            event_name: Some(OBJECT_CREATED_PUT.to_string()),
            s3: S3Entity {
                bucket: BucketEntity {
                    name: bucket.to_string(),
                },
                object: ObjectEntity {
                    key: encode_event_key(key),
                    size,
                },
            },
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.s3.bucket.name
    }

    /// The key exactly as delivered, still URL-encoded.
    pub fn encoded_key(&self) -> &str {
        &self.s3.object.key
    }
}

/// Encode a key the way S3 writes it into event records: spaces become `+`.
pub fn encode_event_key(key: &str) -> String {
    utf8_percent_encode(key, EVENT_KEY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}
