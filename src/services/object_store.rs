//! Object store capability used by the archive expander.
//!
//! The expander only needs three operations: open a byte stream on an
//! object, write a whole object with a content type, and delete an object.
//! `StorageService` implements this trait for the local SQLite + disk store;
//! tests plug in in-memory stores.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::{io, pin::Pin};
use thiserror::Error;

/// A boxed stream of object payload chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{0}` not found")]
    BucketNotFound(String),
    #[error("bucket `{0}` already exists")]
    BucketAlreadyExists(String),
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("object `{key}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, key: String },
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Open a forward-only byte stream over an object's payload.
    async fn get_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream>;

    /// Write a whole object, replacing any existing object with the same key.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Remove an object.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    /// Short identifier of the backend, used in logs.
    fn backend_name(&self) -> &'static str;
}
