//! ArchiveExpander: turns an uploaded zip archive into individual objects.
//!
//! For every record of a notification event the expander decodes the key,
//! checks for a `.zip` extension, streams the archive out of the store,
//! writes each entry back under its own name with a content type derived from
//! the entry's extension, and finally deletes the archive.
//!
//! Archives are read forward-only. When an entry defers its sizes to a
//! trailing data descriptor the archive is buffered and read again through
//! its central directory.
//!
//! Records and entries are handled strictly in order, one at a time. There is
//! no rollback: a failure part-way through leaves the entries written so far
//! in place and the archive undeleted.

use crate::{
    models::event::NotificationEvent,
    services::{
        mime::content_type_for,
        object_key::{ARCHIVE_EXTENSION, KeyDecodeError, decode_object_key, key_extension},
        object_store::{ObjectStore, StorageError},
    },
};
use bytes::Bytes;
use futures::StreamExt;
use std::{fmt, io, io::Read, sync::Arc};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{debug, info, warn};
use zip::{ZipArchive, read::read_zipfile_from_stream, result::ZipError};

const END_OF_CENTRAL_DIRECTORY_SIGNATURE: [u8; 4] = *b"PK\x05\x06";

/// What to do with a record that is not a zip archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Stop the whole event at the first unsupported record and return the
    /// empty status. Later records are left unprocessed.
    #[default]
    AbortEvent,
    /// Skip only the unsupported record and continue with the next one.
    SkipRecord,
}

/// Result code of one `handle` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleStatus {
    /// Every record was processed (`"Ok"`).
    Completed,
    /// Processing stopped at an unsupported record (`""`).
    Stopped,
}

impl HandleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleStatus::Completed => "Ok",
            HandleStatus::Stopped => "",
        }
    }
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("cannot decode object key `{key}`: {source}")]
    Decoding {
        key: String,
        source: KeyDecodeError,
    },
    #[error("reading archive {bucket}/{key}: {source}")]
    StoreRead {
        bucket: String,
        key: String,
        source: StorageError,
    },
    #[error("writing extracted object {bucket}/{key}: {source}")]
    StoreWrite {
        bucket: String,
        key: String,
        source: StorageError,
    },
    #[error("deleting archive {bucket}/{key}: {source}")]
    StoreDelete {
        bucket: String,
        key: String,
        source: StorageError,
    },
    #[error("decoding archive {bucket}/{key}: {source}")]
    Archive {
        bucket: String,
        key: String,
        source: ZipError,
    },
    #[error("extraction task failed: {0}")]
    Worker(String),
}

pub struct ArchiveExpander {
    store: Arc<dyn ObjectStore>,
    skip_policy: SkipPolicy,
}

impl ArchiveExpander {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            skip_policy: SkipPolicy::default(),
        }
    }

    pub fn with_skip_policy(mut self, skip_policy: SkipPolicy) -> Self {
        self.skip_policy = skip_policy;
        self
    }

    /// Process every record of `event` in order.
    ///
    /// Returns `Completed` when the record loop ran to the end and `Stopped`
    /// when an unsupported record ended it early under
    /// `SkipPolicy::AbortEvent`. Any store or archive failure is returned
    /// as-is; nothing is retried or rolled back.
    pub async fn handle(&self, event: &NotificationEvent) -> Result<HandleStatus, ExpandError> {
        for (index, record) in event.records.iter().enumerate() {
            let bucket = record.bucket_name();
            let key = decode_object_key(record.encoded_key()).map_err(|source| {
                ExpandError::Decoding {
                    key: record.encoded_key().to_string(),
                    source,
                }
            })?;

            let supported = match key_extension(&key) {
                None => {
                    info!("Unable to detect file type for key {}", key);
                    false
                }
                Some(extension) if extension != ARCHIVE_EXTENSION => {
                    info!(
                        "Skipping non-zip file {} with extension {}",
                        key, extension
                    );
                    false
                }
                Some(_) => true,
            };

            if !supported {
                match self.skip_policy {
                    SkipPolicy::AbortEvent => {
                        warn!(
                            "Stopping event at record {} ({}/{}); {} later record(s) left unprocessed",
                            index,
                            bucket,
                            key,
                            event.records.len() - index - 1
                        );
                        return Ok(HandleStatus::Stopped);
                    }
                    SkipPolicy::SkipRecord => continue,
                }
            }

            info!(
                "Extracting zip file {}/{} from {}",
                bucket,
                key,
                self.store.backend_name()
            );
            let extracted = self.expand_archive(bucket, &key).await?;

            self.store
                .delete(bucket, &key)
                .await
                .map_err(|source| ExpandError::StoreDelete {
                    bucket: bucket.to_string(),
                    key: key.clone(),
                    source,
                })?;
            info!(
                "Deleted zip file {}/{} after extracting {} file(s)",
                bucket, key, extracted
            );
        }

        Ok(HandleStatus::Completed)
    }

    /// Stream the archive out of the store and write back each entry.
    ///
    /// The zip decoder is synchronous, so the work runs on a blocking thread
    /// that reads through a bridge over the store's async byte stream and
    /// waits for each write before decoding the next entry.
    async fn expand_archive(&self, bucket: &str, key: &str) -> Result<usize, ExpandError> {
        let stream = self
            .store
            .get_stream(bucket, key)
            .await
            .map_err(|source| read_error(bucket, key, source))?;
        let reader = SyncIoBridge::new(StreamReader::new(
            stream.map(|chunk| chunk.map_err(io::Error::other)),
        ));

        let store = Arc::clone(&self.store);
        let runtime = Handle::current();
        let bucket = bucket.to_string();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<usize, ExpandError> {
            let mut extraction = Extraction {
                runtime: &runtime,
                store: store.as_ref(),
                bucket: &bucket,
                key: &key,
                written: Vec::new(),
            };
            extraction.run(reader)?;
            Ok(extraction.written.len())
        })
        .await
        .map_err(|err| ExpandError::Worker(err.to_string()))?
    }
}

/// One archive being expanded on a blocking thread.
struct Extraction<'a> {
    runtime: &'a Handle,
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    key: &'a str,
    /// Entry names written so far, in archive order.
    written: Vec<String>,
}

impl Extraction<'_> {
    fn run<R: Read>(&mut self, mut reader: R) -> Result<(), ExpandError> {
        // An archive without entries starts directly with the end-of-central-
        // directory record, which the entry reader rejects as a bad header.
        // A stream too short to hold a signature has no entries either.
        let mut signature = [0u8; 4];
        match reader.read_exact(&mut signature) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("Archive {}/{} is empty", self.bucket, self.key);
                return Ok(());
            }
            Err(err) => return Err(self.archive_error(ZipError::Io(err))),
        }
        if signature == END_OF_CENTRAL_DIRECTORY_SIGNATURE {
            debug!("Archive {}/{} has no entries", self.bucket, self.key);
            return Ok(());
        }
        let mut reader = io::Cursor::new(signature).chain(reader);

        loop {
            let next = match read_zipfile_from_stream(&mut reader) {
                Ok(next) => next,
                // Entries whose sizes follow the data in a descriptor cannot
                // be delimited from the local header alone.
                Err(ZipError::UnsupportedArchive(reason)) => {
                    info!(
                        "Reading {}/{} through its central directory after {} entries: {}",
                        self.bucket,
                        self.key,
                        self.written.len(),
                        reason
                    );
                    return self.run_from_central_directory();
                }
                Err(err) => return Err(self.archive_error(err)),
            };
            let Some(mut entry) = next else {
                return Ok(());
            };
            let name = entry.name().to_string();
            let (compressed, size) = (entry.compressed_size(), entry.size());
            self.write_entry(name, compressed, size, &mut entry)?;
        }
    }

    /// Buffer the whole archive and read it through `ZipArchive`, skipping
    /// the leading entries the forward-only pass already wrote.
    fn run_from_central_directory(&mut self) -> Result<(), ExpandError> {
        let content = self
            .runtime
            .block_on(read_to_vec(self.store, self.bucket, self.key))?;
        let mut archive = ZipArchive::new(io::Cursor::new(content))
            .map_err(|err| self.archive_error(err))?;

        let already_written = std::mem::take(&mut self.written);
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|err| self.archive_error(err))?;
            let name = entry.name().to_string();
            if already_written.get(index) == Some(&name) {
                self.written.push(name);
                continue;
            }
            let (compressed, size) = (entry.compressed_size(), entry.size());
            self.write_entry(name, compressed, size, &mut entry)?;
        }
        Ok(())
    }

    fn write_entry(
        &mut self,
        name: String,
        compressed: u64,
        size: u64,
        entry: &mut dyn Read,
    ) -> Result<(), ExpandError> {
        info!(
            "Extracting {}, compressed: {} bytes, extracted: {} bytes",
            name, compressed, size
        );

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|err| self.archive_error(ZipError::Io(err)))?;

        let content_type = content_type_for(&name);
        self.runtime
            .block_on(
                self.store
                    .put(self.bucket, &name, Bytes::from(content), content_type),
            )
            .map_err(|source| ExpandError::StoreWrite {
                bucket: self.bucket.to_string(),
                key: name.clone(),
                source,
            })?;
        debug!("Uploaded {}/{} as {}", self.bucket, name, content_type);
        self.written.push(name);
        Ok(())
    }

    fn archive_error(&self, err: ZipError) -> ExpandError {
        archive_error(self.bucket, self.key, err)
    }
}

async fn read_to_vec(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>, ExpandError> {
    let mut stream = store
        .get_stream(bucket, key)
        .await
        .map_err(|source| read_error(bucket, key, source))?;
    let mut content = Vec::new();
    while let Some(chunk) = stream.next().await {
        content.extend_from_slice(&chunk.map_err(|source| read_error(bucket, key, source))?);
    }
    Ok(content)
}

fn read_error(bucket: &str, key: &str, source: StorageError) -> ExpandError {
    ExpandError::StoreRead {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    }
}

/// Failures of the underlying store stream surface through the zip reader as
/// I/O errors; unwrap those back into read errors so callers can tell a
/// broken archive from a broken store.
fn archive_error(bucket: &str, key: &str, err: ZipError) -> ExpandError {
    match err {
        ZipError::Io(io_err)
            if io_err
                .get_ref()
                .is_some_and(|inner| inner.is::<StorageError>()) =>
        {
            let source = io_err
                .into_inner()
                .and_then(|inner| inner.downcast::<StorageError>().ok())
                .map(|boxed| *boxed)
                .unwrap_or_else(|| StorageError::Backend("archive stream failed".into()));
            read_error(bucket, key, source)
        }
        other => ExpandError::Archive {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_the_invocation_contract() {
        assert_eq!(HandleStatus::Completed.to_string(), "Ok");
        assert_eq!(HandleStatus::Stopped.to_string(), "");
    }

    #[test]
    fn default_policy_aborts_the_event() {
        assert_eq!(SkipPolicy::default(), SkipPolicy::AbortEvent);
    }

    #[test]
    fn stream_failures_map_back_to_read_errors() {
        let io_err = io::Error::other(StorageError::Backend("connection reset".into()));
        let err = archive_error("b", "a.zip", ZipError::Io(io_err));
        assert!(matches!(
            err,
            ExpandError::StoreRead {
                source: StorageError::Backend(_),
                ..
            }
        ));

        let err = archive_error("b", "a.zip", ZipError::InvalidArchive("bad header".into()));
        assert!(matches!(err, ExpandError::Archive { .. }));
    }
}
