//! In-memory object store with call counters and failure injection.

use archive_expander::services::object_store::{
    ByteStream, ObjectStore, StorageError, StorageResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    fail_put_key: Mutex<Option<String>>,
    fail_deletes: AtomicBool,
    /// Split payloads into chunks of this size on read (0 = one chunk).
    chunk_size: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    writes_log: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a write.
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: data.into(),
                content_type: "application/zip".to_string(),
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.get(bucket, key).is_some()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make every `put` of `key` fail.
    pub fn fail_put_on(&self, key: &str) {
        *self.fail_put_key.lock().unwrap() = Some(key.to_string());
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn read_in_chunks_of(&self, size: usize) {
        self.chunk_size.store(size, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Keys in the order they were written.
    pub fn write_order(&self) -> Vec<String> {
        self.writes_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        let object = self.get(bucket, key).ok_or_else(|| StorageError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        let chunk_size = self.chunk_size.load(Ordering::SeqCst);
        let chunks: Vec<StorageResult<Bytes>> = if chunk_size == 0 {
            vec![Ok(object.data)]
        } else {
            object
                .data
                .chunks(chunk_size)
                .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                .collect()
        };
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_put_key.lock().unwrap().as_deref() == Some(key) {
            return Err(StorageError::Backend(format!("injected write failure for {}", key)));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.writes_log.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected delete failure".to_string()));
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
