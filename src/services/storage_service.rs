//! src/services/storage_service.rs
//!
//! StorageService: the local object store the expander reads archives from
//! and writes entries back to. Metadata lives in SQLite, payloads on disk
//! under `base_path/{bucket}/{shard}/{shard}/{md5(bucket/key)}`. Keys are
//! flat strings, so `images/` and `images/logo.png` never collide on disk.

use crate::{
    models::{bucket::Bucket, object::Object},
    services::object_store::{ByteStream, ObjectStore, StorageError, StorageResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut, stream};
use md5::Context;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;
/// Top-level paths served by the router itself.
const RESERVED_BUCKET_NAMES: [&str; 3] = ["events", "healthz", "readyz"];

/// StorageService provides the object operations the expander and the HTTP
/// surface need:
/// - create a bucket
/// - upload an object (stream to disk, upsert metadata)
/// - read, list and delete objects
#[derive(Clone)]
pub struct StorageService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,
}

/// Open (and create if missing) the SQLite database behind `database_url`.
pub async fn connect_sqlite(database_url: &str) -> StorageResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            debug!("created database directory {}", parent.display());
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

impl StorageService {
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Apply the embedded schema. Every statement is idempotent.
    pub async fn migrate(&self) -> StorageResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        debug!("running {} schema statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Reject keys that cannot be stored safely.
    ///
    /// Entry names inside archives are untrusted, so absolute paths, `..`
    /// segments and control characters are refused here rather than at the
    /// call sites.
    fn ensure_key_safe(&self, key: &str) -> StorageResult<()> {
        let invalid = key.is_empty()
            || key.len() > MAX_OBJECT_KEY_LEN
            || key.starts_with('/')
            || key.split('/').any(|segment| segment == "..")
            || key
                .chars()
                .any(|c| c.is_control() || c == '\\');
        if invalid {
            return Err(StorageError::InvalidObjectKey(key.to_string()));
        }
        Ok(())
    }

    /// Bucket names: 3-63 chars of lowercase letters, digits, dots and
    /// hyphens, starting and ending with a letter or digit.
    fn ensure_bucket_name_safe(&self, name: &str) -> StorageResult<()> {
        let invalid = |reason: &str| StorageError::InvalidBucketName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.len() < BUCKET_NAME_MIN_LEN || name.len() > BUCKET_NAME_MAX_LEN {
            return Err(invalid("must be between 3 and 63 characters"));
        }
        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return Err(invalid(
                "allowed characters are lowercase letters, digits, dots, and hyphens",
            ));
        }
        let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
        if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
            return Err(invalid("must start and end with a lowercase letter or digit"));
        }
        if name.contains("..") {
            return Err(invalid("cannot contain consecutive dots"));
        }
        if RESERVED_BUCKET_NAMES.contains(&name) {
            return Err(invalid("name is reserved"));
        }
        Ok(())
    }

    fn bucket_root(&self, bucket_name: &str) -> PathBuf {
        self.base_path.join(bucket_name)
    }

    /// Payload path: `{bucket}/{d[0]}/{d[1]}/{d}` with `d = md5(bucket/key)`.
    fn object_path(&self, bucket_name: &str, key: &str) -> PathBuf {
        let digest = md5::compute(format!("{}/{}", bucket_name, key));
        let mut path = self.bucket_root(bucket_name);
        path.push(format!("{:02x}", digest[0]));
        path.push(format!("{:02x}", digest[1]));
        path.push(format!("{:x}", digest));
        path
    }

    async fn fetch_bucket(&self, bucket: &str) -> StorageResult<Bucket> {
        self.ensure_bucket_name_safe(bucket)?;
        sqlx::query_as::<_, Bucket>("SELECT id, name, created_at FROM buckets WHERE name = ?")
            .bind(bucket)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => StorageError::BucketNotFound(bucket.to_string()),
                other => StorageError::Sqlx(other),
            })
    }

    async fn fetch_object(&self, bucket: &Bucket, key: &str) -> StorageResult<Object> {
        sqlx::query_as::<_, Object>(
            "SELECT id, bucket_id, key, filename, content_type, size_bytes, etag, last_modified
             FROM objects
             WHERE key = ? AND bucket_id = ?",
        )
        .bind(key)
        .bind(bucket.id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StorageError::ObjectNotFound {
                bucket: bucket.name.clone(),
                key: key.to_string(),
            },
            other => StorageError::Sqlx(other),
        })
    }

    /// Create a bucket and its directory. Fails if the name is taken.
    pub async fn create_bucket(&self, name: &str) -> StorageResult<Bucket> {
        self.ensure_bucket_name_safe(name)?;
        fs::create_dir_all(self.bucket_root(name)).await?;

        let bucket = Bucket {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        match sqlx::query("INSERT INTO buckets (id, name, created_at) VALUES (?, ?, ?)")
            .bind(bucket.id)
            .bind(&bucket.name)
            .bind(bucket.created_at)
            .execute(&*self.db)
            .await
        {
            Ok(_) => Ok(bucket),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::BucketAlreadyExists(name.to_string()))
            }
            Err(err) => Err(StorageError::Sqlx(err)),
        }
    }

    /// Stream-upload an object to disk and upsert its metadata.
    ///
    /// Bytes go to a temp file next to the final location, are fsynced, then
    /// renamed into place. Size and MD5 etag are computed while streaming.
    /// Temp files are removed on every error path.
    pub async fn upload_object_stream<S>(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
        stream: S,
    ) -> StorageResult<Object>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        self.ensure_key_safe(key)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;

        let file_path = self.object_path(&bucket_rec.name, key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Io(io::Error::other("object path missing parent directory"))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StorageError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }

        let filename = key.rsplit('/').next().unwrap_or(key).to_string();
        let etag = format!("{:x}", digest.compute());

        let inserted = sqlx::query_as::<_, Object>(
            r#"
            INSERT INTO objects (
                id, bucket_id, key, filename, content_type, size_bytes, etag, last_modified
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(bucket_id, key) DO UPDATE SET
                filename = excluded.filename,
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                last_modified = excluded.last_modified
            RETURNING id, bucket_id, key, filename, content_type, size_bytes, etag, last_modified
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(bucket_rec.id)
        .bind(key)
        .bind(&filename)
        .bind(content_type)
        .bind(size_bytes)
        .bind(&etag)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(obj) => {
                debug!("stored {}/{} ({} bytes)", bucket, key, size_bytes);
                Ok(obj)
            }
            Err(err) => {
                let _ = fs::remove_file(&file_path).await;
                Err(StorageError::Sqlx(err))
            }
        }
    }

    /// Metadata plus an open file handle for streaming the payload out.
    pub async fn get_object_reader(
        &self,
        bucket: &str,
        key: &str,
    ) -> StorageResult<(Object, File)> {
        self.ensure_key_safe(key)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let object = self.fetch_object(&bucket_rec, key).await?;

        let file_path = self.object_path(&bucket_rec.name, key);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            } else {
                StorageError::Io(err)
            }
        })?;

        Ok((object, file))
    }

    pub async fn get_object_metadata(&self, bucket: &str, key: &str) -> StorageResult<Object> {
        self.ensure_key_safe(key)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        self.fetch_object(&bucket_rec, key).await
    }

    /// Objects whose key starts with `prefix`, in key order.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> StorageResult<Vec<Object>> {
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let rows = sqlx::query_as::<_, Object>(
            "SELECT id, bucket_id, key, filename, content_type, size_bytes, etag, last_modified
             FROM objects
             WHERE bucket_id = ? AND substr(key, 1, length(?)) = ?
             ORDER BY key ASC",
        )
        .bind(bucket_rec.id)
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Remove an object's metadata row and payload file.
    ///
    /// Returns ObjectNotFound if the key is not present.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> StorageResult<Object> {
        self.ensure_key_safe(key)?;
        let bucket_rec = self.fetch_bucket(bucket).await?;
        let object = self.fetch_object(&bucket_rec, key).await?;

        let result = sqlx::query("DELETE FROM objects WHERE key = ? AND bucket_id = ?")
            .bind(key)
            .bind(bucket_rec.id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        let file_path = self.object_path(&bucket_rec.name, key);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed physical file {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            let bucket_root = self.bucket_root(&bucket_rec.name);
            self.prune_empty_dirs(parent, &bucket_root).await;
        }

        Ok(object)
    }

    /// Remove empty shard directories up to (not including) the bucket root.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => match current.parent() {
                    Some(parent) => current = parent.to_path_buf(),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn get_stream(&self, bucket: &str, key: &str) -> StorageResult<ByteStream> {
        let (_meta, file) = self.get_object_reader(bucket, key).await?;
        Ok(Box::pin(ReaderStream::new(file).map(|chunk| chunk.map_err(StorageError::Io))))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        self.upload_object_stream(
            bucket,
            key,
            Some(content_type.to_string()),
            stream::once(async move { Ok(data) }),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.delete_object(bucket, key).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "local-sqlite"
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
