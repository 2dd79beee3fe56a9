//! SQLite-backed store rooted in a temporary directory.

use archive_expander::services::storage_service::{StorageService, connect_sqlite};
use std::sync::Arc;
use tempfile::TempDir;

#[allow(dead_code)]
pub struct TestStorage {
    pub service: StorageService,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStorage {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_url = format!("sqlite://{}", temp_dir.path().join("meta/store.db").display());
        let pool = connect_sqlite(&db_url)
            .await
            .expect("Failed to open SQLite database");

        let service = StorageService::new(Arc::new(pool), temp_dir.path().join("objects"));
        service.migrate().await.expect("Failed to apply schema");

        Self {
            service,
            _temp_dir: temp_dir,
        }
    }

    /// Store with one bucket already created.
    pub async fn with_bucket(bucket: &str) -> Self {
        let storage = Self::new().await;
        storage
            .service
            .create_bucket(bucket)
            .await
            .expect("Failed to create bucket");
        storage
    }
}
