//! Represents a logical bucket: a flat namespace of object keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A bucket in the local object store.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Bucket {
    /// Internal identifier used by object rows.
    pub id: Uuid,

    /// Bucket name as used in event records and URLs.
    pub name: String,

    /// When this bucket was created.
    pub created_at: DateTime<Utc>,
}
