//! Data models for the archive expander.
//!
//! `event` holds the notification payload consumed by the expander; `bucket`
//! and `object` map to the local store's SQLite tables via `sqlx::FromRow`.

pub mod bucket;
pub mod event;
pub mod object;
