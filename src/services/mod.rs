//! Core services: the archive expander, its helpers, and the local object store.

pub mod expander;
pub mod mime;
pub mod object_key;
pub mod object_store;
pub mod storage_service;
