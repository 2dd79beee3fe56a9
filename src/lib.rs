//! archive-expander: expands zip archives dropped into an object store into
//! individual objects, then deletes the archive.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
