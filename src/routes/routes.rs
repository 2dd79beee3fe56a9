//! Defines the HTTP surface.
//!
//! - `GET    /healthz`, `GET /readyz` — probes
//! - `POST   /events` — notification webhook feeding the expander
//! - `PUT    /{bucket}` — create bucket; `GET /{bucket}` — list objects
//! - `PUT    /{bucket}/{*key}` — upload object
//! - `GET    /{bucket}/{*key}` — download object
//! - `DELETE /{bucket}/{*key}` — delete object
//!
//! The wildcard `*key` allows nested keys like `images/logo.png`.

use crate::{
    handlers::{
        event_handlers::receive_event,
        health_handlers::{healthz, readyz},
        object_handlers::{create_bucket, delete_object, get_object, list_objects, upload_object},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/events", post(receive_event))
        .route(
            "/{bucket}/{*key}",
            put(upload_object).get(get_object).delete(delete_object),
        )
        .route("/{bucket}", get(list_objects).put(create_bucket))
}
