//! HTTP handlers for the local object store.
//! Streams object bodies to avoid buffering in memory and delegates storage
//! concerns to `StorageService`.

use crate::{
    errors::AppError,
    models::{
        event::{NotificationEvent, ObjectRecord},
        object::Object,
    },
    services::object_key::is_archive_key,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::{io, sync::Arc};
use tokio_util::io::ReaderStream;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    pub prefix: Option<String>,
}

/// `PUT /{bucket}/{*key}` — upload an object.
///
/// With `notify_on_upload` set, a successful upload of a `.zip` key is
/// followed by an object-created notification handed to the expander on a
/// background task, so the response does not wait for extraction.
pub async fn upload_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(io::Error::other));

    let object = state
        .storage
        .upload_object_stream(&bucket, &key, content_type, stream)
        .await?;

    if state.notify_on_upload && is_archive_key(&key) {
        notify_created(&state, &bucket, &object);
    }

    let mut response = Response::new(Body::empty());
    if let Some(etag) = object.etag.as_deref() {
        if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
            response.headers_mut().insert(header::ETAG, value);
        }
    }
    Ok(response)
}

fn notify_created(state: &AppState, bucket: &str, object: &Object) {
    let event = NotificationEvent::new(vec![ObjectRecord::object_created(
        bucket,
        &object.key,
        u64::try_from(object.size_bytes).ok(),
    )]);
    let expander = Arc::clone(&state.expander);
    let target = format!("{}/{}", bucket, object.key);

    tokio::spawn(async move {
        match expander.handle(&event).await {
            Ok(status) => info!("upload notification for {} finished: {:?}", target, status),
            Err(err) => error!("upload notification for {} failed: {}", target, err),
        }
    });
}

/// `GET /{bucket}/{*key}` — download an object as a streaming response.
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (meta, file) = state.storage.get_object_reader(&bucket, &key).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    set_object_headers(response.headers_mut(), &meta);
    Ok(response)
}

/// `DELETE /{bucket}/{*key}`
pub async fn delete_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_object(&bucket, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /{bucket}?prefix=` — list object metadata as JSON, ordered by key.
pub async fn list_objects(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Query(q): Query<ListObjectsQuery>,
) -> Result<Json<Vec<Object>>, AppError> {
    let prefix = q.prefix.unwrap_or_default();
    let objects = state.storage.list_objects(&bucket, &prefix).await?;
    Ok(Json(objects))
}

/// `PUT /{bucket}` — create a bucket.
pub async fn create_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.storage.create_bucket(&bucket).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

fn set_object_headers(headers: &mut HeaderMap, meta: &Object) {
    let content_type = meta
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from(meta.size_bytes.max(0) as u64),
    );

    if let Some(etag) = meta.etag.as_ref() {
        if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
            headers.insert(header::ETAG, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&meta.last_modified.to_rfc2822()) {
        headers.insert(header::LAST_MODIFIED, value);
    }
}
