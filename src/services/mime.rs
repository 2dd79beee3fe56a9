//! Content-type classification for extracted entries.

use std::{collections::HashMap, sync::LazyLock};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

static MIME_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("json", "application/json"),
        ("gif", "image/gif"),
        ("jpeg", "image/jpeg"),
        ("jpg", "image/jpeg"),
        ("png", "image/png"),
        ("svg", "image/svg+xml"),
        ("ico", "image/x-icon"),
        ("css", "text/css"),
        ("html", "text/html"),
        ("js", "text/javascript"),
        ("xml", "text/xml"),
        ("handlebars", "text/x-handlebars-template"),
    ])
});

/// Content type for an entry name, keyed by the extension of its last path
/// segment. Unknown or missing extensions map to `application/octet-stream`.
pub fn content_type_for(name: &str) -> &'static str {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name
        .rsplit_once('.')
        .and_then(|(_, ext)| MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
