//! Request handlers.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, RawQuery, State};
use axum::routing::{get, post};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use pipedrop_protocol::{FILE_NAME_PARAM, UPLOAD_PATH, UploadReceipt};
use pipedrop_transfer::sanitize_file_name;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::error::ReceiveError;

/// Body of `GET /`.
pub const INDEX_TEXT: &str =
    "pipedrop receiver is running. POST /upload?fileName=<name> with a raw binary body.\n";

#[derive(Clone)]
struct AppState {
    output_dir: Arc<PathBuf>,
}

/// Builds the receiver's routes, storing uploads under `output_dir`.
pub fn router(output_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(index))
        .route(UPLOAD_PATH, post(receive_upload))
        .layer(DefaultBodyLimit::disable())
        .with_state(AppState {
            output_dir: Arc::new(output_dir),
        })
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn receive_upload(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Body,
) -> Result<Json<UploadReceipt>, ReceiveError> {
    let requested = requested_file_name(query.as_deref()).inspect_err(|e| {
        warn!(query = ?query, "rejecting upload: {e}");
    })?;

    let file_name = sanitize_file_name(&requested).map_err(|e| {
        warn!(requested = %requested, "rejecting upload: {e}");
        ReceiveError::InvalidFileName(e.to_string())
    })?;
    if file_name != requested {
        debug!(requested = %requested, sanitized = %file_name, "file name sanitized");
    }

    let receipt = store_body(&state.output_dir, &file_name, body.into_data_stream()).await?;
    Ok(Json(receipt))
}

/// Extracts the single, non-blank `fileName` value from a raw query string.
pub fn requested_file_name(query: Option<&str>) -> Result<String, ReceiveError> {
    let mut values = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == FILE_NAME_PARAM)
        .map(|(_, value)| value.into_owned());

    let name = values.next().ok_or(ReceiveError::MissingFileName)?;
    if values.next().is_some() {
        return Err(ReceiveError::AmbiguousFileName);
    }
    if name.trim().is_empty() {
        return Err(ReceiveError::EmptyFileName);
    }
    Ok(name)
}

/// Streams `body` into `output_dir/file_name`, truncating any existing
/// file.
///
/// Bytes are counted as they are taken off the stream. On failure the
/// partially written file is left in place.
pub async fn store_body<S, E>(
    output_dir: &Path,
    file_name: &str,
    body: S,
) -> Result<UploadReceipt, ReceiveError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(file_name);
    let mut file = tokio::fs::File::create(&path).await?;

    info!(path = %path.display(), "receiving upload");

    let mut body = std::pin::pin!(body);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                drop(file);
                error!(path = %path.display(), bytes_written, "upload stream failed: {e}");
                return Err(ReceiveError::Stream(e.to_string()));
            }
        };

        bytes_written += chunk.len() as u64;
        if let Err(e) = file.write_all(&chunk).await {
            error!(path = %path.display(), bytes_written, "write failed: {e}");
            return Err(e.into());
        }
    }

    file.flush().await?;
    file.sync_all().await?;

    info!(path = %path.display(), bytes_written, "upload stored");

    Ok(UploadReceipt {
        ok: true,
        file_name: file_name.to_string(),
        bytes_written,
        saved_to: path.display().to_string(),
    })
}
