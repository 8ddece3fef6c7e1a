//! Upload driver.
//!
//! Checks the source file, streams it as the body of a single POST, and
//! keeps the progress line ticking until the response settles.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use pipedrop_protocol::{ErrorBody, OCTET_STREAM, UploadReceipt};
use pipedrop_transfer::{
    CountingStream, ProgressRenderer, ProgressTicker, TerminalGuard, TransferSession,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::READ_CHUNK_SIZE;
use crate::destination::build_upload_url;
use crate::error::UploadError;
use crate::types::{UploadOptions, UploadReport};

/// Streams files to a receiver. One attempt per call; nothing is retried.
pub struct Uploader {
    client: reqwest::Client,
    options: UploadOptions,
}

impl Uploader {
    /// Creates an uploader with its own HTTP client.
    pub fn new(options: UploadOptions) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| UploadError::transport(&e))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Uploads `file_path` to `destination`, drawing progress with
    /// `renderer`.
    ///
    /// All precondition failures (missing file, directory, bad URL) are
    /// reported before any network activity.
    pub async fn upload<W: Write + Send + 'static>(
        &self,
        file_path: &Path,
        destination: &str,
        renderer: ProgressRenderer<W>,
    ) -> Result<UploadReport, UploadError> {
        let metadata = tokio::fs::metadata(file_path)
            .await
            .map_err(|source| UploadError::FileAccess {
                path: file_path.to_path_buf(),
                source,
            })?;
        if !metadata.is_file() {
            return Err(UploadError::NotAFile {
                path: file_path.to_path_buf(),
            });
        }
        let total_bytes = metadata.len();

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::NotAFile {
                path: file_path.to_path_buf(),
            })?;

        let url = build_upload_url(destination, &file_name)?;

        let file = tokio::fs::File::open(file_path)
            .await
            .map_err(|source| UploadError::FileAccess {
                path: file_path.to_path_buf(),
                source,
            })?;

        let session = TransferSession::new(file_name, url, total_bytes);
        let body = reqwest::Body::wrap_stream(CountingStream::new(
            ReaderStream::with_capacity(file, READ_CHUNK_SIZE),
            session.counter(),
        ));

        info!(
            file = %session.file_name(),
            total_bytes,
            url = %session.destination(),
            "upload started"
        );

        let renderer = renderer.shared();
        let _terminal = TerminalGuard::acquire(&renderer);
        let ticker = ProgressTicker::start(
            session.clone(),
            Arc::clone(&renderer),
            self.options.tick_interval,
        );

        match self.send(&session, body).await {
            Ok(receipt) => {
                session.mark_complete();
                ticker.finish().await;

                let elapsed = session.elapsed();
                info!(
                    file = %session.file_name(),
                    total_bytes,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "upload completed"
                );
                if let Some(receipt) = &receipt {
                    if receipt.bytes_written != total_bytes {
                        error!(
                            sent = total_bytes,
                            written = receipt.bytes_written,
                            "receiver reported a different byte count"
                        );
                    }
                }

                Ok(UploadReport {
                    file_name: session.file_name().to_string(),
                    total_bytes,
                    elapsed,
                    url: session.destination().clone(),
                    receipt,
                })
            }
            Err(e) => {
                ticker.abort().await;
                error!(
                    file = %session.file_name(),
                    uploaded = session.uploaded_bytes(),
                    total_bytes,
                    "upload failed: {e}"
                );
                Err(e)
            }
        }
    }

    /// Issues the POST and classifies the response.
    async fn send(
        &self,
        session: &TransferSession,
        body: reqwest::Body,
    ) -> Result<Option<UploadReceipt>, UploadError> {
        let response = self
            .client
            .post(session.destination().clone())
            .header(CONTENT_LENGTH, session.total_bytes())
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::transport(&e))?;

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("failed to read response body: {e}");
                String::new()
            }
        };

        if !status.is_success() {
            let body = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(UploadError::RemoteRejection {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str::<UploadReceipt>(&text).ok())
    }
}
