//! Receiver HTTP server.
//!
//! Binds a TCP port and serves the upload routes until
//! [`shutdown`](ReceiverServer::shutdown) is called.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use pipedrop_protocol::{DEFAULT_PORT, OUTPUT_DIR};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::handler::router;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory uploads are written to.
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            output_dir: PathBuf::from(OUTPUT_DIR),
        }
    }
}

/// The upload receiver.
///
/// Requests share nothing but the output directory path.
pub struct ReceiverServer {
    config: ServerConfig,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ReceiverServer {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Stops accepting connections and lets in-flight requests finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the configured port and serves until [`shutdown`](Self::shutdown).
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            output_dir = %self.config.output_dir.display(),
            "receiver listening on {local_addr}"
        );

        let app = router(self.config.output_dir.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await?;

        tracing::info!("receiver shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipedrop_protocol::{ErrorBody, UploadReceipt};
    use std::path::Path;
    use std::time::Duration;

    async fn spawn_server(
        output_dir: PathBuf,
    ) -> (Arc<ReceiverServer>, tokio::task::JoinHandle<()>, String) {
        let server = ReceiverServer::new(ServerConfig {
            port: 0,
            output_dir,
        });
        let server2 = Arc::clone(&server);
        let handle = tokio::spawn(async move {
            server2.run().await.unwrap();
        });

        // Wait for the server to bind.
        let mut port = 0;
        for _ in 0..100 {
            port = server.port().await;
            if port > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(port > 0, "server did not bind");
        (server, handle, format!("http://127.0.0.1:{port}"))
    }

    fn dir_is_empty(path: &Path) -> bool {
        match std::fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[tokio::test]
    async fn server_binds_dynamic_port() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handle, _) = spawn_server(dir.path().to_path_buf()).await;

        assert!(server.local_addr().await.is_some());

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn index_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handle, base) = spawn_server(dir.path().to_path_buf()).await;

        let resp = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(resp.text().await.unwrap(), crate::INDEX_TEXT);

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn upload_stores_body() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let (server, handle, base) = spawn_server(output.clone()).await;

        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let resp = reqwest::Client::new()
            .post(format!("{base}/upload?fileName=blob.bin"))
            .header("content-type", "application/octet-stream")
            .body(payload.clone())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let receipt: UploadReceipt = resp.json().await.unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.file_name, "blob.bin");
        assert_eq!(receipt.bytes_written, payload.len() as u64);
        assert_eq!(std::fs::read(output.join("blob.bin")).unwrap(), payload);

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_name_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let (server, handle, base) = spawn_server(output.clone()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/upload"))
            .body("data")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: ErrorBody = resp.json().await.unwrap();
        assert!(!body.ok);
        assert!(body.error.contains("Missing fileName"));
        assert!(dir_is_empty(&output));

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn blank_and_empty_file_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let (server, handle, base) = spawn_server(output.clone()).await;
        let client = reqwest::Client::new();

        for query in ["fileName=", "fileName=%20%20", "fileName=a&fileName=b", "fileName=%2F"] {
            let resp = client
                .post(format!("{base}/upload?{query}"))
                .body("data")
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 400, "{query}");
        }
        assert!(dir_is_empty(&output));

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn traversal_is_confined_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("output");
        let (server, handle, base) = spawn_server(output.clone()).await;
        let client = reqwest::Client::new();

        for (query, expected) in [
            ("fileName=..%2F..%2Fetc%2Fpasswd", "passwd"),
            ("fileName=a%2Fb%2Fc.bin", "c.bin"),
            ("fileName=dir%2F", "dir"),
        ] {
            let resp = client
                .post(format!("{base}/upload?{query}"))
                .body("data")
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            let receipt: UploadReceipt = resp.json().await.unwrap();
            assert_eq!(receipt.file_name, expected);
            assert!(output.join(expected).is_file());
        }
        assert!(!dir.path().join("etc").exists());

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn unwritable_output_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory's parent should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let (server, handle, base) = spawn_server(blocker.join("output")).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/upload?fileName=a.bin"))
            .body("data")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: ErrorBody = resp.json().await.unwrap();
        assert!(!body.ok);
        assert!(body.error.starts_with("failed to write file"), "{}", body.error);

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn directory_in_the_way_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();
        let (server, handle, base) = spawn_server(dir.path().to_path_buf()).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/upload?fileName=taken"))
            .body("data")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: ErrorBody = resp.json().await.unwrap();
        assert!(body.error.contains("failed to write file"));
        assert!(dir.path().join("taken").is_dir());

        server.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn same_name_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handle, base) = spawn_server(dir.path().to_path_buf()).await;
        let client = reqwest::Client::new();

        for body in ["first upload, longer", "second"] {
            let resp = client
                .post(format!("{base}/upload?fileName=same.txt"))
                .body(body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("same.txt")).unwrap(),
            "second"
        );

        server.shutdown();
        handle.await.unwrap();
    }
}
