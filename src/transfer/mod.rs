//! Moves bytes between a sandbox and the outside world.
//!
//! Every operation resolves its filename against the sandbox root through
//! [`SandboxManager::resolve`] and holds the sandbox lock for its duration.
//! Operations that write into the sandbox create the directory first.

pub mod http;
pub mod object_store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub use http::HttpTransfer;
pub use object_store::{GcsObjectStore, ObjectStore, ObjectUrl};

use crate::config::Config;
use crate::sandbox::{SandboxError, SandboxLocks, SandboxManager};

/// Result of a delete. A missing file is a notice, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing,
}

impl DeleteOutcome {
    pub fn message(self, filename: &str) -> String {
        match self {
            Self::Deleted => format!("File {filename} deleted successfully."),
            Self::Missing => format!("File {filename} does not exist."),
        }
    }
}

pub struct TransferGateway {
    manager: SandboxManager,
    locks: SandboxLocks,
    http: HttpTransfer,
    store: Arc<dyn ObjectStore>,
}

impl TransferGateway {
    pub fn new(
        manager: SandboxManager,
        locks: SandboxLocks,
        http: HttpTransfer,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            manager,
            locks,
            http,
            store,
        }
    }

    /// Build the HTTP and Cloud Storage collaborators from config.
    pub fn from_config(
        cfg: &Config,
        manager: SandboxManager,
        locks: SandboxLocks,
    ) -> Result<Self, SandboxError> {
        let http = HttpTransfer::new(&cfg.transfer)?;
        let store = GcsObjectStore::new(&cfg.object_store, http.client().clone());
        Ok(Self::new(manager, locks, http, Arc::new(store)))
    }

    fn target(&self, sandbox: &str, filename: &str) -> Result<(PathBuf, PathBuf), SandboxError> {
        let dir = SandboxManager::require_sandbox(sandbox)?;
        let path = self.manager.resolve(&dir, filename)?;
        Ok((dir, path))
    }

    /// Write `content` to the sandbox, replacing any existing file.
    pub async fn put(
        &self,
        sandbox: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, SandboxError> {
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        self.manager.ensure_exists(&dir).await?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| SandboxError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), bytes = content.len(), "File written");
        Ok(path)
    }

    pub async fn get(&self, sandbox: &str, filename: &str) -> Result<Vec<u8>, SandboxError> {
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        tokio::fs::read(&path)
            .await
            .map_err(|e| SandboxError::from_io(&path, e))
    }

    pub async fn delete(&self, sandbox: &str, filename: &str) -> Result<DeleteOutcome, SandboxError> {
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "File deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::Missing),
            Err(source) => Err(SandboxError::Io { path, source }),
        }
    }

    /// Download `url` into the sandbox. The body is written whatever the
    /// response status.
    pub async fn fetch_remote(
        &self,
        sandbox: &str,
        url: &str,
        filename: &str,
    ) -> Result<PathBuf, SandboxError> {
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        self.manager.ensure_exists(&dir).await?;

        self.http.download(url, &path).await?;
        info!(url, path = %path.display(), "Fetched remote file");
        Ok(path)
    }

    /// Upload a sandbox file as multipart form data and return the raw
    /// response text.
    pub async fn push_remote(
        &self,
        sandbox: &str,
        filename: &str,
        upload_url: &str,
    ) -> Result<String, SandboxError> {
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| SandboxError::from_io(&path, e))?;

        let response = self.http.upload(upload_url, filename, content).await?;
        info!(upload_url, path = %path.display(), "Pushed file to remote");
        Ok(response)
    }

    pub async fn fetch_object_store(
        &self,
        sandbox: &str,
        object_url: &str,
        filename: &str,
    ) -> Result<PathBuf, SandboxError> {
        let object = ObjectUrl::parse(object_url)?;
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;
        self.manager.ensure_exists(&dir).await?;

        self.store.download_to_file(&object, &path).await?;
        info!(%object, path = %path.display(), "Fetched object");
        Ok(path)
    }

    pub async fn push_object_store(
        &self,
        sandbox: &str,
        filename: &str,
        object_url: &str,
    ) -> Result<String, SandboxError> {
        let object = ObjectUrl::parse(object_url)?;
        let (dir, path) = self.target(sandbox, filename)?;
        let _guard = self.locks.lock(&dir).await;

        self.store.upload_from_file(&object, &path).await?;
        info!(%object, path = %path.display(), "Pushed object");
        Ok(format!("File {filename} uploaded to {object_url} successfully."))
    }
}

/// Stream a response body into `dest`.
///
/// The body is staged in a temporary sibling of `dest` and renamed over it
/// after the last chunk, so a failed transfer leaves any existing file as it
/// was. The staging file is removed on every error path.
pub(crate) async fn write_response_body(
    mut resp: reqwest::Response,
    dest: &Path,
) -> Result<u64, SandboxError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_err = |source| SandboxError::Io {
        path: dest.to_path_buf(),
        source,
    };

    let (file, staged) = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;
    drop(file);

    staged.persist(dest).map_err(|e| io_err(e.error))?;
    Ok(written)
}
