//! Plain HTTP fetch and multipart push.
//!
//! Status codes are not treated as failures: an error page is written to the
//! sandbox like any other body, and an upload returns whatever text the
//! server answered with. Non-2xx responses are logged.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use super::write_response_body;
use crate::config::TransferConfig;
use crate::sandbox::SandboxError;

/// Multipart field name the file is attached under.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(cfg: &TransferConfig) -> Result<Self, SandboxError> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(secs) = cfg.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SandboxError::Transfer(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `url` and write the body to `dest` verbatim. Returns bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, SandboxError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(url, %status, "Download returned non-success status, writing body anyway");
        }
        let written = write_response_body(resp, dest).await?;
        debug!(url, written, dest = %dest.display(), "Download complete");
        Ok(written)
    }

    /// POST `content` as a multipart file upload and return the response text.
    pub async fn upload(
        &self,
        url: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<String, SandboxError> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(mime.essence_str())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let resp = self.client.post(url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(url, %status, "Upload returned non-success status");
        }
        Ok(resp.text().await?)
    }
}
