//! HTTP transfer tools: download_file and upload_file.

use crate::tools::traits::{required_str, sandbox_arg, Tool, ToolResult};
use crate::transfer::TransferGateway;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct DownloadFileTool {
    transfer: Arc<TransferGateway>,
}

impl DownloadFileTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for DownloadFileTool {
    fn name(&self) -> &str {
        "download_file"
    }

    fn description(&self) -> &str {
        "Download a file from a URL into the sandbox, creating the sandbox directory \
         if needed. The response body is saved whatever its status. Returns the full file path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "url": { "type": "string", "description": "HTTP(S) URL to fetch" },
                "filename": { "type": "string", "description": "Destination file name in the sandbox" }
            },
            "required": ["sandbox", "url", "filename"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let url = required_str(&args, "url")?;
        let filename = required_str(&args, "filename")?;

        Ok(
            match self
                .transfer
                .fetch_remote(sandbox_arg(&args), url, filename)
                .await
            {
                Ok(path) => ToolResult::ok(path.to_string_lossy()),
                Err(e) => ToolResult::failed(&e),
            },
        )
    }
}

pub struct UploadFileTool {
    transfer: Arc<TransferGateway>,
}

impl UploadFileTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for UploadFileTool {
    fn name(&self) -> &str {
        "upload_file"
    }

    fn description(&self) -> &str {
        "Upload a sandbox file to a URL as multipart form data (field \"file\"). \
         Returns the response body text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "filename": { "type": "string", "description": "File name in the sandbox" },
                "upload_url": { "type": "string", "description": "URL accepting a multipart POST" }
            },
            "required": ["sandbox", "filename", "upload_url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let filename = required_str(&args, "filename")?;
        let upload_url = required_str(&args, "upload_url")?;

        Ok(
            match self
                .transfer
                .push_remote(sandbox_arg(&args), filename, upload_url)
                .await
            {
                Ok(body) => ToolResult::ok(body),
                Err(e) => ToolResult::failed(&e),
            },
        )
    }
}
