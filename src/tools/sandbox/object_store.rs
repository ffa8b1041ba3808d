//! Object store tools: download_from_object_store and upload_to_object_store.

use crate::tools::traits::{required_str, sandbox_arg, Tool, ToolResult};
use crate::transfer::TransferGateway;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct DownloadFromObjectStoreTool {
    transfer: Arc<TransferGateway>,
}

impl DownloadFromObjectStoreTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for DownloadFromObjectStoreTool {
    fn name(&self) -> &str {
        "download_from_object_store"
    }

    fn description(&self) -> &str {
        "Download an object (gs://bucket/key) into the sandbox, creating the sandbox \
         directory if needed. Returns the full file path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "object_url": { "type": "string", "description": "Object URL, e.g. gs://bucket/path/in.mp4" },
                "filename": { "type": "string", "description": "Destination file name in the sandbox" }
            },
            "required": ["sandbox", "object_url", "filename"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let object_url = required_str(&args, "object_url")?;
        let filename = required_str(&args, "filename")?;

        Ok(
            match self
                .transfer
                .fetch_object_store(sandbox_arg(&args), object_url, filename)
                .await
            {
                Ok(path) => ToolResult::ok(path.to_string_lossy()),
                Err(e) => ToolResult::failed(&e),
            },
        )
    }
}

pub struct UploadToObjectStoreTool {
    transfer: Arc<TransferGateway>,
}

impl UploadToObjectStoreTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for UploadToObjectStoreTool {
    fn name(&self) -> &str {
        "upload_to_object_store"
    }

    fn description(&self) -> &str {
        "Upload a sandbox file to an object URL (gs://bucket/key) and return a confirmation."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "filename": { "type": "string", "description": "File name in the sandbox" },
                "object_url": { "type": "string", "description": "Destination object URL" }
            },
            "required": ["sandbox", "filename", "object_url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let filename = required_str(&args, "filename")?;
        let object_url = required_str(&args, "object_url")?;

        Ok(
            match self
                .transfer
                .push_object_store(sandbox_arg(&args), filename, object_url)
                .await
            {
                Ok(message) => ToolResult::ok(message),
                Err(e) => ToolResult::failed(&e),
            },
        )
    }
}
