//! Sandbox file tools: put_file, get_file, delete_file.
//!
//! Binary content crosses the tool boundary as base64 unless the caller asks
//! for `encoding: "text"`.

use crate::tools::traits::{required_str, sandbox_arg, Tool, ToolResult};
use crate::transfer::TransferGateway;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use std::sync::Arc;

/// Payload encoding selected by the `encoding` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Base64,
    Text,
}

impl Encoding {
    fn from_args(args: &serde_json::Value) -> anyhow::Result<Self> {
        match args["encoding"].as_str().unwrap_or("base64") {
            "base64" => Ok(Self::Base64),
            "text" => Ok(Self::Text),
            other => anyhow::bail!("Unsupported encoding: {other} (expected base64 or text)"),
        }
    }
}

fn encoding_schema() -> serde_json::Value {
    json!({
        "type": "string",
        "enum": ["base64", "text"],
        "description": "How `content` is encoded. Default: base64."
    })
}

// ── put_file ──────────────────────────────────────────────────────────────────

pub struct PutFileTool {
    transfer: Arc<TransferGateway>,
}

impl PutFileTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for PutFileTool {
    fn name(&self) -> &str {
        "put_file"
    }

    fn description(&self) -> &str {
        "Write a file into the sandbox, creating the sandbox directory if needed \
         and overwriting any existing file. Returns the full file path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "filename": { "type": "string", "description": "File name relative to the sandbox" },
                "content": { "type": "string", "description": "File content" },
                "encoding": encoding_schema()
            },
            "required": ["sandbox", "filename", "content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let filename = required_str(&args, "filename")?;
        let content = required_str(&args, "content")?;
        let bytes = match Encoding::from_args(&args)? {
            Encoding::Base64 => STANDARD
                .decode(content)
                .map_err(|e| anyhow::anyhow!("content is not valid base64: {e}"))?,
            Encoding::Text => content.as_bytes().to_vec(),
        };

        Ok(
            match self.transfer.put(sandbox_arg(&args), filename, &bytes).await {
                Ok(path) => ToolResult::ok(path.to_string_lossy()),
                Err(e) => ToolResult::failed(&e),
            },
        )
    }
}

// ── get_file ──────────────────────────────────────────────────────────────────

pub struct GetFileTool {
    transfer: Arc<TransferGateway>,
}

impl GetFileTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for GetFileTool {
    fn name(&self) -> &str {
        "get_file"
    }

    fn description(&self) -> &str {
        "Read a file from the sandbox. Returns the content base64-encoded, \
         or as UTF-8 text when encoding is \"text\"."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "filename": { "type": "string", "description": "File name relative to the sandbox" },
                "encoding": encoding_schema()
            },
            "required": ["sandbox", "filename"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let filename = required_str(&args, "filename")?;
        let encoding = Encoding::from_args(&args)?;

        Ok(match self.transfer.get(sandbox_arg(&args), filename).await {
            Ok(bytes) => ToolResult::ok(match encoding {
                Encoding::Base64 => STANDARD.encode(&bytes),
                Encoding::Text => String::from_utf8_lossy(&bytes).into_owned(),
            }),
            Err(e) => ToolResult::failed(&e),
        })
    }
}

// ── delete_file ───────────────────────────────────────────────────────────────

pub struct DeleteFileTool {
    transfer: Arc<TransferGateway>,
}

impl DeleteFileTool {
    pub fn new(transfer: Arc<TransferGateway>) -> Self {
        Self { transfer }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file from the sandbox. Deleting a file that does not exist \
         is not an error; the result says so."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": { "type": "string", "description": "Sandbox path" },
                "filename": { "type": "string", "description": "File name relative to the sandbox" }
            },
            "required": ["sandbox", "filename"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let filename = required_str(&args, "filename")?;

        Ok(match self.transfer.delete(sandbox_arg(&args), filename).await {
            Ok(outcome) => ToolResult::ok(outcome.message(filename)),
            Err(e) => ToolResult::failed(&e),
        })
    }
}
