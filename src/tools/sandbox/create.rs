//! `create_sandbox` tool: allocate a new sandbox path.

use crate::sandbox::SandboxManager;
use crate::tools::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const TOOL_NAME: &str = "create_sandbox";

pub struct CreateSandboxTool {
    manager: Arc<SandboxManager>,
}

impl CreateSandboxTool {
    pub fn new(manager: Arc<SandboxManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for CreateSandboxTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Create a sandbox for running ffmpeg commands and return its directory path. \
         The directory is created on first use (put_file, download_file, ...), \
         so put at least one file before calling run_command. \
         Pass the returned path as `sandbox` to every other tool."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let path = self.manager.create_sandbox();
        Ok(ToolResult::ok(path.to_string_lossy()))
    }
}
