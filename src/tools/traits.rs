use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sandbox::{ErrorKind, SandboxError};

/// Outcome of a tool call. Domain failures are values, not `Err`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            kind: None,
        }
    }

    pub fn failed(err: &SandboxError) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(err.caller_message()),
            kind: Some(err.kind()),
        }
    }
}

/// Name, description and JSON parameter schema advertised to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool. `Err` means the arguments were unusable.
    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The sandbox argument. Absent is treated like empty so the executor and
/// transfer layers report "sandbox not specified" as a result value.
pub fn sandbox_arg(args: &serde_json::Value) -> &str {
    args["sandbox"].as_str().unwrap_or("")
}

pub fn required_str<'a>(args: &'a serde_json::Value, name: &str) -> anyhow::Result<&'a str> {
    args[name]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: {name}"))
}
