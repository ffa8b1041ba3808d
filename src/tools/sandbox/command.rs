//! `run_command` tool: execute an ffmpeg command inside a sandbox.

use crate::sandbox::ProcessExecutor;
use crate::tools::traits::{sandbox_arg, Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const TOOL_NAME: &str = "run_command";

pub struct RunCommandTool {
    executor: Arc<ProcessExecutor>,
}

impl RunCommandTool {
    pub fn new(executor: Arc<ProcessExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Run an ffmpeg command with the sandbox directory as working directory. \
         `command` is interpreted by a shell and must start with `ffmpeg`; \
         alternatively pass `args` as an argument vector to skip the shell. \
         Returns stdout on success, or the command's stderr as the error text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sandbox": {
                    "type": "string",
                    "description": "Sandbox path returned by create_sandbox. Must already exist on disk."
                },
                "command": {
                    "type": "string",
                    "description": "Command line, e.g. 'ffmpeg -i in.mp4 -vn out.mp3'"
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Argument vector run without a shell, e.g. [\"ffmpeg\", \"-i\", \"in.mp4\", \"out.mp3\"]. Used instead of `command`."
                }
            },
            "required": ["sandbox"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let sandbox = sandbox_arg(&args);

        let outcome = if let Some(argv) = args["args"].as_array() {
            let argv = argv
                .iter()
                .map(|a| {
                    a.as_str()
                        .map(String::from)
                        .ok_or_else(|| anyhow::anyhow!("args must be an array of strings"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            self.executor.run_args(sandbox, &argv).await
        } else {
            let command = args["command"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Missing required parameter: command"))?;
            self.executor.run(sandbox, command).await
        };

        Ok(match outcome {
            Ok(stdout) => ToolResult::ok(stdout),
            Err(e) => {
                tracing::debug!("run_command failed: {e}");
                ToolResult::failed(&e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{CommandValidator, ErrorKind};
    use tempfile::TempDir;

    fn tool(token: &str) -> RunCommandTool {
        RunCommandTool::new(Arc::new(ProcessExecutor::new(
            CommandValidator::new(token),
            "sh",
        )))
    }

    #[tokio::test]
    async fn rejects_non_tool_command() {
        let tmp = TempDir::new().unwrap();
        let result = tool("ffmpeg")
            .execute(json!({"sandbox": tmp.path(), "command": "rm -rf ."}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("command not permitted"));
        assert_eq!(result.kind, Some(ErrorKind::Precondition));
    }

    #[tokio::test]
    async fn missing_sandbox_is_a_result_not_an_error() {
        let result = tool("ffmpeg")
            .execute(json!({"command": "ffmpeg -version"}))
            .await
            .unwrap();
        assert_eq!(result.error.as_deref(), Some("sandbox not specified"));
    }

    #[tokio::test]
    async fn failing_command_reports_stderr() {
        let tmp = TempDir::new().unwrap();
        let result = tool("sh")
            .execute(json!({
                "sandbox": tmp.path(),
                "command": "sh -c 'echo bad input >&2; exit 1'"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("bad input\n"));
        assert_eq!(result.kind, Some(ErrorKind::Execution));
    }

    #[tokio::test]
    async fn argument_vector_runs() {
        let tmp = TempDir::new().unwrap();
        let result = tool("echo")
            .execute(json!({"sandbox": tmp.path(), "args": ["echo", "ok"]}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "ok\n");
    }

    #[tokio::test]
    async fn missing_command_is_an_argument_error() {
        let tmp = TempDir::new().unwrap();
        assert!(tool("ffmpeg")
            .execute(json!({"sandbox": tmp.path()}))
            .await
            .is_err());
    }
}
