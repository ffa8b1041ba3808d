//! Tool registry.
//!
//! [`ToolRegistry::from_config`] wires one shared [`SandboxLocks`] through the
//! executor and the transfer gateway, so every tool serialises on the same
//! per-sandbox lock.

pub mod sandbox;
pub mod traits;

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info_span, Instrument};

use crate::config::Config;
use crate::sandbox::{ProcessExecutor, SandboxLocks, SandboxManager};
use crate::transfer::TransferGateway;
pub use traits::{Tool, ToolResult, ToolSpec};

#[derive(Debug, Error)]
pub enum CallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[source] anyhow::Error),
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full sandbox tool set from config.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let locks = SandboxLocks::new();
        let manager = SandboxManager::from_config(&cfg.sandbox)?;
        let executor = Arc::new(ProcessExecutor::from_config(&cfg.executor, locks.clone()));
        let transfer = Arc::new(TransferGateway::from_config(
            cfg,
            manager.clone(),
            locks,
        )?);

        Ok(Self::with_parts(Arc::new(manager), executor, transfer))
    }

    /// Register every sandbox tool over the given collaborators.
    pub fn with_parts(
        manager: Arc<SandboxManager>,
        executor: Arc<ProcessExecutor>,
        transfer: Arc<TransferGateway>,
    ) -> Self {
        use sandbox::*;

        let mut registry = Self::new();
        registry.register(CreateSandboxTool::new(manager));
        registry.register(RunCommandTool::new(executor));
        registry.register(PutFileTool::new(transfer.clone()));
        registry.register(GetFileTool::new(transfer.clone()));
        registry.register(DeleteFileTool::new(transfer.clone()));
        registry.register(DownloadFileTool::new(transfer.clone()));
        registry.register(UploadFileTool::new(transfer.clone()));
        registry.register(DownloadFromObjectStoreTool::new(transfer.clone()));
        registry.register(UploadToObjectStoreTool::new(transfer));
        registry
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by name. Tool-level failures are `Ok` with
    /// `success == false`; `Err` is reserved for an unknown tool or unusable
    /// arguments.
    pub async fn call(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolResult, CallError> {
        let tool = self
            .get(name)
            .ok_or_else(|| CallError::UnknownTool(name.to_string()))?;

        let result = tool
            .execute(args)
            .instrument(info_span!("tool", name))
            .await
            .map_err(CallError::InvalidArguments)?;
        debug!(tool = name, success = result.success, "Tool call finished");
        Ok(result)
    }
}
