//! The sandbox tool surface.
//!
//! Each tool is a thin adapter from JSON arguments to [`crate::sandbox`] or
//! [`crate::transfer`] operations. Domain failures come back as a failed
//! [`ToolResult`](crate::tools::traits::ToolResult), never as `Err`.

pub mod command;
pub mod create;
pub mod files;
pub mod object_store;
pub mod remote;

pub use command::RunCommandTool;
pub use create::CreateSandboxTool;
pub use files::{DeleteFileTool, GetFileTool, PutFileTool};
pub use object_store::{DownloadFromObjectStoreTool, UploadToObjectStoreTool};
pub use remote::{DownloadFileTool, UploadFileTool};

/// Tool name constants for reference.
pub const TOOL_CREATE_SANDBOX: &str = "create_sandbox";
pub const TOOL_RUN_COMMAND: &str = "run_command";
pub const TOOL_PUT_FILE: &str = "put_file";
pub const TOOL_GET_FILE: &str = "get_file";
pub const TOOL_DELETE_FILE: &str = "delete_file";
pub const TOOL_DOWNLOAD_FILE: &str = "download_file";
pub const TOOL_UPLOAD_FILE: &str = "upload_file";
pub const TOOL_DOWNLOAD_FROM_OBJECT_STORE: &str = "download_from_object_store";
pub const TOOL_UPLOAD_TO_OBJECT_STORE: &str = "upload_to_object_store";

/// Every tool name, in registration order.
pub const ALL_TOOLS: &[&str] = &[
    TOOL_CREATE_SANDBOX,
    TOOL_RUN_COMMAND,
    TOOL_PUT_FILE,
    TOOL_GET_FILE,
    TOOL_DELETE_FILE,
    TOOL_DOWNLOAD_FILE,
    TOOL_UPLOAD_FILE,
    TOOL_DOWNLOAD_FROM_OBJECT_STORE,
    TOOL_UPLOAD_TO_OBJECT_STORE,
];
