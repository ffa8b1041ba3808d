//! Sandboxed ffmpeg tool server.
//!
//! Callers allocate a sandbox directory, move media in and out of it (inline,
//! over HTTP, or through a cloud object store), and run `ffmpeg` commands with
//! the sandbox as working directory. The same tool set is exposed through the
//! [`gateway`] HTTP surface and the command line.

pub mod config;
pub mod gateway;
pub mod sandbox;
pub mod tools;
pub mod transfer;

pub use config::Config;
pub use sandbox::{ErrorKind, SandboxError};
pub use tools::{ToolRegistry, ToolResult};
