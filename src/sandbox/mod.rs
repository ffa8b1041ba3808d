//! Sandbox lifecycle and the command-execution boundary.
//!
//! - [`SandboxManager`] allocates sandbox directories and resolves filenames
//!   against them.
//! - [`CommandValidator`] decides whether a command may run at all.
//! - [`ProcessExecutor`] runs validated commands with the sandbox as working
//!   directory and turns the exit status into a result.
//! - [`SandboxLocks`] serialises work on a single sandbox.
//!
//! Isolation is directory-scoped and best-effort. It is not a security
//! boundary against a hostile command string.

mod error;
mod executor;
mod locks;
mod manager;
mod validator;

pub use error::{ErrorKind, SandboxError};
pub use executor::{CommandOutput, ProcessExecutor};
pub use locks::SandboxLocks;
pub use manager::{escapes_root, SandboxManager};
pub use validator::CommandValidator;
