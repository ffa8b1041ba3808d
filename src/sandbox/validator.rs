//! Gate for command strings.
//!
//! Only a literal, case-sensitive prefix check against the permitted tool
//! token is performed. Flags, shell metacharacters and chained commands are
//! not inspected: this guards against accidental non-tool invocations from a
//! cooperating caller, not against hostile input.

use super::SandboxError;

#[derive(Debug, Clone)]
pub struct CommandValidator {
    tool: String,
}

impl CommandValidator {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Accept a shell command string that starts with the tool token.
    pub fn validate(&self, command: &str) -> Result<(), SandboxError> {
        if self.tool.is_empty() || !command.starts_with(&self.tool) {
            return Err(SandboxError::CommandNotPermitted);
        }
        Ok(())
    }

    /// Accept an argument vector whose program is exactly the tool token.
    pub fn validate_args(&self, args: &[String]) -> Result<(), SandboxError> {
        match args.first() {
            Some(program) if !self.tool.is_empty() && *program == self.tool => Ok(()),
            _ => Err(SandboxError::CommandNotPermitted),
        }
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}
