//! Sandbox directory allocation and path resolution.
//!
//! A sandbox is a directory `<root>/<prefix>_<suffix>` where the suffix is
//! drawn from the thread-local CSPRNG. [`SandboxManager::create_sandbox`]
//! only allocates the name: the directory is created lazily by the first
//! operation that writes into it ([`SandboxManager::ensure_exists`]). Callers
//! must not assume a freshly returned path exists on disk.

use std::path::{Component, Path, PathBuf};

use rand::distr::{Alphanumeric, SampleString};
use tracing::{debug, warn};

use super::SandboxError;
use crate::config::{ConfigError, SandboxConfig, MIN_SUFFIX_LEN};

/// Attempts at drawing a suffix that does not collide with an existing path.
const MAX_NAME_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct SandboxManager {
    root: PathBuf,
    prefix: String,
    suffix_len: usize,
    confine_paths: bool,
}

impl SandboxManager {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, suffix_len: usize) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            suffix_len: suffix_len.max(MIN_SUFFIX_LEN),
            confine_paths: false,
        }
    }

    pub fn from_config(cfg: &SandboxConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            cfg.resolved_root()?,
            cfg.prefix.clone(),
            cfg.effective_suffix_len(),
        )
        .with_confined_paths(cfg.confine_paths))
    }

    /// Reject escaping filenames instead of only logging them.
    pub fn with_confined_paths(mut self, confine: bool) -> Self {
        self.confine_paths = confine;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a new sandbox path. Does not touch the filesystem beyond a
    /// collision check.
    pub fn create_sandbox(&self) -> PathBuf {
        let mut rng = rand::rng();
        let mut candidate = self.candidate(&Alphanumeric.sample_string(&mut rng, self.suffix_len));
        for _ in 1..MAX_NAME_ATTEMPTS {
            if !candidate.exists() {
                break;
            }
            debug!(path = %candidate.display(), "Sandbox name collision, drawing again");
            candidate = self.candidate(&Alphanumeric.sample_string(&mut rng, self.suffix_len));
        }
        debug!(path = %candidate.display(), "Allocated sandbox");
        candidate
    }

    fn candidate(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}_{suffix}", self.prefix))
    }

    /// Create the sandbox directory and its parents. Idempotent.
    pub async fn ensure_exists(&self, sandbox: &Path) -> Result<(), SandboxError> {
        tokio::fs::create_dir_all(sandbox)
            .await
            .map_err(|source| SandboxError::Directory {
                path: sandbox.to_path_buf(),
                source,
            })
    }

    /// Validate a caller-supplied sandbox argument. Only the empty string
    /// counts as unspecified; a blank path is left to the existence check.
    pub fn require_sandbox(sandbox: &str) -> Result<PathBuf, SandboxError> {
        if sandbox.is_empty() {
            return Err(SandboxError::NotSpecified);
        }
        Ok(PathBuf::from(sandbox))
    }

    /// Join `filename` to the sandbox root without canonicalisation.
    ///
    /// Absolute names and `..` components can land outside the sandbox. They
    /// are logged, and rejected only when path confinement is enabled.
    pub fn resolve(&self, sandbox: &Path, filename: &str) -> Result<PathBuf, SandboxError> {
        if escapes_root(filename) {
            if self.confine_paths {
                return Err(SandboxError::PathEscape(filename.to_string()));
            }
            warn!(
                sandbox = %sandbox.display(),
                filename,
                "Filename resolves outside the sandbox root"
            );
        }
        Ok(sandbox.join(filename))
    }
}

/// True when joining `filename` to a directory can leave that directory.
pub fn escapes_root(filename: &str) -> bool {
    Path::new(filename).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(tmp: &TempDir) -> SandboxManager {
        SandboxManager::new(tmp.path(), "ffmpeg_sandbox", 8)
    }

    #[test]
    fn created_path_is_named_under_root() {
        let tmp = TempDir::new().unwrap();
        let path = manager(&tmp).create_sandbox();

        assert_eq!(path.parent(), Some(tmp.path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        let suffix = name.strip_prefix("ffmpeg_sandbox_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn creation_is_lazy() {
        let tmp = TempDir::new().unwrap();
        let path = manager(&tmp).create_sandbox();
        assert!(!path.exists());
    }

    #[test]
    fn consecutive_sandboxes_differ() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);
        assert_ne!(mgr.create_sandbox(), mgr.create_sandbox());
    }

    #[test]
    fn suffix_never_shorter_than_minimum() {
        let tmp = TempDir::new().unwrap();
        let mgr = SandboxManager::new(tmp.path(), "sbx", 2);
        let path = mgr.create_sandbox();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), "sbx_".len() + MIN_SUFFIX_LEN);
    }

    #[tokio::test]
    async fn ensure_exists_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);
        let path = mgr.create_sandbox();

        mgr.ensure_exists(&path).await.unwrap();
        mgr.ensure_exists(&path).await.unwrap();
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn ensure_exists_reports_directory_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = manager(&tmp)
            .ensure_exists(&blocker.join("sandbox"))
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::Directory { .. }));
    }

    #[test]
    fn require_sandbox_rejects_only_empty() {
        assert!(matches!(
            SandboxManager::require_sandbox(""),
            Err(SandboxError::NotSpecified)
        ));
        assert_eq!(
            SandboxManager::require_sandbox("  ").unwrap(),
            PathBuf::from("  ")
        );
        assert_eq!(
            SandboxManager::require_sandbox("/tmp/s").unwrap(),
            PathBuf::from("/tmp/s")
        );
    }

    #[test]
    fn resolve_keeps_nested_relative_names() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp).with_confined_paths(true);
        let sandbox = tmp.path().join("s");
        assert_eq!(
            mgr.resolve(&sandbox, "frames/0001.png").unwrap(),
            sandbox.join("frames/0001.png")
        );
    }

    #[test]
    fn resolve_passes_escapes_through_by_default() {
        let tmp = TempDir::new().unwrap();
        let sandbox = tmp.path().join("s");
        assert_eq!(
            manager(&tmp).resolve(&sandbox, "../other.txt").unwrap(),
            sandbox.join("../other.txt")
        );
    }

    #[test]
    fn resolve_rejects_escapes_when_confined() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp).with_confined_paths(true);
        let sandbox = tmp.path().join("s");
        assert!(matches!(
            mgr.resolve(&sandbox, "../other.txt"),
            Err(SandboxError::PathEscape(_))
        ));
        assert!(matches!(
            mgr.resolve(&sandbox, "/etc/passwd"),
            Err(SandboxError::PathEscape(_))
        ));
    }

    #[test]
    fn escape_detection() {
        assert!(escapes_root("../x"));
        assert!(escapes_root("a/../../x"));
        assert!(escapes_root("/abs"));
        assert!(!escapes_root("a/b.mp4"));
        assert!(!escapes_root("./clip.mp4"));
    }
}
