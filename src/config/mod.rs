//! TOML configuration for the sandbox tool server.
//!
//! Every section is optional; a missing file means all defaults. Path values
//! accept `~` and `$VAR` references.

use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable consulted when `object_store.access_token` is unset.
pub const OBJECT_STORE_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Shortest random suffix accepted for sandbox names.
pub const MIN_SUFFIX_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot expand path '{raw}': {reason}")]
    Expand { raw: String, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub sandbox: SandboxConfig,
    pub executor: ExecutorConfig,
    pub transfer: TransferConfig,
    pub object_store: ObjectStoreConfig,
    pub gateway: GatewayConfig,
}

/// Where sandboxes live and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SandboxConfig {
    /// Parent directory for sandboxes. Defaults to the process temp dir.
    pub root_dir: Option<String>,
    /// Name prefix; sandboxes are `<root_dir>/<prefix>_<suffix>`.
    pub prefix: String,
    /// Length of the random alphanumeric suffix (minimum 8).
    pub suffix_len: usize,
    /// Reject filenames that are absolute or contain `..` instead of only
    /// logging them.
    pub confine_paths: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            prefix: "ffmpeg_sandbox".into(),
            suffix_len: MIN_SUFFIX_LEN,
            confine_paths: false,
        }
    }
}

impl SandboxConfig {
    pub fn resolved_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.root_dir {
            Some(raw) => expand_path(raw),
            None => Ok(std::env::temp_dir()),
        }
    }

    pub fn effective_suffix_len(&self) -> usize {
        self.suffix_len.max(MIN_SUFFIX_LEN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Invocation token every command must start with.
    pub tool: String,
    /// Shell used to interpret command strings (`<shell> -c <command>`).
    pub shell: String,
    /// Kill the command after this many seconds. Unset means wait forever.
    pub timeout_secs: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tool: "ffmpeg".into(),
            shell: "sh".into(),
            timeout_secs: None,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TransferConfig {
    pub http_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: None,
            user_agent: format!("ffmpeg-sandbox/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Base URL of the Cloud Storage JSON API.
    pub base_url: String,
    /// OAuth bearer token. Falls back to `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub access_token: Option<String>,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.googleapis.com".into(),
            access_token: None,
        }
    }
}

impl ObjectStoreConfig {
    pub fn effective_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(OBJECT_STORE_TOKEN_ENV).ok())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body (base64 file content included).
    pub max_body_bytes: usize,
    pub request_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            max_body_bytes: 64 * 1024 * 1024,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Default config file location: `<config dir>/ffmpeg-sandbox/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ffmpeg-sandbox")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`. A file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load from an explicit path, or the default location when none is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(&expand_path(&p.to_string_lossy())?),
            None => match Self::default_path() {
                Some(p) => Self::load(&p),
                None => Ok(Self::default()),
            },
        }
    }

    /// JSON Schema of the config file.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Config)).unwrap_or_default()
    }
}

/// Expand `~` and `$VAR` in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ConfigError::Expand {
            raw: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_unbounded_and_permissive() {
        let cfg = Config::default();
        assert_eq!(cfg.executor.tool, "ffmpeg");
        assert!(cfg.executor.timeout().is_none());
        assert_eq!(cfg.sandbox.prefix, "ffmpeg_sandbox");
        assert_eq!(cfg.sandbox.effective_suffix_len(), 8);
        assert!(!cfg.sandbox.confine_paths);
        assert_eq!(cfg.sandbox.resolved_root().unwrap(), std::env::temp_dir());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = Config::parse(
            r#"
            [executor]
            timeout_secs = 30

            [gateway]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.executor.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.executor.tool, "ffmpeg");
        assert_eq!(cfg.gateway.port, 9000);
        assert_eq!(cfg.gateway.host, "127.0.0.1");
    }

    #[test]
    fn short_suffix_is_raised_to_minimum() {
        let cfg = Config::parse("[sandbox]\nsuffix_len = 3\n").unwrap();
        assert_eq!(cfg.sandbox.effective_suffix_len(), MIN_SUFFIX_LEN);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.gateway.port, 8080);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[executor\ntool = ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn root_dir_expands_env_vars() {
        std::env::set_var("FFMPEG_SANDBOX_TEST_ROOT", "/var/tmp/sbx");
        let cfg = Config::parse("[sandbox]\nroot_dir = \"$FFMPEG_SANDBOX_TEST_ROOT/work\"\n")
            .unwrap();
        assert_eq!(
            cfg.sandbox.resolved_root().unwrap(),
            PathBuf::from("/var/tmp/sbx/work")
        );
    }

    #[test]
    fn explicit_token_wins_over_env() {
        let cfg = ObjectStoreConfig {
            access_token: Some("from-config".into()),
            ..ObjectStoreConfig::default()
        };
        assert_eq!(cfg.effective_token().as_deref(), Some("from-config"));
    }

    #[test]
    fn schema_lists_sections() {
        let schema = Config::json_schema();
        let props = schema["properties"].as_object().unwrap();
        for section in ["sandbox", "executor", "transfer", "object_store", "gateway"] {
            assert!(props.contains_key(section), "missing {section}");
        }
    }
}
