//! Tiered configuration model.
//!
//! Two tiers exist at runtime: the process-wide global configuration
//! (persisted by [`crate::store::ConfigStore`]) and an optional per-job
//! override tier gated by `use_job_config`. Resolution into an
//! [`EffectiveConfig`] lives in [`crate::resolve`].

use serde::{Deserialize, Serialize};

/// Built-in defaults applied when neither the job nor the global tier
/// supplies a value.
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const CLI_PATH: &'static str = "~/.local/bin/codex";
    pub const CONFIG_FILE_PATH: &'static str = "~/.codex/config.toml";
    pub const TIMEOUT_SECONDS: u64 = 120;
    pub const MODEL: &'static str = "kimi-k2";
    pub const API_KEY: &'static str = "sk-1234";
}

/// One configuration tier (global or job). Empty strings and a zero timeout
/// mean "unset" so resolution falls through to the next tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Path to the analysis CLI binary. `~/` expands against the home
    /// directory of the node that runs the command.
    pub cli_path: String,
    /// Optional URL for downloading/updating the CLI binary.
    pub cli_download_url: String,
    pub cli_download_username: String,
    pub cli_download_password: String,
    /// Path to the CLI's own TOML config (also the MCP fallback source).
    pub config_file_path: String,
    pub default_model: String,
    /// 0 = unset.
    pub timeout_seconds: u64,
    pub enable_mcp_servers: bool,
    pub api_key: String,
    /// Names referencing [`crate::mcp::McpServerConfig`] entries. Order is
    /// preserved; tiers never merge.
    pub selected_mcp_servers: Vec<String>,
}

/// Job-scoped configuration. Its fields only take effect when
/// `use_job_config` is set; otherwise the whole tier is transparent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub use_job_config: bool,
    #[serde(flatten)]
    pub config: CliConfig,
}

impl JobConfig {
    /// A job tier that overrides nothing.
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// The resolved, read-only snapshot consumed by one invocation. Never
/// persisted; computed on demand by [`crate::resolve::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub cli_path: String,
    pub cli_download_url: String,
    pub cli_download_username: String,
    pub cli_download_password: String,
    pub config_file_path: String,
    /// May be empty under a job-only fallback policy.
    pub default_model: String,
    pub timeout_seconds: u64,
    pub enable_mcp_servers: bool,
    pub api_key: String,
    pub selected_mcp_servers: Vec<String>,
}

/// True when a string field counts as "set" for precedence purposes.
pub(crate) fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}
