//! Precedence engine: job tier over global tier over built-in defaults.
//!
//! Pure functions over immutable inputs. Absence (blank string, zero
//! timeout, empty list) always degrades to the next tier; nothing here
//! errors or panics.

use crate::config::{CliConfig, ConfigDefaults, EffectiveConfig, JobConfig, is_set};

/// Whether a field consults the global tier when the job tier doesn't
/// supply it.
///
/// The source history flip-flopped on this for a handful of fields, so it
/// is policy rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFallback {
    /// Job tier or bust: absent job value resolves to the field's empty
    /// sentinel (empty string / empty list / `false`).
    JobOnly,
    /// Absent job value falls through to global, then the built-in default.
    GlobalFallback,
}

/// Per-field fallback switches for the fields whose behavior drifted across
/// configuration revisions. All other fields always fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub default_model: FieldFallback,
    pub enable_mcp_servers: FieldFallback,
    pub api_key: FieldFallback,
    pub selected_mcp_servers: FieldFallback,
}

impl Default for FallbackPolicy {
    /// Matches the final configuration revision: only the API key keeps a
    /// global fallback.
    fn default() -> Self {
        Self {
            default_model: FieldFallback::JobOnly,
            enable_mcp_servers: FieldFallback::JobOnly,
            api_key: FieldFallback::GlobalFallback,
            selected_mcp_servers: FieldFallback::JobOnly,
        }
    }
}

impl FallbackPolicy {
    /// Every switchable field consults the global tier.
    pub fn global_fallback() -> Self {
        Self {
            default_model: FieldFallback::GlobalFallback,
            enable_mcp_servers: FieldFallback::GlobalFallback,
            api_key: FieldFallback::GlobalFallback,
            selected_mcp_servers: FieldFallback::GlobalFallback,
        }
    }

    /// Every switchable field is job-only.
    pub fn job_only() -> Self {
        Self {
            default_model: FieldFallback::JobOnly,
            enable_mcp_servers: FieldFallback::JobOnly,
            api_key: FieldFallback::JobOnly,
            selected_mcp_servers: FieldFallback::JobOnly,
        }
    }
}

/// Resolve a string field: job tier (already gated), then global, then the
/// built-in default.
macro_rules! tiered_str {
    ($job:expr, $global:expr, $field:ident, $default:expr) => {
        match $job {
            Some(j) if is_set(&j.$field) => j.$field.trim().to_string(),
            _ if is_set(&$global.$field) => $global.$field.trim().to_string(),
            _ => $default.to_string(),
        }
    };
}

/// Compute the effective configuration for one invocation.
///
/// `job` is the raw job tier; its fields are ignored entirely unless
/// `use_job_config` is set.
pub fn resolve(
    global: &CliConfig,
    job: Option<&JobConfig>,
    policy: &FallbackPolicy,
) -> EffectiveConfig {
    // Gate the job tier once; everything below sees Some only when the job
    // opted in.
    let job = job.filter(|j| j.use_job_config).map(|j| &j.config);

    let default_model = match policy.default_model {
        FieldFallback::GlobalFallback => {
            tiered_str!(job, global, default_model, ConfigDefaults::MODEL)
        }
        FieldFallback::JobOnly => job
            .filter(|j| is_set(&j.default_model))
            .map(|j| j.default_model.trim().to_string())
            .unwrap_or_default(),
    };

    let api_key = match policy.api_key {
        FieldFallback::GlobalFallback => {
            tiered_str!(job, global, api_key, ConfigDefaults::API_KEY)
        }
        FieldFallback::JobOnly => job
            .filter(|j| is_set(&j.api_key))
            .map(|j| j.api_key.trim().to_string())
            .unwrap_or_default(),
    };

    let enable_mcp_servers = match (policy.enable_mcp_servers, job) {
        // Booleans have no "unset" sentinel: an opted-in job tier always
        // decides.
        (_, Some(j)) => j.enable_mcp_servers,
        (FieldFallback::GlobalFallback, None) => global.enable_mcp_servers,
        (FieldFallback::JobOnly, None) => false,
    };

    let selected_mcp_servers = match job.filter(|j| !j.selected_mcp_servers.is_empty()) {
        Some(j) => j.selected_mcp_servers.clone(),
        None => match policy.selected_mcp_servers {
            FieldFallback::GlobalFallback => global.selected_mcp_servers.clone(),
            FieldFallback::JobOnly => Vec::new(),
        },
    };

    let timeout_seconds = match job.filter(|j| j.timeout_seconds > 0) {
        Some(j) => j.timeout_seconds,
        None if global.timeout_seconds > 0 => global.timeout_seconds,
        None => ConfigDefaults::TIMEOUT_SECONDS,
    };

    EffectiveConfig {
        cli_path: tiered_str!(job, global, cli_path, ConfigDefaults::CLI_PATH),
        cli_download_url: tiered_str!(job, global, cli_download_url, ""),
        cli_download_username: tiered_str!(job, global, cli_download_username, ""),
        cli_download_password: tiered_str!(job, global, cli_download_password, ""),
        config_file_path: tiered_str!(
            job,
            global,
            config_file_path,
            ConfigDefaults::CONFIG_FILE_PATH
        ),
        default_model,
        timeout_seconds,
        enable_mcp_servers,
        api_key,
        selected_mcp_servers,
    }
}
