//! Argument-vector construction for each CLI subcommand.
//!
//! Order is not significant to the CLI but is kept deterministic: content or
//! query first, then type/prompt/context, model, timeout, mcp-config, then
//! extra parameters in the order they were supplied. The program path itself
//! is not part of the vector; the executor owns it.

use crate::config::{EffectiveConfig, is_set};
use crate::error::{Error, Result};

/// Flags the builders emit themselves. Extra parameters must not collide
/// with these or the CLI would see duplicate flags.
pub const RESERVED_FLAGS: &[&str] = &["content", "type", "prompt", "model", "timeout", "mcp-config"];

/// Per-call inputs for an `analyze` invocation.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub content: String,
    /// Blank = omit `--type`.
    pub analysis_type: String,
    /// Blank = omit `--prompt`.
    pub custom_prompt: String,
    /// Overrides the effective default model when set.
    pub model: Option<String>,
    /// Overrides the effective timeout when set.
    pub timeout_seconds: Option<u64>,
    /// Passed through as `--<key> <value>` pairs, in order.
    pub extra_params: Vec<(String, String)>,
}

/// Per-call inputs for a `query` invocation.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub query: String,
    /// Blank = omit `--context`.
    pub context: String,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
}

fn resolved_model(override_model: &Option<String>, effective: &EffectiveConfig) -> String {
    match override_model {
        Some(m) if is_set(m) => m.trim().to_string(),
        _ => effective.default_model.clone(),
    }
}

fn resolved_timeout(override_secs: Option<u64>, effective: &EffectiveConfig) -> u64 {
    match override_secs {
        Some(secs) if secs > 0 => secs,
        _ => effective.timeout_seconds,
    }
}

/// Build the argv for `analyze`.
///
/// Fails only on a reserved-flag collision in `extra_params`.
pub fn analyze_args(effective: &EffectiveConfig, req: &AnalyzeRequest) -> Result<Vec<String>> {
    for (key, _) in &req.extra_params {
        if RESERVED_FLAGS.contains(&key.as_str()) {
            return Err(Error::ReservedParam(key.clone()));
        }
    }

    let mut args = vec!["analyze".to_string()];
    args.push("--content".into());
    args.push(req.content.clone());
    if is_set(&req.analysis_type) {
        args.push("--type".into());
        args.push(req.analysis_type.trim().to_string());
    }
    if is_set(&req.custom_prompt) {
        args.push("--prompt".into());
        args.push(req.custom_prompt.trim().to_string());
    }
    args.push("--model".into());
    args.push(resolved_model(&req.model, effective));
    args.push("--timeout".into());
    args.push(resolved_timeout(req.timeout_seconds, effective).to_string());
    if effective.enable_mcp_servers {
        args.push("--mcp-config".into());
        args.push(effective.config_file_path.clone());
    }
    for (key, value) in &req.extra_params {
        args.push(format!("--{key}"));
        args.push(value.clone());
    }
    Ok(args)
}

/// Build the argv for `query`.
pub fn query_args(effective: &EffectiveConfig, req: &QueryRequest) -> Vec<String> {
    let mut args = vec!["query".to_string(), "--query".into(), req.query.clone()];
    if is_set(&req.context) {
        args.push("--context".into());
        args.push(req.context.trim().to_string());
    }
    args.push("--model".into());
    args.push(resolved_model(&req.model, effective));
    args.push("--timeout".into());
    args.push(resolved_timeout(req.timeout_seconds, effective).to_string());
    args
}

/// Build the argv for `models list`.
pub fn models_list_args() -> Vec<String> {
    vec!["models".into(), "list".into()]
}

/// Build the argv for `mcp list`, optionally pointing at a config file.
pub fn mcp_list_args(config_path: Option<&str>) -> Vec<String> {
    let mut args = vec!["mcp".to_string(), "list".into()];
    if let Some(path) = config_path.filter(|p| is_set(p)) {
        args.push("--config".into());
        args.push(path.to_string());
    }
    args
}

/// Build the argv for the availability probe.
pub fn version_args() -> Vec<String> {
    vec!["--version".into()]
}
