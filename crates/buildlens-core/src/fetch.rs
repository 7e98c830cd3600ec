//! Remote list discovery: models and MCP servers via the CLI.
//!
//! Output parsing is intentionally forgiving — the CLI prints free-text
//! tables, so anything that isn't a plausible identifier slug is skipped.
//! An empty MCP result falls back to scanning the CLI's own config file;
//! only a non-zero exit is an error.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use crate::command::{mcp_list_args, models_list_args};
use crate::error::{Error, Result};
use crate::exec::{CommandSpec, Executor, expand_home};
use crate::mcp;

/// Deadline for discovery calls. Shorter than analysis: these feed selection
/// UIs and must not stall a config page.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-/_A-Za-z0-9]+$").expect("static regex"))
}

/// Parse free-text list output into clean item names.
///
/// Drops blank lines, `Available ...` banners, column headers starting with
/// `Model` or `Server`, and `-`-prefixed separator rows. Keeps lines without
/// internal whitespace that look like an identifier or slug.
pub fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Available")
                && !line.starts_with("Model")
                && !line.starts_with("Server")
                && !line.starts_with('-')
                && slug_regex().is_match(line)
        })
        .map(str::to_string)
        .collect()
}

/// The source's built-in model options, used only to populate selection UIs
/// when both the cache and the CLI come up empty. Never the analysis path.
pub fn default_model_options() -> Vec<String> {
    [
        "kimi-k2",
        "gpt-4",
        "gpt-4-turbo",
        "gpt-3.5-turbo",
        "claude-3-opus",
        "claude-3-sonnet",
        "claude-3-haiku",
        "gemini-pro",
        "gemini-pro-vision",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Run `<cli> models list` on the given node and parse the output.
pub async fn fetch_models<E: Executor>(executor: &E, cli_path: &str) -> Result<Vec<String>> {
    let program = expand_home(cli_path, executor.home_dir().as_deref());
    let spec = CommandSpec::new(program.clone(), models_list_args()).timeout(FETCH_TIMEOUT);
    let out = executor.run(spec).await?;
    if !out.success() {
        return Err(Error::CliFailure {
            program,
            code: out.exit_code,
            stderr: out.stderr,
        });
    }
    let models = parse_name_list(&out.combined());
    log::debug!(
        "fetched {} models from '{}' on {}",
        models.len(),
        cli_path,
        executor.node_name()
    );
    Ok(models)
}

/// Run `<cli> mcp list --config <path>` and parse the output, falling back
/// to the config file's `[mcp.servers.*]` tables when the CLI lists nothing.
pub async fn fetch_mcp_servers<E: Executor>(
    executor: &E,
    cli_path: &str,
    config_path: &str,
) -> Result<Vec<String>> {
    let home = executor.home_dir();
    let program = expand_home(cli_path, home.as_deref());
    let config = expand_home(config_path, home.as_deref());

    let spec = CommandSpec::new(program.clone(), mcp_list_args(Some(&config))).timeout(FETCH_TIMEOUT);
    let out = executor.run(spec).await?;
    if !out.success() {
        return Err(Error::CliFailure {
            program,
            code: out.exit_code,
            stderr: out.stderr,
        });
    }

    let servers = parse_name_list(&out.combined());
    if !servers.is_empty() {
        return Ok(servers);
    }

    let fallback = mcp::server_names_from_file(Path::new(&config));
    if fallback.is_empty() {
        log::warn!("no MCP servers found via '{cli_path}' or in {config}");
    } else {
        log::debug!("{} MCP servers found via config fallback", fallback.len());
    }
    Ok(fallback)
}
