//! Argument parsing for the `buildlens` binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use buildlens_core::FallbackPolicy;

/// CI-side front end for the AI analysis CLI: resolves configuration,
/// invokes the tool, reports results.
#[derive(Debug, Parser)]
#[command(name = "buildlens", version, about)]
pub struct Cli {
    /// Global configuration file. Defaults to $BUILDLENS_HOME/config.toml,
    /// falling back to ~/.buildlens/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Job-tier configuration file (TOML with `use_job_config` gate).
    #[arg(long, global = true)]
    pub job_config: Option<PathBuf>,

    /// Which fields consult the global tier when the job tier is silent.
    #[arg(long, value_enum, default_value_t = PolicyArg::Final, global = true)]
    pub fallback_policy: PolicyArg,

    #[command(subcommand)]
    pub command: Command,
}

/// Fallback policy presets for the fields whose behavior drifted across
/// configuration revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Final source revision: only the API key falls back to global.
    Final,
    /// All switchable fields are job-only.
    JobOnly,
    /// All switchable fields fall back to global.
    Global,
}

impl PolicyArg {
    pub fn to_policy(self) -> FallbackPolicy {
        match self {
            PolicyArg::Final => FallbackPolicy::default(),
            PolicyArg::JobOnly => FallbackPolicy::job_only(),
            PolicyArg::Global => FallbackPolicy::global_fallback(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze content with the CLI and print the result.
    Analyze {
        /// Content to analyze. Mutually exclusive with --content-file.
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the content from a file.
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Analysis type (build_analysis, test_analysis, ...).
        #[arg(long = "type", default_value = "general")]
        analysis_type: String,

        /// Custom prompt passed through to the CLI.
        #[arg(long, default_value = "")]
        prompt: String,

        /// Model override for this call.
        #[arg(long)]
        model: Option<String>,

        /// Timeout override in seconds for this call.
        #[arg(long)]
        timeout: Option<u64>,

        /// Extra `--key value` flags, as key=value. Repeatable.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Wrap the content in a pipeline context block assembled from the
        /// CI environment (JOB_NAME, BUILD_NUMBER, ...). Secret-looking
        /// variables are filtered out.
        #[arg(long)]
        with_context: bool,

        /// Exit non-zero when the analysis fails instead of just warning.
        #[arg(long)]
        fail_on_error: bool,

        /// Working directory for the CLI process.
        #[arg(long)]
        workdir: Option<PathBuf>,
    },

    /// Ask the CLI a one-off question.
    Query {
        query: String,

        /// Additional context text.
        #[arg(long, default_value = "")]
        context: String,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List available models (TTL-cached per process lifetime).
    Models,

    /// List available MCP servers (CLI first, config-file fallback).
    McpServers,

    /// Probe whether the configured CLI is available.
    Check,

    /// Download the CLI binary from the configured URL.
    UpdateCli,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_analyze_with_params() {
        let cli = Cli::try_parse_from([
            "buildlens",
            "analyze",
            "--content",
            "build failed",
            "--type",
            "build_analysis",
            "--param",
            "verbose=true",
            "--param",
            "retries=2",
            "--fail-on-error",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                content,
                analysis_type,
                params,
                fail_on_error,
                ..
            } => {
                assert_eq!(content.as_deref(), Some("build failed"));
                assert_eq!(analysis_type, "build_analysis");
                assert_eq!(
                    params,
                    vec![
                        ("verbose".to_string(), "true".to_string()),
                        ("retries".to_string(), "2".to_string()),
                    ]
                );
                assert!(fail_on_error);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn content_and_content_file_conflict() {
        let err = Cli::try_parse_from([
            "buildlens",
            "analyze",
            "--content",
            "x",
            "--content-file",
            "/tmp/log",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn bad_param_syntax_is_rejected() {
        let err =
            Cli::try_parse_from(["buildlens", "analyze", "--content", "x", "--param", "noequals"])
                .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_query_with_overrides() {
        let cli = Cli::try_parse_from([
            "buildlens",
            "query",
            "why did it fail?",
            "--model",
            "gpt-4",
            "--timeout",
            "15",
        ])
        .unwrap();
        match cli.command {
            Command::Query {
                query,
                model,
                timeout,
                ..
            } => {
                assert_eq!(query, "why did it fail?");
                assert_eq!(model.as_deref(), Some("gpt-4"));
                assert_eq!(timeout, Some(15));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fallback_policy_presets_map_to_core_policies() {
        let cli =
            Cli::try_parse_from(["buildlens", "--fallback-policy", "global", "models"]).unwrap();
        assert_eq!(cli.fallback_policy.to_policy(), FallbackPolicy::global_fallback());

        let cli = Cli::try_parse_from(["buildlens", "models"]).unwrap();
        assert_eq!(cli.fallback_policy.to_policy(), FallbackPolicy::default());
    }
}
