// buildlens: CI front end for the AI analysis CLI.
// Resolves layered configuration, invokes the tool, reports results.

mod cli;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use buildlens_core::{
    AnalysisContext, AnalyzeRequest, ConfigStore, Engine, Error, JobConfig, LocalExecutor,
    QueryRequest,
};
use cli::{Cli, Command};

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("BUILDLENS_HOME") {
        return PathBuf::from(home).join("config.toml");
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".buildlens")
        .join("config.toml")
}

/// Assemble a pipeline context from the standard CI environment variables.
/// Sensitive variables are filtered during rendering, not here.
fn pipeline_context(content: String) -> AnalysisContext {
    AnalysisContext {
        job_name: std::env::var("JOB_NAME").unwrap_or_default(),
        build_number: std::env::var("BUILD_NUMBER").ok().and_then(|v| v.parse().ok()),
        build_status: std::env::var("BUILD_STATUS").unwrap_or_default(),
        stage_name: std::env::var("STAGE_NAME").unwrap_or_default(),
        step_name: String::new(),
        workspace_path: std::env::var("WORKSPACE").unwrap_or_default(),
        environment: std::env::vars().collect(),
        recent_logs: Vec::new(),
        content,
    }
}

fn load_job_config(path: &PathBuf) -> buildlens_core::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Cli::parse();

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("buildlens: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(args: Cli) -> buildlens_core::Result<i32> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    log::debug!("global configuration at {}", config_path.display());
    let store = ConfigStore::load(config_path)?;
    let engine = Engine::with_policy(Arc::new(store), args.fallback_policy.to_policy());

    let job = match &args.job_config {
        Some(path) => Some(load_job_config(path)?),
        None => None,
    };
    let job = job.as_ref();
    let executor = LocalExecutor::new();

    match args.command {
        Command::Analyze {
            content,
            content_file,
            analysis_type,
            prompt,
            model,
            timeout,
            params,
            with_context,
            fail_on_error,
            workdir,
        } => {
            let content = match (content, content_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?,
                (None, None) => "No specific content provided for analysis.".to_string(),
            };
            let content = if with_context {
                pipeline_context(content).build_focused_context(&analysis_type)
            } else {
                content
            };
            let req = AnalyzeRequest {
                content,
                analysis_type,
                custom_prompt: prompt,
                model,
                timeout_seconds: timeout,
                extra_params: params,
            };

            let outcome = engine.analyze(&executor, job, &req, Vec::new(), workdir).await?;
            if outcome.success() {
                print!("{}", outcome.analysis);
                Ok(0)
            } else {
                // Stderr goes to the build log verbatim; the exit code is
                // the caller's choice.
                eprint!("{}", outcome.stderr);
                if fail_on_error {
                    eprintln!("buildlens: analysis failed with exit code {}", outcome.exit_code);
                    Ok(1)
                } else {
                    eprintln!(
                        "buildlens: analysis failed with exit code {} (continuing)",
                        outcome.exit_code
                    );
                    Ok(0)
                }
            }
        }

        Command::Query {
            query,
            context,
            model,
            timeout,
        } => {
            let req = QueryRequest {
                query,
                context,
                model,
                timeout_seconds: timeout,
            };
            let response = engine.query(&executor, job, &req, Vec::new(), None).await?;
            print!("{response}");
            Ok(0)
        }

        Command::Models => {
            for model in engine.models(&executor).await {
                println!("{model}");
            }
            Ok(0)
        }

        Command::McpServers => {
            let servers = engine.mcp_servers(&executor).await;
            if servers.is_empty() {
                eprintln!("buildlens: no MCP servers found");
            }
            for server in servers {
                println!("{server}");
            }
            Ok(0)
        }

        Command::Check => {
            let effective = engine.effective(job);
            if engine.check_available(&executor, job).await {
                println!("CLI available at {}", effective.cli_path);
                Ok(0)
            } else {
                println!("CLI not available at {}", effective.cli_path);
                Ok(1)
            }
        }

        Command::UpdateCli => {
            engine.update_cli(job).await?;
            println!("CLI updated");
            Ok(0)
        }
    }
}
