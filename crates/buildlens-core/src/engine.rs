//! Caller-facing facade.
//!
//! Pipeline steps, builders, and chat handlers go through [`Engine`]: it
//! resolves the effective configuration, builds the argv, dispatches through
//! whatever [`Executor`] the caller supplies, and hands back typed results.
//! It never decides pipeline fate — a failed analysis is data for the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::command::{self, AnalyzeRequest, QueryRequest};
use crate::config::{EffectiveConfig, JobConfig};
use crate::download;
use crate::error::{Error, Result};
use crate::exec::{CommandSpec, ExecOutput, Executor, expand_home, probe_cli};
use crate::resolve::{FallbackPolicy, resolve};
use crate::store::ConfigStore;

/// Completed analysis run. `analysis` is the CLI's stdout; on failure the
/// caller logs `stderr` verbatim and chooses fatal vs. advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub analysis: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl AnalysisOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<ExecOutput> for AnalysisOutcome {
    fn from(out: ExecOutput) -> Self {
        Self {
            analysis: out.stdout,
            stderr: out.stderr,
            exit_code: out.exit_code,
        }
    }
}

/// The invocation engine: global store plus the fallback policy applied to
/// every resolution.
pub struct Engine {
    store: Arc<ConfigStore>,
    policy: FallbackPolicy,
}

impl Engine {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self::with_policy(store, FallbackPolicy::default())
    }

    pub fn with_policy(store: Arc<ConfigStore>, policy: FallbackPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Resolve the effective configuration for one invocation.
    pub fn effective(&self, job: Option<&JobConfig>) -> EffectiveConfig {
        resolve(&self.store.snapshot(), job, &self.policy)
    }

    fn spec_for<E: Executor>(
        executor: &E,
        effective: &EffectiveConfig,
        args: Vec<String>,
        timeout_override: Option<u64>,
        env: Vec<(String, String)>,
        work_dir: Option<PathBuf>,
    ) -> CommandSpec {
        let program = expand_home(&effective.cli_path, executor.home_dir().as_deref());
        let secs = timeout_override
            .filter(|s| *s > 0)
            .unwrap_or(effective.timeout_seconds);
        let mut spec =
            CommandSpec::new(program, args).env(env).timeout(Duration::from_secs(secs));
        if let Some(dir) = work_dir {
            spec = spec.work_dir(dir);
        }
        spec
    }

    /// Run `analyze`. A completed process is always `Ok`, success or not;
    /// only launch failure and timeout are errors.
    pub async fn analyze<E: Executor>(
        &self,
        executor: &E,
        job: Option<&JobConfig>,
        req: &AnalyzeRequest,
        env: Vec<(String, String)>,
        work_dir: Option<PathBuf>,
    ) -> Result<AnalysisOutcome> {
        let effective = self.effective(job);
        let args = command::analyze_args(&effective, req)?;
        let spec = Self::spec_for(executor, &effective, args, req.timeout_seconds, env, work_dir);
        let out = executor.run(spec).await?;
        if !out.success() {
            log::error!(
                "analysis CLI exited with code {} on {}: {}",
                out.exit_code,
                executor.node_name(),
                out.stderr.trim_end()
            );
        }
        Ok(out.into())
    }

    /// Run `query` and return the response text. Unlike analysis, a
    /// non-zero exit here is an error: there is no payload to hand back.
    pub async fn query<E: Executor>(
        &self,
        executor: &E,
        job: Option<&JobConfig>,
        req: &QueryRequest,
        env: Vec<(String, String)>,
        work_dir: Option<PathBuf>,
    ) -> Result<String> {
        let effective = self.effective(job);
        let args = command::query_args(&effective, req);
        let program = expand_home(&effective.cli_path, executor.home_dir().as_deref());
        let spec = Self::spec_for(executor, &effective, args, req.timeout_seconds, env, work_dir);
        let out = executor.run(spec).await?;
        if !out.success() {
            return Err(Error::CliFailure {
                program,
                code: out.exit_code,
                stderr: out.stderr,
            });
        }
        Ok(out.stdout)
    }

    /// Availability probe against the effective CLI path.
    pub async fn check_available<E: Executor>(&self, executor: &E, job: Option<&JobConfig>) -> bool {
        probe_cli(executor, &self.effective(job).cli_path).await
    }

    /// Model names for selection UIs (cached, see [`ConfigStore::models`]).
    pub async fn models<E: Executor>(&self, executor: &E) -> Vec<String> {
        self.store.models(executor).await
    }

    /// MCP server names for selection UIs (cached).
    pub async fn mcp_servers<E: Executor>(&self, executor: &E) -> Vec<String> {
        self.store.mcp_servers(executor).await
    }

    /// Download/refresh the CLI binary at the effective path on the issuing
    /// host, using the effective download URL and credentials.
    pub async fn update_cli(&self, job: Option<&JobConfig>) -> Result<()> {
        let effective = self.effective(job);
        let dest = expand_home(&effective.cli_path, dirs_next::home_dir().as_deref());
        download::download_cli(
            &effective.cli_download_url,
            &effective.cli_download_username,
            &effective.cli_download_password,
            Path::new(&dest),
        )
        .await
    }
}
