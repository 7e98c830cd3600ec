//! buildlens-core: configuration resolution and CLI invocation for
//! AI-assisted build analysis.
//!
//! A CI pipeline hands this crate content to analyze plus optional per-job
//! overrides; the crate resolves the effective configuration (job over
//! global over built-in defaults), builds the analysis CLI's argument
//! vector, runs it with a hard deadline on whatever node the caller's
//! [`Executor`] targets, and returns typed results. Discovery of model and
//! MCP-server lists runs on a separate, TTL-cached path used only for
//! selection UIs.
//!
//! # Quick start
//!
//! ```no_run
//! use buildlens_core::{AnalyzeRequest, ConfigStore, Engine, LocalExecutor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ConfigStore::load("/etc/buildlens/config.toml")?;
//!     let engine = Engine::new(Arc::new(store));
//!
//!     let req = AnalyzeRequest {
//!         content: "build log text".into(),
//!         analysis_type: "build_analysis".into(),
//!         ..Default::default()
//!     };
//!     let outcome = engine
//!         .analyze(&LocalExecutor::new(), None, &req, Vec::new(), None)
//!         .await?;
//!     println!("{}", outcome.analysis);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod command;
pub mod config;
pub mod context;
pub mod download;
pub mod engine;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod mcp;
pub mod resolve;
pub mod safe_io;
pub mod store;

// Re-export commonly used types
pub use command::{AnalyzeRequest, QueryRequest, RESERVED_FLAGS};
pub use config::{CliConfig, ConfigDefaults, EffectiveConfig, JobConfig};
pub use context::{AnalysisContext, is_sensitive_var};
pub use engine::{AnalysisOutcome, Engine};
pub use error::{Error, Result};
pub use exec::{CommandSpec, ExecOutput, Executor, LocalExecutor, expand_home, probe_cli};
pub use mcp::{McpServerConfig, McpTransport};
pub use resolve::{FallbackPolicy, FieldFallback, resolve};
pub use store::ConfigStore;
