//! Persistent global configuration and the discovery caches.
//!
//! One [`ConfigStore`] exists per process: loaded at startup, mutated only
//! through [`ConfigStore::update`], shared behind an `Arc`. Locks are held
//! for the copy or swap only — never across a subprocess await.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use crate::cache::{LIST_CACHE_TTL, ListCache};
use crate::config::CliConfig;
use crate::error::{Error, Result};
use crate::exec::Executor;
use crate::fetch;
use crate::resolve::{FallbackPolicy, resolve};
use crate::safe_io;

/// Owns the persisted global tier plus the two TTL caches for discovered
/// lists.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: RwLock<CliConfig>,
    models: RwLock<ListCache>,
    mcp_servers: RwLock<ListCache>,
}

impl ConfigStore {
    /// Load from a TOML file. A missing file yields defaults (first run);
    /// an unreadable or invalid file is a hard configuration error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CliConfig::default(),
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            config: RwLock::new(config),
            models: RwLock::new(ListCache::new()),
            mcp_servers: RwLock::new(ListCache::new()),
        })
    }

    /// Copy of the current global tier.
    pub fn snapshot(&self) -> CliConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Administrative save: mutate the global tier and persist it
    /// atomically. The in-memory tier only changes after the file write
    /// succeeds, so a failed save leaves memory and disk in agreement.
    pub fn update<F: FnOnce(&mut CliConfig)>(&self, f: F) -> Result<()> {
        let mut updated = self.snapshot();
        f(&mut updated);
        let serialized = toml::to_string_pretty(&updated)
            .map_err(|e| Error::Config(format!("cannot serialize configuration: {e}")))?;
        safe_io::atomic_write_text(&self.path, &serialized)?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = updated;
        Ok(())
    }

    /// CLI path resolved from the global tier alone (discovery runs outside
    /// any job).
    fn global_cli_path(&self) -> String {
        resolve(&self.snapshot(), None, &FallbackPolicy::default()).cli_path
    }

    fn global_config_file_path(&self) -> String {
        resolve(&self.snapshot(), None, &FallbackPolicy::default()).config_file_path
    }

    /// Model names for selection UIs: fresh cache hit, else refresh through
    /// the CLI, else stale items, else the built-in options.
    pub async fn models<E: Executor>(&self, executor: &E) -> Vec<String> {
        let (cached, fresh) = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(LIST_CACHE_TTL);
        if fresh {
            return cached;
        }

        match fetch::fetch_models(executor, &self.global_cli_path()).await {
            Ok(models) if !models.is_empty() => {
                self.models
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .put(models.clone());
                models
            }
            Ok(_) => {
                log::warn!("model discovery returned nothing usable");
                if cached.is_empty() {
                    fetch::default_model_options()
                } else {
                    cached
                }
            }
            Err(e) => {
                log::warn!("model discovery failed: {e}");
                if cached.is_empty() {
                    fetch::default_model_options()
                } else {
                    cached
                }
            }
        }
    }

    /// MCP server names for selection UIs. Same shape as [`models`](Self::models)
    /// but with no built-in fallback list: an empty result is advisory.
    pub async fn mcp_servers<E: Executor>(&self, executor: &E) -> Vec<String> {
        let (cached, fresh) = self
            .mcp_servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(LIST_CACHE_TTL);
        if fresh {
            return cached;
        }

        let cli_path = self.global_cli_path();
        let config_path = self.global_config_file_path();
        match fetch::fetch_mcp_servers(executor, &cli_path, &config_path).await {
            Ok(servers) if !servers.is_empty() => {
                self.mcp_servers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .put(servers.clone());
                servers
            }
            Ok(_) => cached,
            Err(e) => {
                log::warn!("MCP server discovery failed: {e}");
                cached
            }
        }
    }
}
