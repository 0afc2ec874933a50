//! Config Store
//!
//! Holds the active snapshot. Readers clone the `Arc` once per evaluation;
//! a reload swaps the pointer, so in-flight evaluations finish on the
//! snapshot they started with. A rejected config leaves the old one active.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::RwLock;

use super::compiled::CompiledConfig;
use super::types::EngineConfig;
use crate::logic::error::ConfigError;
use crate::logic::forensics::RetryPolicy;

pub struct ConfigStore {
    current: RwLock<Arc<CompiledConfig>>,
    next_generation: AtomicU64,
    source: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Load from a JSON file that later `reload` calls re-read
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = EngineConfig::load_from_file(path)?;
        Self::build(config, Some(path.to_path_buf()))
    }

    fn build(config: EngineConfig, source: Option<PathBuf>) -> Result<Self, ConfigError> {
        let compiled = CompiledConfig::compile(config, 1)?;
        Ok(Self {
            current: RwLock::new(Arc::new(compiled)),
            next_generation: AtomicU64::new(2),
            source,
        })
    }

    pub fn current(&self) -> Arc<CompiledConfig> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Validate and swap in a new config; returns its generation
    pub fn replace(&self, config: EngineConfig) -> Result<u64, ConfigError> {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let compiled = match CompiledConfig::compile(config, generation) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!("Config rejected, keeping generation {}: {}", self.generation(), e);
                return Err(e);
            }
        };

        let mut current = self.current.write();
        // Two concurrent reloads: the later generation wins.
        if compiled.generation > current.generation {
            *current = Arc::new(compiled);
            info!("Config generation {} active", generation);
        }
        Ok(generation)
    }

    /// Re-read the source file
    pub fn reload(&self) -> Result<u64, ConfigError> {
        let path = self.source.as_deref().ok_or(ConfigError::NoSource)?;
        let config = match EngineConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config reload from {:?} failed, keeping generation {}: {}", path, self.generation(), e);
                return Err(e);
            }
        };
        self.replace(config)
    }

    /// `reload` with bounded retries, for files caught mid-write.
    /// `sleep` is called with each backoff delay.
    pub fn reload_with_backoff(
        &self,
        policy: &RetryPolicy,
        mut sleep: impl FnMut(Duration),
    ) -> Result<u64, ConfigError> {
        let mut attempt = 0;
        loop {
            match self.reload() {
                Ok(generation) => return Ok(generation),
                Err(ConfigError::NoSource) => return Err(ConfigError::NoSource),
                Err(e) if attempt >= policy.max_retries => {
                    warn!("Config reload gave up after {} retries: {}", attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    let delay = policy.backoff(attempt);
                    debug!("Config reload failed ({}), retry {} in {:?}", e, attempt, delay);
                    sleep(delay);
                }
            }
        }
    }
}
