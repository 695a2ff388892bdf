//! TTL cache of loaded configurations, keyed by source path.
//!
//! Warm processes reuse a parsed configuration instead of re-reading the
//! document on every run.

use super::error::ConfigResult;
use super::{ConfigManager, LightsOutConfig};
use crate::constants::defaults;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
pub struct ConfigCache {
    ttl: Duration,
    entries: DashMap<PathBuf, (Arc<LightsOutConfig>, Instant)>,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(defaults::CONFIG_CACHE_TTL)
    }
}

impl ConfigCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Return the cached configuration for `path`, loading it when absent or expired
    pub fn get_or_load(&self, path: impl AsRef<Path>, environment: &str) -> ConfigResult<Arc<LightsOutConfig>> {
        let path = path.as_ref();

        if let Some(entry) = self.entries.get(path) {
            let (config, loaded_at) = entry.value();
            if loaded_at.elapsed() < self.ttl {
                debug!(path = %path.display(), "Configuration cache hit");
                return Ok(Arc::clone(config));
            }
        }

        let config = ConfigManager::load_from_path_with_env(path, environment)?.config();
        self.entries
            .insert(path.to_path_buf(), (Arc::clone(&config), Instant::now()));
        debug!(path = %path.display(), "Configuration cache refreshed");
        Ok(config)
    }

    pub fn invalidate(&self, path: impl AsRef<Path>) {
        self.entries.remove(path.as_ref());
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
