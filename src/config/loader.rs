//! Configuration Loader
//!
//! Environment-aware loading of the run configuration from YAML or JSON.
//! A document may carry an `environments` section; the entry matching the
//! active environment is merged over the base document before deserializing.

use super::error::{ConfigResult, ConfigurationError};
use super::LightsOutConfig;
use crate::constants::env;
use crate::logging::get_environment;
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ENVIRONMENTS_KEY: &str = "environments";
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// `.json` is JSON; anything else is treated as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Loads and validates [`LightsOutConfig`] documents
pub struct ConfigManager {
    config: Arc<LightsOutConfig>,
    environment: String,
    source: String,
}

impl ConfigManager {
    /// Load from the path named by `LIGHTS_OUT_CONFIG_PATH`
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var(env::CONFIG_PATH).map_err(|_| {
            ConfigurationError::missing_required_field(env::CONFIG_PATH, "process environment")
        })?;
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let environment = get_environment();
        Self::load_from_path_with_env(path, &environment)
    }

    /// Load from a file with an explicit environment.
    /// Useful for tests that must not touch process environment variables.
    pub fn load_from_path_with_env(path: impl AsRef<Path>, environment: &str) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = Self::read_config_file_safely(path)?;
        let source = path.display().to_string();
        let config = Self::parse_with_env(&content, ConfigFormat::from_path(path), &source, environment)?;

        info!(
            source = %source,
            environment = %environment,
            config_environment = %config.environment,
            strategy = ?config.orchestration.strategy,
            "Configuration loaded successfully"
        );
        debug!(config = %Self::sanitize_config_for_logging(&config), "Effective configuration");

        Ok(Self {
            config: Arc::new(config),
            environment: environment.to_string(),
            source,
        })
    }

    /// Parse a document without environment overrides
    pub fn parse(content: &str, format: ConfigFormat, source: &str) -> ConfigResult<LightsOutConfig> {
        let value = Self::to_yaml_value(content, format, source)?;
        Self::finish(value, source)
    }

    /// Parse a document, merging the `environments.<environment>` section over the base
    pub fn parse_with_env(
        content: &str,
        format: ConfigFormat,
        source: &str,
        environment: &str,
    ) -> ConfigResult<LightsOutConfig> {
        let mut value = Self::to_yaml_value(content, format, source)?;

        let overrides = value
            .get(ENVIRONMENTS_KEY)
            .and_then(|envs| envs.get(environment))
            .cloned();
        if let Some(overrides) = overrides {
            debug!(environment = %environment, "Applying environment-specific overrides");
            Self::merge_yaml_values(&mut value, overrides);
        }

        Self::finish(value, source)
    }

    pub fn config(&self) -> Arc<LightsOutConfig> {
        Arc::clone(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn to_yaml_value(content: &str, format: ConfigFormat, source: &str) -> ConfigResult<YamlValue> {
        match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ConfigurationError::invalid_document(source, e)),
            ConfigFormat::Json => {
                let json: serde_json::Value = serde_json::from_str(content)
                    .map_err(|e| ConfigurationError::invalid_document(source, e))?;
                serde_yaml::to_value(json).map_err(|e| ConfigurationError::invalid_document(source, e))
            }
        }
    }

    fn finish(mut value: YamlValue, source: &str) -> ConfigResult<LightsOutConfig> {
        if let YamlValue::Mapping(ref mut map) = value {
            map.remove(ENVIRONMENTS_KEY);
        }
        // An empty document yields defaults
        if value.is_null() {
            value = YamlValue::Mapping(Default::default());
        }

        let config: LightsOutConfig = serde_yaml::from_value(value).map_err(|e| {
            ConfigurationError::invalid_document(source, format!("Failed to deserialize configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                *base_ref = override_val;
            }
        }
    }

    fn read_config_file_safely(path: &Path) -> ConfigResult<String> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigurationError::config_file_not_found(vec![PathBuf::from(path)])
            } else {
                ConfigurationError::file_read_error(path.display().to_string(), e)
            }
        })?;

        if !metadata.is_file() {
            return Err(ConfigurationError::invalid_value(
                "file_type",
                "directory or special file",
                "Configuration path must point to a regular file",
            ));
        }

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigurationError::invalid_value(
                "file_size",
                metadata.len(),
                format!("Configuration file exceeds {MAX_CONFIG_FILE_SIZE} bytes"),
            ));
        }

        std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))
    }

    /// JSON view of the configuration with sink credentials masked
    pub fn sanitize_config_for_logging(config: &LightsOutConfig) -> serde_json::Value {
        let mut value = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
        Self::sanitize_json_recursive(&mut value, &["webhook", "secret", "token", "password"]);
        value
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns.iter().any(|p| key_lower.contains(p));
                    if is_sensitive && !val.is_null() {
                        *val = serde_json::Value::String("[MASKED]".to_string());
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
