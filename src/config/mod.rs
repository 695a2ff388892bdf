//! # Lights-Out Configuration
//!
//! Typed model of the run configuration. The orchestrator treats a loaded
//! [`LightsOutConfig`] as immutable for the duration of a run.
//!
//! ## Structure
//!
//! ```yaml
//! version: "1.0"
//! environment: workshop
//! discovery:
//!   tag_filters:
//!     lights-out:managed: "true"
//!   resource_types: ["ecs:service", "rds:db"]
//! region_groups:
//!   primary: [ap-southeast-1]
//!   dr: [us-west-2]
//! active_region_group: primary
//! resource_defaults:
//!   ecs-service:
//!     wait_for_stable: true
//!     stable_timeout_seconds: 300
//!     default_desired_count: 2
//!     stop_behavior:
//!       mode: reduce_by_count
//!       count: 1
//!   rds-db:
//!     skip_final_snapshot: true
//! orchestration:
//!   strategy: grouped_parallel
//!   max_concurrency: 8
//!   on_group_failure: continue
//! notifications:
//!   enabled: true
//!   kind: webhook
//!   webhook_url: https://hooks.example.com/lights-out
//! ```

pub mod cache;
pub mod error;
pub mod loader;

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub use cache::ConfigCache;
pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigFormat, ConfigManager};

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightsOutConfig {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Legacy flat region list; empty means the runtime's own region
    #[serde(default)]
    pub regions: Vec<String>,

    /// Named region groups, iterated in name order
    #[serde(default)]
    pub region_groups: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub active_region_group: Option<String>,

    #[serde(default)]
    pub resource_defaults: ResourceDefaults,

    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_environment() -> String {
    defaults::ENVIRONMENT.to_string()
}

impl Default for LightsOutConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            environment: default_environment(),
            discovery: DiscoveryConfig::default(),
            regions: Vec::new(),
            region_groups: BTreeMap::new(),
            active_region_group: None,
            resource_defaults: ResourceDefaults::default(),
            orchestration: OrchestrationConfig::default(),
            notifications: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub tag_filters: HashMap<String, String>,
    #[serde(default)]
    pub resource_types: Vec<String>,
}

impl DiscoveryConfig {
    /// Discovery only runs when both filter sets are non-empty
    pub fn is_configured(&self) -> bool {
        !self.tag_filters.is_empty() && !self.resource_types.is_empty()
    }
}

/// Per-resource-type handler defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefaults {
    #[serde(rename = "ecs-service", default)]
    pub ecs_service: EcsServiceDefaults,
    #[serde(rename = "rds-db", default)]
    pub rds_db: RdsDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsServiceDefaults {
    pub wait_for_stable: bool,
    pub stable_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    /// Start target in direct mode
    pub default_desired_count: i32,
    /// Start target in auto-scaling mode
    pub auto_scaling: Option<AutoScalingDefaults>,
    pub stop_behavior: StopBehavior,
    pub on_stable_timeout: StableTimeoutPolicy,
}

impl Default for EcsServiceDefaults {
    fn default() -> Self {
        Self {
            wait_for_stable: false,
            stable_timeout_seconds: defaults::ECS_STABLE_TIMEOUT_SECONDS,
            poll_interval_seconds: defaults::MIN_STABLE_POLL_INTERVAL.as_secs(),
            default_desired_count: defaults::ECS_DESIRED_COUNT,
            auto_scaling: None,
            stop_behavior: StopBehavior::default(),
            on_stable_timeout: StableTimeoutPolicy::default(),
        }
    }
}

impl EcsServiceDefaults {
    pub fn stable_timeout(&self) -> Duration {
        Duration::from_secs(self.stable_timeout_seconds)
    }

    /// Poll interval, never below the provider-friendly floor
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds).max(defaults::MIN_STABLE_POLL_INTERVAL)
    }
}

/// `(min, max, desired)` capacity triple for services under an autoscaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScalingDefaults {
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub desired_count: i32,
}

impl AutoScalingDefaults {
    /// `0 <= min <= desired <= max`
    pub fn is_valid(&self) -> bool {
        self.min_capacity >= 0
            && self.min_capacity <= self.desired_count
            && self.desired_count <= self.max_capacity
    }
}

/// How the stop target is derived from the current desired count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StopBehavior {
    #[default]
    ScaleToZero,
    ReduceByCount { count: i32 },
    ReduceToCount { count: i32 },
}

impl StopBehavior {
    /// Target desired count for a service currently at `current`. Never negative.
    pub fn target(&self, current: i32) -> i32 {
        match *self {
            StopBehavior::ScaleToZero => 0,
            StopBehavior::ReduceByCount { count } => current.saturating_sub(count).max(0),
            StopBehavior::ReduceToCount { count } => count.max(0),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            StopBehavior::ScaleToZero => "scale_to_zero",
            StopBehavior::ReduceByCount { .. } => "reduce_by_count",
            StopBehavior::ReduceToCount { .. } => "reduce_to_count",
        }
    }
}

/// Outcome reported when wait-for-stable runs out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StableTimeoutPolicy {
    /// Report the operation as failed with a `Timeout` error
    #[default]
    Fail,
    /// Report success, noting in the message that convergence was not observed
    Warn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RdsDefaults {
    /// Fixed delay after a start/stop call; not a convergence poll
    pub wait_after_command_seconds: u64,
    /// Passed through to the stop call
    pub skip_final_snapshot: bool,
}

impl RdsDefaults {
    pub fn wait_after_command(&self) -> Duration {
        Duration::from_secs(self.wait_after_command_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    Sequential,
    Parallel,
    #[default]
    #[serde(alias = "grouped-parallel")]
    GroupedParallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFailurePolicy {
    /// Keep going with later priority groups
    #[default]
    Continue,
    /// Skip every later group once a group reports a failure
    Halt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub strategy: ExecutionStrategy,
    /// Ceiling on concurrently running resource operations
    pub max_concurrency: Option<usize>,
    pub on_group_failure: GroupFailurePolicy,
}

/// Descriptor of the operator-facing report sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_notification_kind")]
    pub kind: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub trigger_source: Option<String>,
}

fn default_notification_kind() -> String {
    "log".to_string()
}

impl LightsOutConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        ConfigManager::parse(yaml, ConfigFormat::Yaml, "inline")
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        ConfigManager::parse(json, ConfigFormat::Json, "inline")
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications.as_ref().is_some_and(|n| n.enabled)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.environment.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "environment",
                "root configuration",
            ));
        }

        if let Some(0) = self.orchestration.max_concurrency {
            return Err(ConfigurationError::invalid_value(
                "orchestration.max_concurrency",
                0,
                "concurrency ceiling must be at least 1",
            ));
        }

        if let Some(name) = self.region_groups.keys().find(|k| k.trim().is_empty()) {
            return Err(ConfigurationError::invalid_value(
                "region_groups",
                format!("{name:?}"),
                "region group names must be non-empty",
            ));
        }

        let ecs = &self.resource_defaults.ecs_service;
        if ecs.stable_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "resource_defaults.ecs-service.stable_timeout_seconds",
                0,
                "timeout must be greater than 0",
            ));
        }
        if ecs.default_desired_count < 0 {
            return Err(ConfigurationError::invalid_value(
                "resource_defaults.ecs-service.default_desired_count",
                ecs.default_desired_count,
                "desired count cannot be negative",
            ));
        }
        match ecs.stop_behavior {
            StopBehavior::ReduceByCount { count } | StopBehavior::ReduceToCount { count }
                if count < 0 =>
            {
                return Err(ConfigurationError::invalid_value(
                    "resource_defaults.ecs-service.stop_behavior.count",
                    count,
                    "count cannot be negative",
                ));
            }
            _ => {}
        }

        if let Some(notifications) = &self.notifications {
            if notifications.enabled
                && notifications.kind != "log"
                && notifications.webhook_url.as_deref().unwrap_or("").is_empty()
            {
                return Err(ConfigurationError::missing_required_field(
                    "notifications.webhook_url",
                    format!("'{}' notification sink", notifications.kind),
                ));
            }
        }

        if let Some(group) = &self.active_region_group {
            if !self.region_groups.contains_key(group) {
                tracing::warn!(
                    active_region_group = %group,
                    "Active region group is not defined; region resolution will fall through"
                );
            }
        }

        Ok(())
    }
}
