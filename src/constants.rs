//! # System Constants
//!
//! Tag keys, resource-type tags and operational defaults shared across
//! discovery, handlers and the orchestrator.

use std::time::Duration;

/// Tag keys read from provider resources
pub mod tags {
    pub const PRIORITY: &str = "lights-out:priority";
    pub const GROUP: &str = "lights-out:group";
    pub const MANAGED: &str = "lights-out:managed";
}

/// Internal resource-type tags used for handler dispatch
pub mod resource_types {
    pub const ECS_SERVICE: &str = "ecs-service";
    pub const RDS_DB: &str = "rds-db";
    pub const RDS_CLUSTER: &str = "rds-cluster";
    pub const EC2_INSTANCE: &str = "ec2-instance";
}

/// Default and boundary values
pub mod defaults {
    use super::Duration;

    pub const PRIORITY: u32 = 50;
    pub const GROUP: &str = "default";
    pub const ECS_CLUSTER: &str = "default";
    pub const ENVIRONMENT: &str = "development";

    pub const ECS_DESIRED_COUNT: i32 = 1;
    pub const ECS_STABLE_TIMEOUT_SECONDS: u64 = 300;

    /// Floor for the wait-for-stable poll interval
    pub const MIN_STABLE_POLL_INTERVAL: Duration = Duration::from_secs(15);

    pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);
}

/// Environment variables consulted by logging and configuration loading
pub mod env {
    pub const ENVIRONMENT: &str = "LIGHTS_OUT_ENV";
    pub const ENVIRONMENT_FALLBACK: &str = "APP_ENV";
    pub const LOG_FORMAT: &str = "LIGHTS_OUT_LOG_FORMAT";
    pub const CONFIG_PATH: &str = "LIGHTS_OUT_CONFIG_PATH";
}
