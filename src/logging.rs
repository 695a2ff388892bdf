//! # Structured Logging Module
//!
//! Environment-aware structured logging. Console output by default, JSON lines
//! when `LIGHTS_OUT_LOG_FORMAT=json` so log aggregators can index the fields.

use crate::constants::{defaults, env};
use crate::models::{HandlerResult, OrchestrationResult, ResourceAction};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let json = std::env::var(env::LOG_FORMAT)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A subscriber may already be installed by the host process
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var(env::ENVIRONMENT)
        .or_else(|_| std::env::var(env::ENVIRONMENT_FALLBACK))
        .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" | "prod" => "info",
        _ => "debug",
    }
}

/// Log the outcome of a single resource operation
pub fn log_resource_operation(result: &HandlerResult, priority: u32) {
    if result.success {
        tracing::info!(
            action = %result.action,
            resource_type = %result.resource_type,
            resource_id = %result.resource_id,
            region = result.region.as_deref(),
            priority = priority,
            message = %result.message,
            "✅ RESOURCE_OPERATION"
        );
    } else {
        tracing::warn!(
            action = %result.action,
            resource_type = %result.resource_type,
            resource_id = %result.resource_id,
            region = result.region.as_deref(),
            priority = priority,
            error_kind = ?result.error_kind,
            error = result.error.as_deref(),
            "❌ RESOURCE_OPERATION"
        );
    }
}

/// Log the aggregate counts of a finished run
pub fn log_orchestration_summary(result: &OrchestrationResult) {
    let level_is_warn = result.failed > 0 && result.action != ResourceAction::Status;
    if level_is_warn {
        tracing::warn!(
            run_id = %result.run_id,
            action = %result.action,
            environment = %result.environment,
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            "📋 ORCHESTRATION_SUMMARY"
        );
    } else {
        tracing::info!(
            run_id = %result.run_id,
            action = %result.action,
            environment = %result.environment,
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            "📋 ORCHESTRATION_SUMMARY"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("workshop"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
