//! # Notifications
//!
//! Best-effort delivery of the aggregated run report. The orchestrator calls
//! a [`Notifier`] at most once per start/stop run and only logs its errors.

use crate::config::NotificationConfig;
use crate::error::Result;
use crate::models::{HandlerResult, ResourceAction};
use tracing::{info, warn};

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send_aggregated(
        &self,
        sink: &NotificationConfig,
        results: &[HandlerResult],
        environment: &str,
        action: ResourceAction,
        trigger_source: Option<&str>,
    ) -> Result<()>;
}

/// Emits the aggregated report through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send_aggregated(
        &self,
        sink: &NotificationConfig,
        results: &[HandlerResult],
        environment: &str,
        action: ResourceAction,
        trigger_source: Option<&str>,
    ) -> Result<()> {
        let failed: Vec<&str> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.resource_id.as_str())
            .collect();
        let succeeded = results.len() - failed.len();

        if failed.is_empty() {
            info!(
                sink = %sink.kind,
                environment = %environment,
                action = %action,
                trigger_source = trigger_source,
                total = results.len(),
                succeeded = succeeded,
                "📣 LIGHTS_OUT_REPORT"
            );
        } else {
            warn!(
                sink = %sink.kind,
                environment = %environment,
                action = %action,
                trigger_source = trigger_source,
                total = results.len(),
                succeeded = succeeded,
                failed_resources = ?failed,
                "📣 LIGHTS_OUT_REPORT"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let sink = NotificationConfig {
            enabled: true,
            kind: "log".to_string(),
            webhook_url: None,
            trigger_source: None,
        };
        let results = vec![
            HandlerResult::success(ResourceAction::Stop, "ecs-service", "web/api", "ok"),
            HandlerResult::failure(
                ResourceAction::Stop,
                "rds-db",
                "orders",
                "Stop operation failed",
                ErrorKind::ApiError,
                "denied",
            ),
        ];
        LogNotifier
            .send_aggregated(&sink, &results, "test", ResourceAction::Stop, Some("schedule"))
            .await
            .unwrap();
    }
}
