//! # Container Service Handler
//!
//! Scales a container service between its running and stopped desired counts.
//!
//! ## Scaling modes
//!
//! The mode is chosen per operation by probing for a scalable target:
//!
//! - **Direct**: the desired count is set from `default_desired_count` (start)
//!   or the configured stop behavior (stop).
//! - **Auto-scaling**: the service is registered with an autoscaler and an
//!   `auto_scaling` triple is configured. The scalable-target bounds are
//!   re-registered alongside the desired count so the autoscaler cannot undo
//!   the change. A service already at the target count whose bounds differ
//!   still gets its bounds registered. An invalid triple, a missing target or
//!   a failed probe falls back to direct mode.
//!
//! ## Wait for stable
//!
//! With `wait_for_stable`, the handler polls every `poll_interval` (at least
//! 15 seconds) until the running count matches the target, bounded by
//! `stable_timeout_seconds`. Failed polls are retried until the deadline.
//! What a timeout reports is set by `on_stable_timeout`.

use super::clients::{ClientProvider, ContainerServiceApi, ServiceDescription};
use super::ResourceHandler;
use crate::config::{AutoScalingDefaults, EcsServiceDefaults, LightsOutConfig, StableTimeoutPolicy};
use crate::constants::{defaults, resource_types};
use crate::error::{ErrorKind, Result};
use crate::models::{DiscoveredResource, HandlerResult, ResourceAction, ResourceStatus, ScalableCapacity};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalingMode {
    Direct,
    AutoScaling {
        current: ScalableCapacity,
        configured: AutoScalingDefaults,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StableOutcome {
    Stable,
    TimedOut { last_error: Option<String> },
}

pub struct EcsServiceHandler {
    resource: DiscoveredResource,
    cluster: String,
    service: String,
    settings: EcsServiceDefaults,
    client: Arc<dyn ContainerServiceApi>,
}

impl std::fmt::Debug for EcsServiceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcsServiceHandler")
            .field("resource_id", &self.resource.resource_id)
            .field("cluster", &self.cluster)
            .field("service", &self.service)
            .finish()
    }
}

impl EcsServiceHandler {
    /// Build a handler using the region-scoped client for the resource's ARN
    pub fn new(resource: &DiscoveredResource, config: &LightsOutConfig, clients: &dyn ClientProvider) -> Self {
        let region = resource.region();
        let client = clients.container_service(region.as_deref());
        Self::with_client(
            resource.clone(),
            config.resource_defaults.ecs_service.clone(),
            client,
        )
    }

    pub fn with_client(
        resource: DiscoveredResource,
        settings: EcsServiceDefaults,
        client: Arc<dyn ContainerServiceApi>,
    ) -> Self {
        let cluster = resource
            .metadata_str("cluster_name")
            .unwrap_or(defaults::ECS_CLUSTER)
            .to_string();
        let service = service_name(&resource.resource_id).to_string();

        Self {
            resource,
            cluster,
            service,
            settings,
            client,
        }
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    async fn describe(&self) -> Result<ServiceDescription> {
        Ok(self.client.describe_service(&self.cluster, &self.service).await?)
    }

    async fn scaling_mode(&self) -> ScalingMode {
        let Some(configured) = self.settings.auto_scaling else {
            return ScalingMode::Direct;
        };

        if !configured.is_valid() {
            warn!(
                cluster = %self.cluster,
                service = %self.service,
                min_capacity = configured.min_capacity,
                max_capacity = configured.max_capacity,
                desired_count = configured.desired_count,
                "Invalid auto-scaling settings (expected min <= desired <= max), using direct mode"
            );
            return ScalingMode::Direct;
        }

        match self.client.describe_scalable_target(&self.cluster, &self.service).await {
            Ok(Some(current)) => ScalingMode::AutoScaling { current, configured },
            Ok(None) => ScalingMode::Direct,
            Err(e) => {
                warn!(
                    cluster = %self.cluster,
                    service = %self.service,
                    error = %e,
                    "Scalable target probe failed, using direct mode"
                );
                ScalingMode::Direct
            }
        }
    }

    fn snapshot(description: &ServiceDescription, capacity: Option<ScalableCapacity>) -> ResourceStatus {
        ResourceStatus {
            status: description.status.clone(),
            desired_count: Some(description.desired_count),
            running_count: Some(description.running_count),
            is_stopped: description.desired_count == 0,
            capacity,
        }
    }

    fn current_capacity(mode: ScalingMode) -> Option<ScalableCapacity> {
        match mode {
            ScalingMode::AutoScaling { current, .. } => Some(current),
            ScalingMode::Direct => None,
        }
    }

    /// Bounds to register for `action`, or `None` in direct mode
    fn bounds_for(action: ResourceAction, mode: ScalingMode, target: i32) -> Option<ScalableCapacity> {
        let ScalingMode::AutoScaling { current, configured } = mode else {
            return None;
        };
        let (min_capacity, max_capacity) = match action {
            ResourceAction::Start => (configured.min_capacity, configured.max_capacity),
            _ => (current.min_capacity.min(target), target),
        };
        Some(ScalableCapacity {
            min_capacity,
            max_capacity,
        })
    }

    #[instrument(skip(self), fields(cluster = %self.cluster, service = %self.service))]
    async fn scale(&self, action: ResourceAction) -> Result<HandlerResult> {
        let current = self.describe().await?;
        let mode = self.scaling_mode().await;
        let registered = Self::current_capacity(mode);
        let previous = Self::snapshot(&current, registered);

        let target = match (action, mode) {
            (ResourceAction::Start, ScalingMode::AutoScaling { configured, .. }) => configured.desired_count,
            (ResourceAction::Start, ScalingMode::Direct) => self.settings.default_desired_count,
            _ => self.settings.stop_behavior.target(current.desired_count),
        };
        // Only bounds that differ from the registered ones need re-registering
        let bounds = Self::bounds_for(action, mode, target).filter(|b| Some(*b) != registered);
        let count_matches = current.desired_count == target;

        debug!(
            action = %action,
            current_desired = current.desired_count,
            target = target,
            auto_scaling = matches!(mode, ScalingMode::AutoScaling { .. }),
            bounds_pending = bounds.is_some(),
            stop_mode = self.settings.stop_behavior.mode_name(),
            "Computed target desired count"
        );

        if count_matches && bounds.is_none() {
            let message = if action == ResourceAction::Stop && target == 0 {
                "Service already stopped".to_string()
            } else {
                format!("Service already at desired count {target}")
            };
            info!(action = %action, desired_count = target, "{message}");
            return Ok(self.success(action, message).with_previous_state(previous));
        }

        if let Some(bounds) = bounds {
            self.client
                .register_scalable_target(
                    &self.cluster,
                    &self.service,
                    bounds.min_capacity,
                    bounds.max_capacity,
                )
                .await?;
            debug!(
                min_capacity = bounds.min_capacity,
                max_capacity = bounds.max_capacity,
                "Scalable target bounds registered"
            );
        }

        if count_matches {
            let message = format!("Service scaling bounds reset at desired count {target}");
            info!(action = %action, desired_count = target, "{message}");
            return Ok(self.success(action, message).with_previous_state(previous));
        }

        self.client
            .update_desired_count(&self.cluster, &self.service, target)
            .await?;

        let mut message = format!("Service scaled to {target} (was {})", current.desired_count);
        info!(
            action = %action,
            previous_desired = current.desired_count,
            desired_count = target,
            "Service desired count updated"
        );

        if self.settings.wait_for_stable {
            let timeout = self.settings.stable_timeout();
            if let StableOutcome::TimedOut { last_error } = self.wait_for_stable(target, timeout).await {
                match self.settings.on_stable_timeout {
                    StableTimeoutPolicy::Fail => {
                        let mut error =
                            format!("Service did not stabilize at {target} within {}s", timeout.as_secs());
                        if let Some(last_error) = last_error {
                            error.push_str(&format!(" (last poll error: {last_error})"));
                        }
                        return Ok(HandlerResult::failure(
                            action,
                            &self.resource.resource_type,
                            &self.resource.resource_id,
                            message,
                            ErrorKind::Timeout,
                            error,
                        )
                        .with_previous_state(previous)
                        .with_region(self.resource.region()));
                    }
                    StableTimeoutPolicy::Warn => {
                        message.push_str(&format!("; not stable after {}s", timeout.as_secs()));
                    }
                }
            }
        }

        Ok(self.success(action, message).with_previous_state(previous))
    }

    /// Poll until `running == desired == target`, bounded by `timeout`.
    ///
    /// The scaling call has already been applied, so a failed poll is logged
    /// and retried on the next tick rather than failing the operation.
    async fn wait_for_stable(&self, target: i32, timeout: Duration) -> StableOutcome {
        let interval = self.settings.poll_interval();
        let deadline = Instant::now() + timeout;
        let mut last_error = None;
        debug!(
            target = target,
            timeout_secs = timeout.as_secs(),
            interval_secs = interval.as_secs(),
            "Waiting for service to stabilize"
        );

        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(target = target, timeout_secs = timeout.as_secs(), "Service did not stabilize in time");
                return StableOutcome::TimedOut { last_error };
            }
            tokio::time::sleep(interval.min(deadline - now)).await;

            match self.describe().await {
                Ok(observed) if observed.running_count == target && observed.desired_count == target => {
                    info!(running_count = observed.running_count, "Service reached stable state");
                    return StableOutcome::Stable;
                }
                Ok(observed) => {
                    last_error = None;
                    debug!(
                        desired_count = observed.desired_count,
                        running_count = observed.running_count,
                        "Service not yet stable"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Stability poll failed, retrying");
                    last_error = Some(e.to_string());
                }
            }
        }
    }

    fn success(&self, action: ResourceAction, message: String) -> HandlerResult {
        HandlerResult::success(
            action,
            &self.resource.resource_type,
            &self.resource.resource_id,
            message,
        )
        .with_region(self.resource.region())
    }
}

#[async_trait::async_trait]
impl ResourceHandler for EcsServiceHandler {
    fn resource_type(&self) -> &str {
        resource_types::ECS_SERVICE
    }

    fn resource_id(&self) -> &str {
        &self.resource.resource_id
    }

    async fn get_status(&self) -> Result<ResourceStatus> {
        let description = self.describe().await?;
        let capacity = self
            .client
            .describe_scalable_target(&self.cluster, &self.service)
            .await
            .ok()
            .flatten();
        Ok(Self::snapshot(&description, capacity))
    }

    async fn start(&self) -> Result<HandlerResult> {
        self.scale(ResourceAction::Start).await
    }

    async fn stop(&self) -> Result<HandlerResult> {
        self.scale(ResourceAction::Stop).await
    }

    async fn is_ready(&self) -> bool {
        match self.describe().await {
            Ok(d) => d.running_count == d.desired_count,
            Err(e) => {
                debug!(service = %self.service, error = %e, "Readiness probe failed");
                false
            }
        }
    }
}

/// `cluster/service` or bare `service`
fn service_name(resource_id: &str) -> &str {
    resource_id.rsplit('/').next().unwrap_or(resource_id)
}
