//! # Operation Results
//!
//! Per-resource outcomes and the aggregate of one orchestration run.

use super::resource::{DiscoveredResource, ResourceAction};
use crate::error::{ErrorKind, LightsOutError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Auto-scaling registration attached to a container service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalableCapacity {
    pub min_capacity: i32,
    pub max_capacity: i32,
}

/// Provider-agnostic snapshot of a resource's observed state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// Coarse provider status string, e.g. `ACTIVE` or `available`
    pub status: String,
    pub desired_count: Option<i32>,
    pub running_count: Option<i32>,
    pub is_stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<ScalableCapacity>,
}

impl ResourceStatus {
    pub fn summary(&self) -> String {
        match (self.desired_count, self.running_count) {
            (Some(desired), Some(running)) => format!(
                "{} (desired {desired}, running {running}{})",
                self.status,
                if self.is_stopped { ", stopped" } else { "" }
            ),
            _ => format!(
                "{}{}",
                self.status,
                if self.is_stopped { " (stopped)" } else { "" }
            ),
        }
    }
}

/// Outcome of one resource operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResult {
    pub success: bool,
    pub action: ResourceAction,
    pub resource_type: String,
    pub resource_id: String,
    /// Describes the observed transition, e.g. "Service scaled to 2 (was 0)"
    pub message: String,
    /// Original failure text; present iff `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<ResourceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl HandlerResult {
    pub fn success(
        action: ResourceAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            message: message.into(),
            error: None,
            error_kind: None,
            previous_state: None,
            region: None,
        }
    }

    pub fn failure(
        action: ResourceAction,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
        kind: ErrorKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            action,
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            message: message.into(),
            error: Some(error.into()),
            error_kind: Some(kind),
            previous_state: None,
            region: None,
        }
    }

    /// Failure for `resource` built from an error raised while processing it
    pub fn from_error(
        action: ResourceAction,
        resource: &DiscoveredResource,
        error: &LightsOutError,
    ) -> Self {
        Self::failure(
            action,
            &resource.resource_type,
            &resource.resource_id,
            format!("{} operation failed", capitalize(action.as_str())),
            error.kind(),
            error.to_string(),
        )
        .with_region(resource.region())
    }

    pub fn with_previous_state(mut self, state: ResourceStatus) -> Self {
        self.previous_state = Some(state);
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Aggregate of one run. `succeeded + failed == total == results.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub run_id: Uuid,
    pub action: ResourceAction,
    pub environment: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<HandlerResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl OrchestrationResult {
    /// Build the aggregate, deriving every count from `results`
    pub fn from_results(
        run_id: Uuid,
        action: ResourceAction,
        environment: impl Into<String>,
        results: Vec<HandlerResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let total = results.len();
        Self {
            run_id,
            action,
            environment: environment.into(),
            total,
            succeeded,
            failed: total - succeeded,
            results,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &HandlerResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
