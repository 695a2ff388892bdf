//! # Discovered Resources
//!
//! The unit of work for one orchestration run. Built fresh by discovery on
//! every run and never mutated afterwards.

use crate::constants::{defaults, tags};
use crate::discovery::arn::{self, Arn};
use crate::error::LightsOutError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Operation requested for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Start,
    Stop,
    Status,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Start => "start",
            ResourceAction::Stop => "stop",
            ResourceAction::Status => "status",
        }
    }

    /// Whether the action changes provider-side state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ResourceAction::Status)
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceAction {
    type Err = LightsOutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ResourceAction::Start),
            "stop" => Ok(ResourceAction::Stop),
            "status" => Ok(ResourceAction::Status),
            other => Err(LightsOutError::Configuration(format!(
                "Invalid action '{other}'. Valid actions: start, stop, status"
            ))),
        }
    }
}

/// A managed cloud resource eligible for an action.
///
/// Lower `priority` starts first and stops last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    /// Handler dispatch tag, e.g. `ecs-service`
    pub resource_type: String,
    pub arn: String,
    /// Human-readable id, e.g. `cluster/service`
    pub resource_id: String,
    pub priority: u32,
    pub group: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DiscoveredResource {
    pub fn new(
        resource_type: impl Into<String>,
        arn: impl Into<String>,
        resource_id: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            arn: arn.into(),
            resource_id: resource_id.into(),
            priority,
            group: defaults::GROUP.to_string(),
            tags: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build a resource from a tagged ARN as returned by a tagging API.
    ///
    /// Priority and group come from the `lights-out:*` tags; the type tag, id
    /// and handler metadata are derived from the ARN.
    pub fn from_tagged_arn(arn: &str, tags: HashMap<String, String>) -> Self {
        let provider_type = arn::provider_resource_type(arn);
        let (resource_id, metadata) = arn::resource_id_and_metadata(arn, &provider_type);
        let priority = priority_from_tags(&tags, arn);
        let group = tags
            .get(tags::GROUP)
            .cloned()
            .unwrap_or_else(|| defaults::GROUP.to_string());

        Self {
            resource_type: arn::internal_resource_type(&provider_type),
            arn: arn.to_string(),
            resource_id,
            priority,
            group,
            tags,
            metadata,
        }
    }

    /// Region encoded in the ARN, if any
    pub fn region(&self) -> Option<String> {
        Arn::parse(&self.arn)
            .map(|a| a.region)
            .filter(|r| !r.is_empty())
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

fn priority_from_tags(tags: &HashMap<String, String>, arn: &str) -> u32 {
    match tags.get(tags::PRIORITY) {
        None => defaults::PRIORITY,
        Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
            warn!(
                arn = %arn,
                priority = %raw,
                "Invalid priority tag, falling back to default {}",
                defaults::PRIORITY
            );
            defaults::PRIORITY
        }),
    }
}
