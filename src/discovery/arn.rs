//! ARN parsing helpers shared by discovery implementations and handlers.
//!
//! Format: `arn:partition:service:region:account:resource`, where the
//! resource part may itself contain `/` or `:` separators.

use crate::constants::defaults;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    pub fn parse(arn: &str) -> Option<Self> {
        let mut parts = arn.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }
        let partition = parts.next()?.to_string();
        let service = parts.next()?.to_string();
        let region = parts.next()?.to_string();
        let account = parts.next()?.to_string();
        let resource = parts.next()?.to_string();
        if service.is_empty() || resource.is_empty() {
            return None;
        }

        Some(Self {
            partition,
            service,
            region,
            account,
            resource,
        })
    }
}

/// Provider resource type in `service:type` form, e.g. `ecs:service`.
/// Returns `unknown` for malformed ARNs.
pub fn provider_resource_type(arn: &str) -> String {
    let Some(parsed) = Arn::parse(arn) else {
        return "unknown".to_string();
    };
    let kind = parsed
        .resource
        .split(|c: char| c == '/' || c == ':')
        .next()
        .unwrap_or(parsed.resource.as_str());
    format!("{}:{}", parsed.service, kind)
}

/// Handler dispatch tag for a provider resource type (`ecs:service` → `ecs-service`)
pub fn internal_resource_type(provider_type: &str) -> String {
    provider_type.replace(':', "-")
}

/// Human-readable resource id plus handler metadata derived from the ARN
pub fn resource_id_and_metadata(
    arn: &str,
    provider_type: &str,
) -> (String, HashMap<String, serde_json::Value>) {
    let mut metadata = HashMap::new();
    let Some(parsed) = Arn::parse(arn) else {
        return (arn.to_string(), metadata);
    };
    let resource = parsed.resource.as_str();

    match provider_type {
        "ecs:service" => {
            let segments: Vec<&str> = resource.split('/').collect();
            let (cluster, id) = match segments.as_slice() {
                [.., cluster, service] if segments.len() >= 3 => {
                    (cluster.to_string(), format!("{cluster}/{service}"))
                }
                [_, service] => (defaults::ECS_CLUSTER.to_string(), service.to_string()),
                _ => (defaults::ECS_CLUSTER.to_string(), resource.to_string()),
            };
            metadata.insert("cluster_name".to_string(), serde_json::Value::String(cluster));
            (id, metadata)
        }
        "ec2:instance" => (last_segment(resource, '/').to_string(), metadata),
        "rds:db" | "rds:cluster" => (last_segment(resource, ':').to_string(), metadata),
        _ => (arn.to_string(), metadata),
    }
}

fn last_segment(s: &str, sep: char) -> &str {
    s.rsplit(sep).next().unwrap_or(s)
}
