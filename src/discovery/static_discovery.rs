//! In-memory discovery over a fixed resource list.

use super::{arn, Discovery, DiscoveryRequest};
use crate::error::Result;
use crate::models::DiscoveredResource;
use parking_lot::RwLock;
use tracing::debug;

/// Discovery backed by a fixed list that still honours the request filters
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    resources: RwLock<Vec<DiscoveredResource>>,
}

impl StaticDiscovery {
    pub fn new(resources: Vec<DiscoveredResource>) -> Self {
        Self {
            resources: RwLock::new(resources),
        }
    }

    pub fn push(&self, resource: DiscoveredResource) {
        self.resources.write().push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    fn matches(resource: &DiscoveredResource, request: &DiscoveryRequest) -> bool {
        let tags_match = request
            .tag_filters
            .iter()
            .all(|(key, value)| resource.tags.get(key) == Some(value));

        // Accept both `ecs:service` and `ecs-service` spellings
        let type_match = request.resource_types.iter().any(|t| {
            t == &resource.resource_type || arn::internal_resource_type(t) == resource.resource_type
        });

        let region_match = request.regions.is_empty()
            || resource
                .region()
                .map(|r| request.regions.contains(&r))
                .unwrap_or(false);

        tags_match && type_match && region_match
    }
}

#[async_trait::async_trait]
impl Discovery for StaticDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredResource>> {
        let found: Vec<DiscoveredResource> = self
            .resources
            .read()
            .iter()
            .filter(|r| Self::matches(r, request))
            .cloned()
            .collect();

        debug!(
            candidates = self.len(),
            matched = found.len(),
            regions = ?request.regions,
            "Static discovery completed"
        );
        Ok(found)
    }
}
