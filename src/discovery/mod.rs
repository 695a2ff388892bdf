//! # Resource Discovery
//!
//! Contract for the collaborator that enumerates managed resources. Concrete
//! tagging-API implementations live outside this crate; [`StaticDiscovery`]
//! serves local runs and tests.

pub mod arn;
pub mod static_discovery;

use crate::error::Result;
use crate::models::DiscoveredResource;
use std::collections::HashMap;

pub use static_discovery::StaticDiscovery;

/// Filters handed to a discovery implementation for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryRequest {
    pub tag_filters: HashMap<String, String>,
    /// Provider resource types, e.g. `ecs:service`, `rds:db`
    pub resource_types: Vec<String>,
    /// Empty means the runtime's own region
    pub regions: Vec<String>,
}

#[async_trait::async_trait]
pub trait Discovery: Send + Sync {
    /// Return every managed resource matching `request`.
    ///
    /// An error here aborts the whole run.
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredResource>>;
}
