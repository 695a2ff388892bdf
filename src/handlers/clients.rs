//! # Provider Client Seam
//!
//! Narrow async contracts for the provider control-plane calls the handlers
//! make. Concrete SDK bindings implement these outside the crate; tests use
//! in-memory fakes.

use crate::error::ProviderError;
use crate::models::ScalableCapacity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Observed state of a container service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Coarse status, e.g. `ACTIVE`, `DRAINING`
    pub status: String,
    pub desired_count: i32,
    pub running_count: i32,
}

#[async_trait::async_trait]
pub trait ContainerServiceApi: Send + Sync {
    async fn describe_service(&self, cluster: &str, service: &str) -> ProviderResult<ServiceDescription>;

    async fn update_desired_count(&self, cluster: &str, service: &str, desired_count: i32) -> ProviderResult<()>;

    /// Registered auto-scaling bounds, or `None` when the service is not a scalable target
    async fn describe_scalable_target(
        &self,
        cluster: &str,
        service: &str,
    ) -> ProviderResult<Option<ScalableCapacity>>;

    async fn register_scalable_target(
        &self,
        cluster: &str,
        service: &str,
        min_capacity: i32,
        max_capacity: i32,
    ) -> ProviderResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbInstanceDescription {
    pub identifier: String,
    /// Lowercase availability string, e.g. `available`, `stopped`
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDbInstanceRequest {
    pub identifier: String,
    pub skip_final_snapshot: bool,
}

#[async_trait::async_trait]
pub trait DatabaseApi: Send + Sync {
    async fn describe_db_instance(&self, identifier: &str) -> ProviderResult<DbInstanceDescription>;

    async fn start_db_instance(&self, identifier: &str) -> ProviderResult<()>;

    async fn stop_db_instance(&self, request: StopDbInstanceRequest) -> ProviderResult<()>;
}

/// Hands out region-scoped provider clients.
///
/// `None` means the runtime's own region.
pub trait ClientProvider: Send + Sync {
    fn container_service(&self, region: Option<&str>) -> Arc<dyn ContainerServiceApi>;

    fn database(&self, region: Option<&str>) -> Arc<dyn DatabaseApi>;
}

/// Provider that returns the same clients for every region
pub struct SharedClients {
    container_service: Arc<dyn ContainerServiceApi>,
    database: Arc<dyn DatabaseApi>,
}

impl SharedClients {
    pub fn new(container_service: Arc<dyn ContainerServiceApi>, database: Arc<dyn DatabaseApi>) -> Self {
        Self {
            container_service,
            database,
        }
    }
}

impl ClientProvider for SharedClients {
    fn container_service(&self, _region: Option<&str>) -> Arc<dyn ContainerServiceApi> {
        Arc::clone(&self.container_service)
    }

    fn database(&self, _region: Option<&str>) -> Arc<dyn DatabaseApi> {
        Arc::clone(&self.database)
    }
}

/// Placeholder provider used when no clients were supplied; every call fails.
pub struct UnconfiguredClients;

const UNCONFIGURED: &str = "No provider client configured";

#[async_trait::async_trait]
impl ContainerServiceApi for UnconfiguredClients {
    async fn describe_service(&self, _cluster: &str, _service: &str) -> ProviderResult<ServiceDescription> {
        Err(ProviderError::api(UNCONFIGURED))
    }

    async fn update_desired_count(&self, _cluster: &str, _service: &str, _desired: i32) -> ProviderResult<()> {
        Err(ProviderError::api(UNCONFIGURED))
    }

    async fn describe_scalable_target(
        &self,
        _cluster: &str,
        _service: &str,
    ) -> ProviderResult<Option<ScalableCapacity>> {
        Err(ProviderError::api(UNCONFIGURED))
    }

    async fn register_scalable_target(
        &self,
        _cluster: &str,
        _service: &str,
        _min_capacity: i32,
        _max_capacity: i32,
    ) -> ProviderResult<()> {
        Err(ProviderError::api(UNCONFIGURED))
    }
}

#[async_trait::async_trait]
impl DatabaseApi for UnconfiguredClients {
    async fn describe_db_instance(&self, _identifier: &str) -> ProviderResult<DbInstanceDescription> {
        Err(ProviderError::api(UNCONFIGURED))
    }

    async fn start_db_instance(&self, _identifier: &str) -> ProviderResult<()> {
        Err(ProviderError::api(UNCONFIGURED))
    }

    async fn stop_db_instance(&self, _request: StopDbInstanceRequest) -> ProviderResult<()> {
        Err(ProviderError::api(UNCONFIGURED))
    }
}

impl ClientProvider for UnconfiguredClients {
    fn container_service(&self, _region: Option<&str>) -> Arc<dyn ContainerServiceApi> {
        Arc::new(UnconfiguredClients)
    }

    fn database(&self, _region: Option<&str>) -> Arc<dyn DatabaseApi> {
        Arc::new(UnconfiguredClients)
    }
}
