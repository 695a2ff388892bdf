//! # Resource Handlers
//!
//! One handler instance per discovered resource per run. Handlers are
//! independent of each other and hold no cross-resource state.
//!
//! ## Contract
//!
//! - `get_status` is read-only.
//! - `start` / `stop` read the current state first and return success without
//!   any mutating call when the resource is already at its target.
//! - `is_ready` never fails; read errors map to `false`.
//! - Errors returned from `get_status`, `start` or `stop` are recorded against
//!   the resource by the orchestrator with their text preserved.

pub mod clients;
pub mod ecs_service;
pub mod rds_instance;

use crate::error::Result;
use crate::models::{HandlerResult, ResourceStatus};

pub use clients::{
    ClientProvider, ContainerServiceApi, DatabaseApi, DbInstanceDescription, ProviderResult,
    ServiceDescription, SharedClients, StopDbInstanceRequest, UnconfiguredClients,
};
pub use ecs_service::EcsServiceHandler;
pub use rds_instance::RdsInstanceHandler;

#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    fn resource_type(&self) -> &str;

    fn resource_id(&self) -> &str;

    async fn get_status(&self) -> Result<ResourceStatus>;

    async fn start(&self) -> Result<HandlerResult>;

    async fn stop(&self) -> Result<HandlerResult>;

    async fn is_ready(&self) -> bool;
}
