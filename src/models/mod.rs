//! # Data Model
//!
//! Resources, per-resource results and run aggregates. Nothing here is
//! persisted; every value lives for a single invocation.

pub mod resource;
pub mod results;

pub use resource::{DiscoveredResource, ResourceAction};
pub use results::{HandlerResult, OrchestrationResult, ResourceStatus, ScalableCapacity};
