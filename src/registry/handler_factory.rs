//! # Handler Factory
//!
//! Explicit registry from resource-type tag to handler constructor.
//!
//! ## Overview
//!
//! The orchestrator asks the factory for one handler per discovered resource.
//! Unknown types yield `None`, which the orchestrator records as a
//! `HANDLER_NOT_FOUND` failure for that resource only.
//!
//! ## Usage
//!
//! ```rust
//! use lights_out::config::LightsOutConfig;
//! use lights_out::handlers::UnconfiguredClients;
//! use lights_out::models::DiscoveredResource;
//! use lights_out::registry::HandlerFactory;
//! use std::sync::Arc;
//!
//! let factory = HandlerFactory::with_defaults();
//! let clients: Arc<dyn lights_out::handlers::ClientProvider> = Arc::new(UnconfiguredClients);
//! let resource = DiscoveredResource::new(
//!     "rds-db",
//!     "arn:aws:rds:us-east-1:123456789012:db:orders",
//!     "orders",
//!     10,
//! );
//!
//! let handler = factory.get_handler(&resource, &LightsOutConfig::default(), &clients);
//! assert!(handler.is_some());
//! ```

use crate::config::LightsOutConfig;
use crate::constants::resource_types;
use crate::handlers::{ClientProvider, EcsServiceHandler, RdsInstanceHandler, ResourceHandler};
use crate::models::DiscoveredResource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a handler for one resource
pub type HandlerConstructor = Arc<
    dyn Fn(&DiscoveredResource, &LightsOutConfig, &Arc<dyn ClientProvider>) -> Box<dyn ResourceHandler>
        + Send
        + Sync,
>;

pub struct HandlerFactory {
    constructors: RwLock<HashMap<String, HandlerConstructor>>,
}

impl Default for HandlerFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for HandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFactory")
            .field("registered_types", &self.registered_types())
            .finish()
    }
}

impl HandlerFactory {
    /// Factory with no registered types
    pub fn empty() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// Factory with the built-in container-service and database handlers
    pub fn with_defaults() -> Self {
        let factory = Self::empty();
        factory.register(resource_types::ECS_SERVICE, |resource, config, clients| {
            Box::new(EcsServiceHandler::new(resource, config, &**clients))
        });
        factory.register(resource_types::RDS_DB, |resource, config, clients| {
            Box::new(RdsInstanceHandler::new(resource, config, &**clients))
        });
        factory
    }

    /// Register (or replace) the constructor for `resource_type`
    pub fn register<F>(&self, resource_type: impl Into<String>, constructor: F)
    where
        F: Fn(&DiscoveredResource, &LightsOutConfig, &Arc<dyn ClientProvider>) -> Box<dyn ResourceHandler>
            + Send
            + Sync
            + 'static,
    {
        let resource_type = resource_type.into();
        let replaced = self
            .constructors
            .write()
            .insert(resource_type.clone(), Arc::new(constructor))
            .is_some();
        info!(resource_type = %resource_type, replaced = replaced, "Registered resource handler");
    }

    /// Handler for `resource`, or `None` when its type is not registered
    pub fn get_handler(
        &self,
        resource: &DiscoveredResource,
        config: &LightsOutConfig,
        clients: &Arc<dyn ClientProvider>,
    ) -> Option<Box<dyn ResourceHandler>> {
        // Clone out of the lock so constructors never run under it
        let constructor = self.constructors.read().get(&resource.resource_type).cloned();
        match constructor {
            Some(construct) => Some(construct(resource, config, clients)),
            None => {
                debug!(resource_type = %resource.resource_type, "No handler registered");
                None
            }
        }
    }

    pub fn is_registered(&self, resource_type: &str) -> bool {
        self.constructors.read().contains_key(resource_type)
    }

    /// Registered type tags, sorted
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.read().keys().cloned().collect();
        types.sort();
        types
    }
}
