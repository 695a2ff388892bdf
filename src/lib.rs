#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lights-Out Core
//!
//! Stateless orchestration engine that starts and stops tagged cloud
//! resources outside working hours.
//!
//! ## Overview
//!
//! One invocation is one run: discover the managed resources, order them by
//! priority, drive each through its type-specific handler and aggregate the
//! outcomes into an [`OrchestrationResult`]. No state survives between runs;
//! the resources themselves are the source of truth.
//!
//! ## Module Organization
//!
//! - [`config`] - Typed configuration, YAML/JSON loading, TTL cache
//! - [`discovery`] - Discovery contract, ARN parsing, in-memory discovery
//! - [`handlers`] - Resource handler contract, provider client seam, built-in handlers
//! - [`registry`] - Resource-type to handler dispatch
//! - [`orchestration`] - Region resolution, planning and batched execution
//! - [`notifications`] - Aggregated report delivery
//! - [`models`] - Resources, results and run aggregates
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Ordering
//!
//! Lower priority numbers start first and stop last. Under the default
//! grouped-parallel strategy, resources sharing a priority run concurrently
//! and a priority group finishes completely before the next one begins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lights_out::config::LightsOutConfig;
//! use lights_out::discovery::StaticDiscovery;
//! use lights_out::models::ResourceAction;
//! use lights_out::orchestration::Orchestrator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! lights_out::logging::init_structured_logging();
//!
//! let config = Arc::new(LightsOutConfig::from_yaml(
//!     r#"
//! environment: workshop
//! discovery:
//!   tag_filters:
//!     lights-out:managed: "true"
//!   resource_types: ["ecs:service", "rds:db"]
//! "#,
//! )?);
//!
//! let orchestrator = Orchestrator::builder(config, Arc::new(StaticDiscovery::default())).build();
//! let result = orchestrator.run(ResourceAction::Start).await?;
//! assert_eq!(result.succeeded + result.failed, result.total);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod orchestration;
pub mod registry;

pub use config::{ConfigManager, LightsOutConfig};
pub use discovery::{Discovery, DiscoveryRequest};
pub use error::{ErrorKind, LightsOutError, ProviderError, Result};
pub use handlers::{ClientProvider, ResourceHandler};
pub use models::{DiscoveredResource, HandlerResult, OrchestrationResult, ResourceAction, ResourceStatus};
pub use notifications::{LogNotifier, Notifier};
pub use orchestration::{Orchestrator, OrchestratorBuilder};
pub use registry::HandlerFactory;
