//! # Orchestrator
//!
//! Entry point of one lights-out run: resolve regions, discover resources,
//! plan batches, execute them, aggregate and notify.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lights_out::config::LightsOutConfig;
//! use lights_out::discovery::StaticDiscovery;
//! use lights_out::models::ResourceAction;
//! use lights_out::orchestration::Orchestrator;
//! use std::sync::Arc;
//!
//! # async fn example() -> lights_out::error::Result<()> {
//! let config = Arc::new(LightsOutConfig::default());
//! let orchestrator = Orchestrator::builder(config, Arc::new(StaticDiscovery::default()))
//!     .target_group("primary")
//!     .build();
//!
//! let result = orchestrator.run(ResourceAction::Stop).await?;
//! println!("{} of {} resources stopped", result.succeeded, result.total);
//! # Ok(())
//! # }
//! ```

use super::executor::BatchExecutor;
use super::planning::{plan_batches, resolve_regions};
use crate::config::LightsOutConfig;
use crate::discovery::{Discovery, DiscoveryRequest};
use crate::error::{LightsOutError, Result};
use crate::handlers::{ClientProvider, UnconfiguredClients};
use crate::logging::log_orchestration_summary;
use crate::models::{DiscoveredResource, HandlerResult, OrchestrationResult, ResourceAction};
use crate::notifications::{LogNotifier, Notifier};
use crate::registry::HandlerFactory;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub struct Orchestrator {
    config: Arc<LightsOutConfig>,
    discovery: Arc<dyn Discovery>,
    notifier: Arc<dyn Notifier>,
    target_group: Option<String>,
    trigger_source: Option<String>,
    executor: BatchExecutor,
}

impl Orchestrator {
    pub fn builder(config: Arc<LightsOutConfig>, discovery: Arc<dyn Discovery>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config, discovery)
    }

    pub fn config(&self) -> &LightsOutConfig {
        &self.config
    }

    /// Target region group for this orchestrator, falling back to the configured active group
    pub fn target_group(&self) -> Option<&str> {
        self.target_group
            .as_deref()
            .or(self.config.active_region_group.as_deref())
    }

    pub fn effective_regions(&self) -> Vec<String> {
        resolve_regions(&self.config, self.target_group())
    }

    /// Discover managed resources in the effective regions.
    ///
    /// Returns empty without calling discovery when either filter set is empty.
    pub async fn discover_resources(&self) -> Result<Vec<DiscoveredResource>> {
        let discovery_config = &self.config.discovery;
        if !discovery_config.is_configured() {
            warn!(
                tag_filters = discovery_config.tag_filters.len(),
                resource_types = discovery_config.resource_types.len(),
                "🔍 DISCOVERY: Filters not configured, nothing to discover"
            );
            return Ok(Vec::new());
        }

        let request = DiscoveryRequest {
            tag_filters: discovery_config.tag_filters.clone(),
            resource_types: discovery_config.resource_types.clone(),
            regions: self.effective_regions(),
        };
        debug!(regions = ?request.regions, resource_types = ?request.resource_types, "🔍 DISCOVERY: Starting");

        let resources = self.discovery.discover(&request).await.map_err(|e| match e {
            LightsOutError::Discovery(_) => e,
            other => LightsOutError::Discovery(other.to_string()),
        })?;

        info!(count = resources.len(), regions = ?request.regions, "🔍 DISCOVERY: Completed");
        Ok(resources)
    }

    /// Run `action` against every discovered resource.
    ///
    /// Only a discovery failure is returned as an error; per-resource failures
    /// are recorded in the result.
    pub async fn run(&self, action: ResourceAction) -> Result<OrchestrationResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "lights_out_run",
            run_id = %run_id,
            action = %action,
            environment = %self.config.environment
        );
        self.run_inner(run_id, action).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, action: ResourceAction) -> Result<OrchestrationResult> {
        let started_at = Utc::now();
        info!(strategy = ?self.config.orchestration.strategy, "📋 ORCHESTRATION: Run started");

        let resources = self.discover_resources().await?;
        let batches = plan_batches(&resources, action, self.config.orchestration.strategy);
        let results = self.executor.execute(&resources, &batches, action).await;

        let result = OrchestrationResult::from_results(
            run_id,
            action,
            self.config.environment.clone(),
            results,
            started_at,
        );
        log_orchestration_summary(&result);

        if action.is_mutating() {
            self.notify(&result.results, action).await;
        }

        Ok(result)
    }

    async fn notify(&self, results: &[HandlerResult], action: ResourceAction) {
        let Some(sink) = self.config.notifications.as_ref().filter(|n| n.enabled) else {
            return;
        };
        let trigger_source = self
            .trigger_source
            .as_deref()
            .or(sink.trigger_source.as_deref());

        if let Err(e) = self
            .notifier
            .send_aggregated(sink, results, &self.config.environment, action, trigger_source)
            .await
        {
            warn!(sink = %sink.kind, error = %e, "📣 NOTIFICATION: Delivery failed, continuing");
        }
    }
}

pub struct OrchestratorBuilder {
    config: Arc<LightsOutConfig>,
    discovery: Arc<dyn Discovery>,
    clients: Option<Arc<dyn ClientProvider>>,
    factory: Option<Arc<HandlerFactory>>,
    notifier: Option<Arc<dyn Notifier>>,
    target_group: Option<String>,
    trigger_source: Option<String>,
}

impl OrchestratorBuilder {
    pub fn new(config: Arc<LightsOutConfig>, discovery: Arc<dyn Discovery>) -> Self {
        Self {
            config,
            discovery,
            clients: None,
            factory: None,
            notifier: None,
            target_group: None,
            trigger_source: None,
        }
    }

    /// Provider clients used by the built-in handlers
    pub fn clients(mut self, clients: Arc<dyn ClientProvider>) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn handler_factory(mut self, factory: Arc<HandlerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn target_group(mut self, group: impl Into<String>) -> Self {
        self.target_group = Some(group.into());
        self
    }

    pub fn trigger_source(mut self, source: impl Into<String>) -> Self {
        self.trigger_source = Some(source.into());
        self
    }

    pub fn build(self) -> Orchestrator {
        let clients = self
            .clients
            .unwrap_or_else(|| Arc::new(UnconfiguredClients) as Arc<dyn ClientProvider>);
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(HandlerFactory::with_defaults()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LogNotifier) as Arc<dyn Notifier>);

        Orchestrator {
            executor: BatchExecutor::new(Arc::clone(&self.config), clients, factory),
            config: self.config,
            discovery: self.discovery,
            notifier,
            target_group: self.target_group,
            trigger_source: self.trigger_source,
        }
    }
}
