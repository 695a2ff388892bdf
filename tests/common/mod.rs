//! Shared fakes for integration tests.
//!
//! Provider fakes record every call behind `Arc<Mutex<_>>` state so tests can
//! assert on mutating calls; scripted handlers record execution timing on the
//! tokio clock so paused-time tests can check batch barriers.

#![allow(dead_code)]

use async_trait::async_trait;
use lights_out::config::{LightsOutConfig, NotificationConfig};
use lights_out::discovery::{Discovery, DiscoveryRequest, StaticDiscovery};
use lights_out::error::{LightsOutError, ProviderError, Result};
use lights_out::handlers::{
    ContainerServiceApi, DatabaseApi, DbInstanceDescription, ProviderResult, ResourceHandler,
    ServiceDescription, StopDbInstanceRequest,
};
use lights_out::models::{DiscoveredResource, HandlerResult, ResourceAction, ResourceStatus, ScalableCapacity};
use lights_out::notifications::Notifier;
use lights_out::registry::HandlerFactory;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const MANAGED_TAG: &str = "lights-out:managed";
pub const SCRIPTED_TYPE: &str = "scripted-service";

// ---------------------------------------------------------------------------
// Container service fake
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ContainerServiceState {
    pub services: HashMap<(String, String), ServiceDescription>,
    pub scalable_targets: HashMap<(String, String), ScalableCapacity>,
    pub update_calls: Vec<(String, String, i32)>,
    pub register_calls: Vec<(String, String, i32, i32)>,
    pub describe_calls: usize,
    pub describe_error: Option<String>,
    /// Errors returned only on the given 1-based describe call numbers
    pub describe_errors_on_call: HashMap<usize, String>,
    pub update_error: Option<String>,
    pub probe_error: Option<String>,
    /// When false, running count never follows an update
    pub converges: bool,
}

#[derive(Debug, Clone)]
pub struct FakeContainerService {
    state: Arc<Mutex<ContainerServiceState>>,
}

impl Default for FakeContainerService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeContainerService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ContainerServiceState {
                converges: true,
                ..Default::default()
            })),
        }
    }

    pub fn with_service(self, cluster: &str, service: &str, desired: i32, running: i32) -> Self {
        self.state.lock().unwrap().services.insert(
            (cluster.to_string(), service.to_string()),
            ServiceDescription {
                status: "ACTIVE".to_string(),
                desired_count: desired,
                running_count: running,
            },
        );
        self
    }

    pub fn with_scalable_target(self, cluster: &str, service: &str, min: i32, max: i32) -> Self {
        self.state.lock().unwrap().scalable_targets.insert(
            (cluster.to_string(), service.to_string()),
            ScalableCapacity {
                min_capacity: min,
                max_capacity: max,
            },
        );
        self
    }

    pub fn with_describe_error(self, message: &str) -> Self {
        self.state.lock().unwrap().describe_error = Some(message.to_string());
        self
    }

    pub fn with_describe_error_on_calls(self, calls: impl IntoIterator<Item = usize>, message: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for call in calls {
                state.describe_errors_on_call.insert(call, message.to_string());
            }
        }
        self
    }

    pub fn with_update_error(self, message: &str) -> Self {
        self.state.lock().unwrap().update_error = Some(message.to_string());
        self
    }

    pub fn with_probe_error(self, message: &str) -> Self {
        self.state.lock().unwrap().probe_error = Some(message.to_string());
        self
    }

    pub fn without_convergence(self) -> Self {
        self.state.lock().unwrap().converges = false;
        self
    }

    pub fn update_calls(&self) -> Vec<(String, String, i32)> {
        self.state.lock().unwrap().update_calls.clone()
    }

    pub fn register_calls(&self) -> Vec<(String, String, i32, i32)> {
        self.state.lock().unwrap().register_calls.clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.state.lock().unwrap().describe_calls
    }

    pub fn service(&self, cluster: &str, service: &str) -> Option<ServiceDescription> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(&(cluster.to_string(), service.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ContainerServiceApi for FakeContainerService {
    async fn describe_service(&self, cluster: &str, service: &str) -> ProviderResult<ServiceDescription> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls += 1;
        if let Some(message) = &state.describe_error {
            return Err(ProviderError::api(message.clone()));
        }
        if let Some(message) = state.describe_errors_on_call.get(&state.describe_calls) {
            return Err(ProviderError::api(message.clone()));
        }
        state
            .services
            .get(&(cluster.to_string(), service.to_string()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::not_found(format!("Service {service} not found in cluster {cluster}"))
            })
    }

    async fn update_desired_count(&self, cluster: &str, service: &str, desired_count: i32) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.update_error {
            return Err(ProviderError::api(message.clone()));
        }
        state
            .update_calls
            .push((cluster.to_string(), service.to_string(), desired_count));
        let converges = state.converges;
        if let Some(description) = state.services.get_mut(&(cluster.to_string(), service.to_string())) {
            description.desired_count = desired_count;
            if converges {
                description.running_count = desired_count;
            }
        }
        Ok(())
    }

    async fn describe_scalable_target(
        &self,
        cluster: &str,
        service: &str,
    ) -> ProviderResult<Option<ScalableCapacity>> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.probe_error {
            return Err(ProviderError::api(message.clone()));
        }
        Ok(state
            .scalable_targets
            .get(&(cluster.to_string(), service.to_string()))
            .copied())
    }

    async fn register_scalable_target(
        &self,
        cluster: &str,
        service: &str,
        min_capacity: i32,
        max_capacity: i32,
    ) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .register_calls
            .push((cluster.to_string(), service.to_string(), min_capacity, max_capacity));
        state.scalable_targets.insert(
            (cluster.to_string(), service.to_string()),
            ScalableCapacity {
                min_capacity,
                max_capacity,
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Database fake
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DatabaseState {
    pub instances: HashMap<String, String>,
    pub start_calls: Vec<String>,
    pub stop_calls: Vec<StopDbInstanceRequest>,
    pub command_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<DatabaseState>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, identifier: &str, status: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .instances
            .insert(identifier.to_string(), status.to_string());
        self
    }

    pub fn with_command_error(self, message: &str) -> Self {
        self.state.lock().unwrap().command_error = Some(message.to_string());
        self
    }

    pub fn start_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().start_calls.clone()
    }

    pub fn stop_calls(&self) -> Vec<StopDbInstanceRequest> {
        self.state.lock().unwrap().stop_calls.clone()
    }

    pub fn status(&self, identifier: &str) -> Option<String> {
        self.state.lock().unwrap().instances.get(identifier).cloned()
    }
}

#[async_trait]
impl DatabaseApi for FakeDatabase {
    async fn describe_db_instance(&self, identifier: &str) -> ProviderResult<DbInstanceDescription> {
        let state = self.state.lock().unwrap();
        state
            .instances
            .get(identifier)
            .map(|status| DbInstanceDescription {
                identifier: identifier.to_string(),
                status: status.clone(),
            })
            .ok_or_else(|| ProviderError::not_found(format!("DBInstance {identifier} not found")))
    }

    async fn start_db_instance(&self, identifier: &str) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.command_error {
            return Err(ProviderError::api(message.clone()));
        }
        state.start_calls.push(identifier.to_string());
        state
            .instances
            .insert(identifier.to_string(), "starting".to_string());
        Ok(())
    }

    async fn stop_db_instance(&self, request: StopDbInstanceRequest) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.command_error {
            return Err(ProviderError::api(message.clone()));
        }
        state
            .instances
            .insert(request.identifier.clone(), "stopping".to_string());
        state.stop_calls.push(request);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted handlers for orchestration tests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Behavior {
    delay: Duration,
    error: Option<String>,
    panics: bool,
}

/// One completed handler invocation, timed on the tokio clock
#[derive(Debug, Clone)]
pub struct Execution {
    pub resource_id: String,
    pub action: ResourceAction,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Debug, Default)]
pub struct Script {
    behaviors: Mutex<HashMap<String, Behavior>>,
    executions: Mutex<Vec<Execution>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delay(&self, resource_id: &str, delay: Duration) {
        self.behaviors
            .lock()
            .unwrap()
            .entry(resource_id.to_string())
            .or_default()
            .delay = delay;
    }

    pub fn fail(&self, resource_id: &str, message: &str) {
        self.behaviors
            .lock()
            .unwrap()
            .entry(resource_id.to_string())
            .or_default()
            .error = Some(message.to_string());
    }

    pub fn panic_on(&self, resource_id: &str) {
        self.behaviors
            .lock()
            .unwrap()
            .entry(resource_id.to_string())
            .or_default()
            .panics = true;
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.lock().unwrap().clone()
    }

    pub fn execution(&self, resource_id: &str) -> Option<Execution> {
        self.executions()
            .into_iter()
            .find(|e| e.resource_id == resource_id)
    }

    /// Resource ids in completion order
    pub fn completion_order(&self) -> Vec<String> {
        self.executions()
            .into_iter()
            .map(|e| e.resource_id)
            .collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    /// Factory that serves scripted handlers for [`SCRIPTED_TYPE`]
    pub fn factory(self: &Arc<Self>) -> Arc<HandlerFactory> {
        let factory = HandlerFactory::empty();
        let script = Arc::clone(self);
        factory.register(SCRIPTED_TYPE, move |resource, _config, _clients| {
            Box::new(ScriptedHandler {
                resource: resource.clone(),
                script: Arc::clone(&script),
            })
        });
        Arc::new(factory)
    }

    async fn perform(&self, resource: &DiscoveredResource, action: ResourceAction) -> Result<()> {
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&resource.resource_id)
            .cloned()
            .unwrap_or_default();

        let started = Instant::now();
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now_active, Ordering::SeqCst);

        if !behavior.delay.is_zero() {
            tokio::time::sleep(behavior.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.executions.lock().unwrap().push(Execution {
            resource_id: resource.resource_id.clone(),
            action,
            started,
            finished: Instant::now(),
        });

        if behavior.panics {
            panic!("scripted handler crashed for {}", resource.resource_id);
        }
        match behavior.error {
            Some(message) => Err(ProviderError::api(message).into()),
            None => Ok(()),
        }
    }
}

struct ScriptedHandler {
    resource: DiscoveredResource,
    script: Arc<Script>,
}

#[async_trait]
impl ResourceHandler for ScriptedHandler {
    fn resource_type(&self) -> &str {
        &self.resource.resource_type
    }

    fn resource_id(&self) -> &str {
        &self.resource.resource_id
    }

    async fn get_status(&self) -> Result<ResourceStatus> {
        self.script.perform(&self.resource, ResourceAction::Status).await?;
        Ok(ResourceStatus {
            status: "ACTIVE".to_string(),
            desired_count: Some(1),
            running_count: Some(1),
            is_stopped: false,
            capacity: None,
        })
    }

    async fn start(&self) -> Result<HandlerResult> {
        self.script.perform(&self.resource, ResourceAction::Start).await?;
        Ok(HandlerResult::success(
            ResourceAction::Start,
            &self.resource.resource_type,
            &self.resource.resource_id,
            "started",
        ))
    }

    async fn stop(&self) -> Result<HandlerResult> {
        self.script.perform(&self.resource, ResourceAction::Stop).await?;
        Ok(HandlerResult::success(
            ResourceAction::Stop,
            &self.resource.resource_type,
            &self.resource.resource_id,
            "stopped",
        ))
    }

    async fn is_ready(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Discovery and notification doubles
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingDiscovery {
    inner: StaticDiscovery,
    error: Option<String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<DiscoveryRequest>>,
}

impl RecordingDiscovery {
    pub fn new(resources: Vec<DiscoveredResource>) -> Arc<Self> {
        Arc::new(Self {
            inner: StaticDiscovery::new(resources),
            ..Default::default()
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            error: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<DiscoveryRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Discovery for RecordingDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> Result<Vec<DiscoveredResource>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(message) = &self.error {
            return Err(LightsOutError::Discovery(message.clone()));
        }
        self.inner.discover(request).await
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub environment: String,
    pub action: ResourceAction,
    pub trigger_source: Option<String>,
    pub result_count: usize,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    error: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            error: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_aggregated(
        &self,
        _sink: &NotificationConfig,
        results: &[HandlerResult],
        environment: &str,
        action: ResourceAction,
        trigger_source: Option<&str>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(Notification {
            environment: environment.to_string(),
            action,
            trigger_source: trigger_source.map(str::to_string),
            result_count: results.len(),
        });
        match &self.error {
            Some(message) => Err(LightsOutError::Notification(message.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Managed scripted resource in us-east-1
pub fn scripted(id: &str, priority: u32) -> DiscoveredResource {
    DiscoveredResource::new(
        SCRIPTED_TYPE,
        format!("arn:aws:scripted:us-east-1:123456789012:service/{id}"),
        id,
        priority,
    )
    .with_tag(MANAGED_TAG, "true")
}

/// Configuration whose discovery filters match [`scripted`] resources
pub fn scripted_config() -> LightsOutConfig {
    let mut config = LightsOutConfig {
        environment: "test".to_string(),
        ..Default::default()
    };
    config
        .discovery
        .tag_filters
        .insert(MANAGED_TAG.to_string(), "true".to_string());
    config.discovery.resource_types = vec![
        SCRIPTED_TYPE.to_string(),
        "ecs:service".to_string(),
        "rds:db".to_string(),
        "nat-gateway".to_string(),
    ];
    config
}

pub fn notifications_enabled(config: &mut LightsOutConfig) {
    config.notifications = Some(NotificationConfig {
        enabled: true,
        kind: "log".to_string(),
        webhook_url: None,
        trigger_source: Some("schedule".to_string()),
    });
}

pub fn ids(results: &[HandlerResult]) -> Vec<String> {
    results.iter().map(|r| r.resource_id.clone()).collect()
}
