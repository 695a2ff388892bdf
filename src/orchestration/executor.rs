//! # Batch Executor
//!
//! Runs planned batches against their handlers. Every resource in a batch is
//! spawned as its own task and owns its result slot; slots are merged only
//! after the whole batch has joined, which is also the barrier before the
//! next batch is dispatched.

use super::planning::Batch;
use crate::config::{GroupFailurePolicy, LightsOutConfig};
use crate::error::{ErrorKind, LightsOutError};
use crate::handlers::{ClientProvider, ResourceHandler};
use crate::logging::log_resource_operation;
use crate::models::{DiscoveredResource, HandlerResult, ResourceAction};
use crate::registry::HandlerFactory;
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Per-resource outcome of a batch, filled exactly once
enum Slot {
    Ready(HandlerResult),
    Running(JoinHandle<HandlerResult>),
}

pub(crate) struct BatchExecutor {
    config: Arc<LightsOutConfig>,
    clients: Arc<dyn ClientProvider>,
    factory: Arc<HandlerFactory>,
    semaphore: Option<Arc<Semaphore>>,
}

impl BatchExecutor {
    pub(crate) fn new(
        config: Arc<LightsOutConfig>,
        clients: Arc<dyn ClientProvider>,
        factory: Arc<HandlerFactory>,
    ) -> Self {
        let semaphore = config
            .orchestration
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit)));
        Self {
            config,
            clients,
            factory,
            semaphore,
        }
    }

    /// Execute `batches` in order and return one result per planned resource
    pub(crate) async fn execute(
        &self,
        resources: &[DiscoveredResource],
        batches: &[Batch],
        action: ResourceAction,
    ) -> Vec<HandlerResult> {
        let halt_on_failure =
            action.is_mutating() && self.config.orchestration.on_group_failure == GroupFailurePolicy::Halt;
        let mut results = Vec::with_capacity(resources.len());

        for (position, batch) in batches.iter().enumerate() {
            debug!(
                batch = position,
                priority = ?batch.priority,
                size = batch.members.len(),
                "🚀 EXECUTOR: Dispatching batch"
            );

            let batch_results = self.execute_batch(resources, batch, action).await;
            let batch_failed = batch_results.iter().any(|r| !r.success);
            results.extend(batch_results);

            if batch_failed && halt_on_failure {
                let remaining = &batches[position + 1..];
                if !remaining.is_empty() {
                    warn!(
                        batch = position,
                        priority = ?batch.priority,
                        skipped_batches = remaining.len(),
                        "⛔ EXECUTOR: Batch reported failures, skipping remaining batches"
                    );
                }
                for skipped in remaining {
                    results.extend(
                        skipped
                            .members
                            .iter()
                            .map(|&i| skipped_result(action, &resources[i], batch.priority)),
                    );
                }
                break;
            }
        }

        results
    }

    async fn execute_batch(
        &self,
        resources: &[DiscoveredResource],
        batch: &Batch,
        action: ResourceAction,
    ) -> Vec<HandlerResult> {
        let slots: Vec<Slot> = batch
            .members
            .iter()
            .map(|&index| self.dispatch(&resources[index], action))
            .collect();

        // Barrier: every task in the batch completes before any result is merged
        let pending = slots.into_iter().map(|slot| async move {
            match slot {
                Slot::Ready(result) => Ok(result),
                Slot::Running(handle) => handle.await,
            }
        });
        let joined = join_all(pending).await;

        joined
            .into_iter()
            .zip(&batch.members)
            .map(|(outcome, &index)| {
                outcome.unwrap_or_else(|join_error| {
                    let resource = &resources[index];
                    let (message, reason) = if join_error.is_panic() {
                        ("Resource task panicked", panic_text(join_error.into_panic()))
                    } else {
                        ("Resource task aborted", join_error.to_string())
                    };
                    error!(
                        resource_id = %resource.resource_id,
                        error = %reason,
                        "❌ EXECUTOR: {message}"
                    );
                    HandlerResult::failure(
                        action,
                        &resource.resource_type,
                        &resource.resource_id,
                        message,
                        ErrorKind::ApiError,
                        reason,
                    )
                    .with_region(resource.region())
                })
            })
            .collect()
    }

    fn dispatch(&self, resource: &DiscoveredResource, action: ResourceAction) -> Slot {
        let Some(handler) = self.factory.get_handler(resource, &self.config, &self.clients) else {
            let error = LightsOutError::HandlerNotFound {
                resource_type: resource.resource_type.clone(),
            };
            let result = HandlerResult::failure(
                action,
                &resource.resource_type,
                &resource.resource_id,
                format!("No handler for resource type '{}'", resource.resource_type),
                error.kind(),
                error.to_string(),
            )
            .with_region(resource.region());
            log_resource_operation(&result, resource.priority);
            return Slot::Ready(result);
        };

        let span = info_span!(
            "resource",
            resource_type = %resource.resource_type,
            resource_id = %resource.resource_id,
            priority = resource.priority
        );
        let task = run_handler(handler, resource.clone(), action, self.semaphore.clone());
        Slot::Running(tokio::spawn(task.instrument(span)))
    }
}

async fn run_handler(
    handler: Box<dyn ResourceHandler>,
    resource: DiscoveredResource,
    action: ResourceAction,
    semaphore: Option<Arc<Semaphore>>,
) -> HandlerResult {
    // The semaphore is never closed, so acquisition only fails if it is dropped
    let _permit = match semaphore {
        Some(semaphore) => semaphore.acquire_owned().await.ok(),
        None => None,
    };

    let outcome = match action {
        ResourceAction::Start => handler.start().await,
        ResourceAction::Stop => handler.stop().await,
        ResourceAction::Status => handler.get_status().await.map(|status| {
            HandlerResult::success(action, &resource.resource_type, &resource.resource_id, status.summary())
                .with_previous_state(status)
                .with_region(resource.region())
        }),
    };

    let result = outcome.unwrap_or_else(|e| HandlerResult::from_error(action, &resource, &e));
    log_resource_operation(&result, resource.priority);
    result
}

/// Text carried by a panic payload
fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    match payload.downcast::<String>() {
        Ok(text) => *text,
        Err(_) => "non-string panic payload".to_string(),
    }
}

fn skipped_result(action: ResourceAction, resource: &DiscoveredResource, failed_priority: Option<u32>) -> HandlerResult {
    let reason = match failed_priority {
        Some(priority) => format!("Skipped: priority group {priority} reported failures"),
        None => "Skipped: an earlier batch reported failures".to_string(),
    };
    info!(resource_id = %resource.resource_id, reason = %reason, "⏭️ EXECUTOR: Resource skipped");
    HandlerResult::failure(
        action,
        &resource.resource_type,
        &resource.resource_id,
        format!("{} skipped", crate::models::results::capitalize(action.as_str())),
        ErrorKind::Skipped,
        reason,
    )
    .with_region(resource.region())
}
