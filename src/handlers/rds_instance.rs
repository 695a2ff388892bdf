//! Managed database instance handler.
//!
//! Fire-and-forget: start and stop issue the provider call, optionally sleep
//! for `wait_after_command_seconds`, and report success without waiting for
//! the instance to converge.

use super::clients::{ClientProvider, DatabaseApi, DbInstanceDescription, StopDbInstanceRequest};
use super::ResourceHandler;
use crate::config::{LightsOutConfig, RdsDefaults};
use crate::constants::resource_types;
use crate::error::{ErrorKind, Result};
use crate::models::results::capitalize;
use crate::models::{DiscoveredResource, HandlerResult, ResourceAction, ResourceStatus};
use std::sync::Arc;
use tracing::{debug, info};

const AVAILABLE: &str = "available";
const STARTING: &str = "starting";
const STOPPED: &str = "stopped";
const STOPPING: &str = "stopping";

pub struct RdsInstanceHandler {
    resource: DiscoveredResource,
    settings: RdsDefaults,
    client: Arc<dyn DatabaseApi>,
}

impl RdsInstanceHandler {
    pub fn new(resource: &DiscoveredResource, config: &LightsOutConfig, clients: &dyn ClientProvider) -> Self {
        let region = resource.region();
        Self::with_client(
            resource.clone(),
            config.resource_defaults.rds_db.clone(),
            clients.database(region.as_deref()),
        )
    }

    pub fn with_client(resource: DiscoveredResource, settings: RdsDefaults, client: Arc<dyn DatabaseApi>) -> Self {
        Self {
            resource,
            settings,
            client,
        }
    }

    fn identifier(&self) -> &str {
        &self.resource.resource_id
    }

    async fn describe(&self) -> Result<DbInstanceDescription> {
        Ok(self.client.describe_db_instance(self.identifier()).await?)
    }

    fn snapshot(description: &DbInstanceDescription) -> ResourceStatus {
        let status = description.status.to_ascii_lowercase();
        ResourceStatus {
            is_stopped: status == STOPPED || status == STOPPING,
            status,
            desired_count: None,
            running_count: None,
            capacity: None,
        }
    }

    async fn transition(&self, action: ResourceAction) -> Result<HandlerResult> {
        let current = self.describe().await?;
        let previous = Self::snapshot(&current);
        let state = previous.status.as_str();

        let (settled, actionable) = match action {
            ResourceAction::Start => ([AVAILABLE, STARTING], STOPPED),
            _ => ([STOPPED, STOPPING], AVAILABLE),
        };

        if settled.contains(&state) {
            info!(db_instance = %self.identifier(), state = %state, "Database already in target state");
            return Ok(self
                .success(action, format!("Database already {state}"))
                .with_previous_state(previous));
        }

        if state != actionable {
            let error = format!("Cannot {action} database in state '{state}'");
            return Ok(HandlerResult::failure(
                action,
                &self.resource.resource_type,
                &self.resource.resource_id,
                format!("{} skipped", capitalize(action.as_str())),
                ErrorKind::ValidationError,
                error,
            )
            .with_previous_state(previous)
            .with_region(self.resource.region()));
        }

        match action {
            ResourceAction::Start => self.client.start_db_instance(self.identifier()).await?,
            _ => {
                self.client
                    .stop_db_instance(StopDbInstanceRequest {
                        identifier: self.identifier().to_string(),
                        skip_final_snapshot: self.settings.skip_final_snapshot,
                    })
                    .await?
            }
        }
        info!(db_instance = %self.identifier(), action = %action, previous_state = %state, "Database command issued");

        let wait = self.settings.wait_after_command();
        if !wait.is_zero() {
            debug!(wait_secs = wait.as_secs(), "Pausing after database command");
            tokio::time::sleep(wait).await;
        }

        Ok(self
            .success(action, format!("Database {action} initiated (was {state})"))
            .with_previous_state(previous))
    }

    fn success(&self, action: ResourceAction, message: String) -> HandlerResult {
        HandlerResult::success(
            action,
            &self.resource.resource_type,
            &self.resource.resource_id,
            message,
        )
        .with_region(self.resource.region())
    }
}

#[async_trait::async_trait]
impl ResourceHandler for RdsInstanceHandler {
    fn resource_type(&self) -> &str {
        resource_types::RDS_DB
    }

    fn resource_id(&self) -> &str {
        &self.resource.resource_id
    }

    async fn get_status(&self) -> Result<ResourceStatus> {
        Ok(Self::snapshot(&self.describe().await?))
    }

    async fn start(&self) -> Result<HandlerResult> {
        self.transition(ResourceAction::Start).await
    }

    async fn stop(&self) -> Result<HandlerResult> {
        self.transition(ResourceAction::Stop).await
    }

    async fn is_ready(&self) -> bool {
        self.describe()
            .await
            .map(|d| d.status.eq_ignore_ascii_case(AVAILABLE))
            .unwrap_or(false)
    }
}
