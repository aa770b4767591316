//! `azurerm_azure_fleet` resource controller.
//!
//! Create and update run the same pipeline: decode the planned
//! configuration, check cross-field rules, expand, issue one
//! create-or-update call and poll it to completion. Update starts from the
//! record the API currently holds and only re-expands the sub-trees whose
//! configuration changed, so untouched sub-trees round-trip unchanged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Resource, ResourceData, Timeouts};
use crate::api::{Fleet, FleetId, FleetProperties, FleetsClient};
use crate::config::ProviderConfig;
use crate::crossfield;
use crate::error::{Error, ErrorContext, Operation, Result};
use crate::expand::{self, expand_fleet};
use crate::flatten::flatten_fleet;
use crate::model::FleetConfig;
use crate::poller::{poll_until_done, PollPolicy};
use crate::schema::{fleet_schema, Schema, RESOURCE_TYPE};

/// Drives the fleet lifecycle against a [`FleetsClient`].
pub struct FleetResource {
    client: Arc<dyn FleetsClient>,
    subscription_id: String,
    schema: Arc<Schema>,
    timeouts: Timeouts,
    poll_policy: PollPolicy,
}

impl FleetResource {
    pub fn new(client: Arc<dyn FleetsClient>, subscription_id: impl Into<String>) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
            schema: Arc::new(fleet_schema()),
            timeouts: Timeouts::default(),
            poll_policy: PollPolicy::default(),
        }
    }

    /// Builds a controller with the polling and timeout settings of `config`.
    pub fn from_config(client: Arc<dyn FleetsClient>, config: &ProviderConfig) -> Self {
        Self::new(client, config.azure.subscription_id.clone())
            .with_timeouts(config.timeouts.clone())
            .with_poll_policy(config.polling.clone())
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    /// A fresh state handle for `config`, sharing this resource's schema.
    pub fn data(&self, config: serde_json::Value) -> ResourceData {
        ResourceData::new(Arc::clone(&self.schema), config)
    }

    fn fleet_id(&self, config: &FleetConfig) -> FleetId {
        FleetId::new(
            &self.subscription_id,
            &config.resource_group_name,
            &config.name,
        )
    }

    /// Issues a create-or-update and waits for it within `timeout`.
    async fn write(&self, id: &FleetId, fleet: &Fleet, op: Operation, timeout: Duration) -> Result<()> {
        let operation = self
            .client
            .begin_create_or_update(id, fleet)
            .await
            .during(op, id)?;

        poll_until_done(self.client.as_ref(), &operation, &self.poll_policy, timeout)
            .await
            .during(Operation::Polling, format!("{} for completion", id))
            .during(op, id)
    }

    /// Re-expands every sub-tree whose configuration changed into `fleet`.
    fn apply_changes(fleet: &mut Fleet, config: &FleetConfig, data: &ResourceData) -> Result<()> {
        let changed = |key: &str| {
            let changed = data.has_change(key);
            debug!("{} {}", key, if changed { "changed, re-expanding" } else { "unchanged" });
            changed
        };

        if changed("identity") {
            fleet.identity = expand::expand_identity(config.identity.as_ref());
        }
        if changed("plan") {
            fleet.plan = expand::expand_plan(config.plan.as_ref());
        }
        if changed("zones") {
            fleet.zones = expand::non_empty_list(&config.zones);
        }
        if changed("tags") {
            fleet.tags = Some(config.tags.clone());
        }

        let props = fleet.properties.get_or_insert_with(FleetProperties::default);
        if changed("additional_location_profile") {
            props.additional_locations_profile =
                expand::expand_additional_location_profiles(&config.additional_location_profile)
                    .expanding("additional_location_profile")?;
        }
        if changed("compute_profile") {
            props.compute_profile = expand::expand_compute_profile(config.compute_profile.as_ref())
                .expanding("compute_profile")?;
        }
        if changed("regular_priority_profile") {
            props.regular_priority_profile =
                expand::expand_regular_priority_profile(config.regular_priority_profile.as_ref());
        }
        if changed("spot_priority_profile") {
            props.spot_priority_profile =
                expand::expand_spot_priority_profile(config.spot_priority_profile.as_ref());
        }
        if changed("vm_sizes_profile") {
            props.vm_sizes_profile = expand::expand_vm_sizes_profile(&config.vm_sizes_profile);
        }
        if changed("vm_attributes") {
            props.vm_attributes = expand::expand_vm_attributes(config.vm_attributes.as_ref());
        }

        // read-only on the wire
        props.provisioning_state = None;
        props.time_created = None;
        props.unique_id = None;
        if let Some(compute) = props.compute_profile.as_mut() {
            compute.base_virtual_machine_profile.time_created = None;
        }

        Ok(())
    }
}

#[async_trait]
impl Resource for FleetResource {
    fn name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let config: FleetConfig = data.decode()?;
        let id = self.fleet_id(&config);
        info!("Creating fleet {}", id);

        match self.client.get(&id).await {
            Ok(_) => return Err(Error::AlreadyExists(id.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(Error::operation(Operation::Retrieving, &id, e)),
        }

        crossfield::validate_fleet(&config)?;
        let fleet = expand_fleet(&config)?;

        self.write(&id, &fleet, Operation::Creating, self.timeouts.create)
            .await?;

        data.set_id(id.to_string());
        data.set_state(serde_json::to_value(&config)?);
        info!("Created fleet {}", id);
        Ok(())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = FleetId::parse(data.require_id()?)?;
        debug!("Reading fleet {}", id);

        let fetched = tokio::time::timeout(self.timeouts.read, self.client.get(&id))
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: self.timeouts.read.as_secs(),
            });
        let fleet = match fetched {
            Ok(Ok(fleet)) => fleet,
            Ok(Err(e)) if e.is_not_found() => {
                warn!("Fleet {} was not found, removing from state", id);
                data.mark_gone();
                return Ok(());
            }
            Ok(Err(e)) | Err(e) => return Err(Error::operation(Operation::Retrieving, &id, e)),
        };

        let config = flatten_fleet(&id, &fleet, data.state_view())?;
        let state = serde_json::to_value(&config)?;
        data.set_state(state);
        data.set_id(id.to_string());
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = FleetId::parse(data.require_id()?)?;
        let config: FleetConfig = data.decode()?;
        info!("Updating fleet {}", id);

        let mut fleet = self
            .client
            .get(&id)
            .await
            .during(Operation::Retrieving, &id)?;

        crossfield::validate_fleet(&config)?;
        Self::apply_changes(&mut fleet, &config, data)?;

        self.write(&id, &fleet, Operation::Updating, self.timeouts.update)
            .await?;

        data.set_state(serde_json::to_value(&config)?);
        info!("Updated fleet {}", id);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = FleetId::parse(data.require_id()?)?;
        info!("Deleting fleet {}", id);

        let operation = self
            .client
            .begin_delete(&id)
            .await
            .during(Operation::Deleting, &id)?;

        poll_until_done(
            self.client.as_ref(),
            &operation,
            &self.poll_policy,
            self.timeouts.delete,
        )
        .await
        .during(Operation::Polling, format!("{} for completion", id))
        .during(Operation::Deleting, &id)?;

        data.mark_gone();
        info!("Deleted fleet {}", id);
        Ok(())
    }
}
