//! Shared test utilities and fixtures for the azurefleet test suite.
//!
//! This module provides:
//! - An in-memory `FleetsClient` that behaves like the fleets API
//! - Fleet configuration fixtures
//! - Helpers for building resources and state handles
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::{json, Value};

use azurefleet::api::{Fleet, FleetId, FleetsClient, LongRunningOperation, OperationState};
use azurefleet::enums::ProvisioningState;
use azurefleet::error::{Error, Result};
use azurefleet::poller::PollPolicy;
use azurefleet::resource::FleetResource;

pub const SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const RESOURCE_GROUP: &str = "acctest-rg";
pub const FLEET_NAME: &str = "acctest-fleet";
pub const ADMIN_PASSWORD: &str = "Zq9!kLm3vXp2";

// ============================================================================
// In-memory fleets API
// ============================================================================

/// A call observed by the in-memory client.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Put(String),
    Delete(String),
    Status,
}

/// In-memory `FleetsClient`.
///
/// Writes are stored as the API would store them: read-only fields are
/// filled in and values the API never returns (passwords, custom data,
/// protected settings) are dropped. Each long-running operation reports
/// `InProgress` `pending_polls` times before it succeeds.
pub struct InMemoryFleetsClient {
    fleets: Mutex<HashMap<String, Fleet>>,
    calls: Mutex<Vec<Call>>,
    last_put: Mutex<Option<Fleet>>,
    pending_polls: u32,
    remaining: Mutex<u32>,
}

impl InMemoryFleetsClient {
    pub fn new() -> Self {
        Self::with_pending_polls(2)
    }

    pub fn with_pending_polls(pending_polls: u32) -> Self {
        Self {
            fleets: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            last_put: Mutex::new(None),
            pending_polls,
            remaining: Mutex::new(0),
        }
    }

    /// Seeds a fleet as if it already existed remotely.
    pub fn insert(&self, id: &FleetId, fleet: Fleet) {
        self.fleets.lock().unwrap().insert(key(id), fleet);
    }

    pub fn stored(&self, id: &FleetId) -> Option<Fleet> {
        self.fleets.lock().unwrap().get(&key(id)).cloned()
    }

    /// The body of the most recent create-or-update call, as sent.
    pub fn last_put(&self) -> Option<Fleet> {
        self.last_put.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn start_operation(&self) -> LongRunningOperation {
        *self.remaining.lock().unwrap() = self.pending_polls;
        LongRunningOperation::AsyncOperation {
            url: "https://management.azure.com/operations/1".to_string(),
            retry_after: None,
        }
    }
}

impl Default for InMemoryFleetsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn key(id: &FleetId) -> String {
    id.to_string().to_lowercase()
}

/// What the API keeps of a written fleet.
fn as_stored(id: &FleetId, mut fleet: Fleet) -> Fleet {
    fleet.id = Some(id.to_string());
    fleet.name = Some(id.name.clone());
    fleet.resource_type = Some("Microsoft.AzureFleet/fleets".to_string());

    let props = fleet.properties.get_or_insert_with(Default::default);
    props.provisioning_state = Some(ProvisioningState::Succeeded);
    props.unique_id = Some("11111111-2222-3333-4444-555555555555".to_string());
    props.time_created = Some("2024-11-01T10:00:00Z".to_string());

    if let Some(compute) = props.compute_profile.as_mut() {
        let vm = &mut compute.base_virtual_machine_profile;
        if let Some(os) = vm.os_profile.as_mut() {
            os.admin_password = None;
            os.custom_data = None;
        }
        if let Some(extensions) = vm
            .extension_profile
            .as_mut()
            .and_then(|p| p.extensions.as_mut())
        {
            for ext in extensions {
                if let Some(p) = ext.properties.as_mut() {
                    p.protected_settings = None;
                }
            }
        }
    }
    fleet
}

#[async_trait]
impl FleetsClient for InMemoryFleetsClient {
    async fn get(&self, id: &FleetId) -> Result<Fleet> {
        self.record(Call::Get(id.to_string()));
        self.fleets
            .lock()
            .unwrap()
            .get(&key(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn begin_create_or_update(
        &self,
        id: &FleetId,
        fleet: &Fleet,
    ) -> Result<LongRunningOperation> {
        self.record(Call::Put(id.to_string()));
        *self.last_put.lock().unwrap() = Some(fleet.clone());
        self.fleets
            .lock()
            .unwrap()
            .insert(key(id), as_stored(id, fleet.clone()));
        Ok(self.start_operation())
    }

    async fn begin_delete(&self, id: &FleetId) -> Result<LongRunningOperation> {
        self.record(Call::Delete(id.to_string()));
        match self.fleets.lock().unwrap().remove(&key(id)) {
            Some(_) => Ok(self.start_operation()),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn operation_status(&self, _operation: &LongRunningOperation) -> Result<OperationState> {
        self.record(Call::Status);
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            Ok(OperationState::Succeeded)
        } else {
            *remaining -= 1;
            Ok(OperationState::InProgress)
        }
    }
}

// ============================================================================
// Resource helpers
// ============================================================================

/// A fleet resource over `client` that polls without delay.
pub fn fleet_resource(client: Arc<InMemoryFleetsClient>) -> FleetResource {
    FleetResource::new(client, SUBSCRIPTION_ID)
        .with_poll_policy(PollPolicy::fixed(Duration::from_millis(1)))
}

pub fn fleet_id() -> FleetId {
    FleetId::new(SUBSCRIPTION_ID, RESOURCE_GROUP, FLEET_NAME)
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn subnet_id() -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/acctest-vnet/subnets/internal",
        SUBSCRIPTION_ID, RESOURCE_GROUP
    )
}

/// An RSA public key with a body large enough to pass validation.
pub fn ssh_public_key() -> String {
    format!(
        "ssh-rsa {}",
        base64::engine::general_purpose::STANDARD.encode([7u8; 300])
    )
}

/// Ubuntu 22.04 marketplace image.
pub fn ubuntu_image() -> Value {
    json!([{
        "publisher": "Canonical",
        "offer": "0001-com-ubuntu-server-jammy",
        "sku": "22_04-lts",
        "version": "latest"
    }])
}

/// A Linux VM profile with password authentication only.
pub fn linux_vm_profile() -> Value {
    json!([{
        "network_interface": [{
            "name": "networkProTest",
            "primary": true,
            "ip_configuration": [{
                "name": "ipConfigTest",
                "primary": true,
                "subnet_id": subnet_id()
            }]
        }],
        "os_profile": [{
            "linux_configuration": [{
                "admin_username": "azureuser",
                "admin_password": ADMIN_PASSWORD,
                "password_authentication_enabled": true
            }]
        }],
        "storage_profile": [{
            "image_reference": ubuntu_image(),
            "os_disk": [{
                "caching": "ReadWrite",
                "storage_account_type": "Standard_LRS"
            }]
        }]
    }])
}

/// The fleet of scenario S1.
pub fn basic_fleet_config() -> Value {
    json!({
        "name": FLEET_NAME,
        "resource_group_name": RESOURCE_GROUP,
        "location": "westeurope",
        "regular_priority_profile": [{
            "allocation_strategy": "LowestPrice",
            "capacity": 2,
            "min_capacity": 1
        }],
        "spot_priority_profile": [{
            "allocation_strategy": "PriceCapacityOptimized",
            "capacity": 2,
            "eviction_policy": "Delete",
            "maintain": true,
            "min_capacity": 1
        }],
        "vm_sizes_profile": [
            { "name": "Standard_D2s_v3" },
            { "name": "Standard_D4s_v3" },
            { "name": "Standard_E2s_v3" }
        ],
        "compute_profile": [{
            "compute_api_version": "2024-03-01",
            "platform_fault_domain_count": 1,
            "base_virtual_machine_profile": linux_vm_profile()
        }],
        "tags": { "env": "test" }
    })
}

/// Returns the base VM profile object of a fleet config for editing.
pub fn base_vm_profile_mut(config: &mut Value) -> &mut Value {
    &mut config["compute_profile"][0]["base_virtual_machine_profile"][0]
}
