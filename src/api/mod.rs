//! Azure Fleet API surface.
//!
//! - [`models`]: the request/response record tree
//! - [`client`]: the [`FleetsClient`] seam and its ARM implementation
//! - [`FleetId`]: the fleet resource identifier

pub mod client;
pub mod models;

pub use client::{
    ArmFleetsClient, ArmFleetsClientBuilder, ArmFleetsClientConfig, FleetsClient,
    LongRunningOperation, OperationState,
};
pub use models::*;

use crate::error::Result;
use crate::validate::ids;
use std::fmt;

/// Identifies a fleet by subscription, resource group and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FleetId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub name: String,
}

impl FleetId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            name: name.into(),
        }
    }

    /// Parses an ARM path such as
    /// `/subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.AzureFleet/fleets/{name}`.
    pub fn parse(value: &str) -> Result<Self> {
        let parsed = ids::FLEET.parse(value)?;
        let segment = |name: &str| parsed.get(name).unwrap_or_default().to_string();
        Ok(Self {
            subscription_id: segment("subscriptionId"),
            resource_group_name: segment("resourceGroupName"),
            name: segment("fleetName"),
        })
    }
}

impl fmt::Display for FleetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.AzureFleet/fleets/{}",
            self.subscription_id, self.resource_group_name, self.name
        )
    }
}

impl std::str::FromStr for FleetId {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.AzureFleet/fleets/fleet1";

    #[test]
    fn test_display_is_arm_path() {
        let id = FleetId::new("00000000-0000-0000-0000-000000000000", "rg1", "fleet1");
        assert_eq!(id.to_string(), ID);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = FleetId::parse(ID).unwrap();
        assert_eq!(id.resource_group_name, "rg1");
        assert_eq!(id.name, "fleet1");
        assert_eq!(id.to_string(), ID);
    }

    #[test]
    fn test_parse_accepts_any_literal_case() {
        let id: FleetId = ID.to_lowercase().replace("fleet1", "Fleet1").parse().unwrap();
        assert_eq!(id.name, "Fleet1");
    }

    #[test]
    fn test_parse_rejects_other_resource_types() {
        let err = FleetId::parse(
            "/subscriptions/s/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1",
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidIdentifier { .. }));
    }
}
