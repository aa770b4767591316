//! API tree to configuration tree.
//!
//! One flattener per sub-entity, mirroring [`crate::expand`]. An absent API
//! record flattens to `None` or an empty list. Values the API never returns
//! (passwords, protected settings, custom data) are recovered from the prior
//! local state through a [`StateView`].

mod vm_profile;

pub use vm_profile::*;

use crate::api::*;
use crate::enums::{flatten_enum, ManagedServiceIdentityType};
use crate::error::{ErrorContext, Result};
use crate::model::*;
use serde_json::Value;
use std::fmt;

/// Read-only view of the prior local state, addressed by configuration path.
///
/// Paths are dotted; numeric segments index lists
/// (`compute_profile.0.base_virtual_machine_profile.0.os_profile.0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StateView<'a> {
    node: Option<&'a Value>,
}

impl<'a> StateView<'a> {
    pub fn new(state: &'a Value) -> Self {
        Self { node: Some(state) }
    }

    /// A view with no prior state; every lookup misses.
    pub fn empty() -> Self {
        Self { node: None }
    }

    /// Returns the view rooted at `path`.
    pub fn at(&self, path: &str) -> StateView<'a> {
        StateView {
            node: self.value(path),
        }
    }

    /// Returns the view of the first list element whose `key` equals `value`.
    pub fn find(&self, key: &str, value: &str) -> StateView<'a> {
        let node = self
            .node
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get(key).and_then(Value::as_str) == Some(value))
            });
        StateView { node }
    }

    /// Returns the value at `path`, if present.
    pub fn value(&self, path: &str) -> Option<&'a Value> {
        let mut current = self.node?;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the string at `path`, or `""`.
    pub fn string(&self, path: &str) -> String {
        self.value(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

pub(crate) fn id_of(resource: Option<&SubResource>) -> String {
    resource.and_then(|r| r.id.clone()).unwrap_or_default()
}

pub(crate) fn ids_of(resources: Option<&[SubResource]>) -> Vec<String> {
    resources
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.id.clone())
        .collect()
}

/// Like [`flatten_enum`], but an explicit `None` value flattens to `""`.
pub(crate) fn none_as_empty<E: fmt::Display>(value: Option<&E>) -> String {
    let flattened = flatten_enum(value);
    if flattened.eq_ignore_ascii_case("None") {
        String::new()
    } else {
        flattened
    }
}

/// Flattens a fleet read from the API into a fresh configuration record.
pub fn flatten_fleet(id: &FleetId, fleet: &Fleet, state: StateView<'_>) -> Result<FleetConfig> {
    let props = fleet.properties.as_ref();

    Ok(FleetConfig {
        name: id.name.clone(),
        resource_group_name: id.resource_group_name.clone(),
        location: fleet.location.clone(),
        identity: flatten_identity(fleet.identity.as_ref()),
        plan: flatten_plan(fleet.plan.as_ref()),
        additional_location_profile: flatten_additional_location_profiles(
            props.and_then(|p| p.additional_locations_profile.as_ref()),
            state,
        )
        .flattening("additional_location_profile")?,
        compute_profile: flatten_compute_profile(
            props.and_then(|p| p.compute_profile.as_ref()),
            state.at("compute_profile.0"),
        )
        .flattening("compute_profile")?,
        regular_priority_profile: flatten_regular_priority_profile(
            props.and_then(|p| p.regular_priority_profile.as_ref()),
        ),
        spot_priority_profile: flatten_spot_priority_profile(
            props.and_then(|p| p.spot_priority_profile.as_ref()),
        ),
        vm_sizes_profile: flatten_vm_sizes_profile(props.and_then(|p| p.vm_sizes_profile.as_deref())),
        vm_attributes: flatten_vm_attributes(props.and_then(|p| p.vm_attributes.as_ref())),
        zones: fleet.zones.clone().unwrap_or_default(),
        tags: fleet.tags.clone().unwrap_or_default(),
        unique_id: props.and_then(|p| p.unique_id.clone()).unwrap_or_default(),
        time_created: props.and_then(|p| p.time_created.clone()).unwrap_or_default(),
    })
}

/// Flattens identity. A `None` identity type means no identity block.
pub fn flatten_identity(input: Option<&ManagedServiceIdentity>) -> Option<IdentityConfig> {
    let identity = input?;
    if identity.identity_type == ManagedServiceIdentityType::None {
        return None;
    }
    Some(IdentityConfig {
        identity_type: identity.identity_type.to_string(),
        identity_ids: identity
            .user_assigned_identities
            .as_ref()
            .map(|ids| ids.keys().cloned().collect())
            .unwrap_or_default(),
        principal_id: identity.principal_id.clone().unwrap_or_default(),
        tenant_id: identity.tenant_id.clone().unwrap_or_default(),
    })
}

pub fn flatten_plan(input: Option<&Plan>) -> Option<PlanConfig> {
    let plan = input?;
    Some(PlanConfig {
        name: plan.name.clone(),
        product: plan.product.clone(),
        publisher: plan.publisher.clone(),
        promotion_code: plan.promotion_code.clone().unwrap_or_default(),
    })
}

/// Flattens additional locations, one entry per API location profile.
pub fn flatten_additional_location_profiles(
    input: Option<&AdditionalLocationsProfile>,
    state: StateView<'_>,
) -> Result<Vec<AdditionalLocationProfileConfig>> {
    let Some(profile) = input else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(profile.location_profiles.len());
    for (i, location) in profile.location_profiles.iter().enumerate() {
        let prior = state.at(&format!(
            "additional_location_profile.{}.virtual_machine_profile_override.0",
            i
        ));
        out.push(AdditionalLocationProfileConfig {
            location: location.location.clone(),
            virtual_machine_profile_override: flatten_virtual_machine_profile(
                location.virtual_machine_profile_override.as_ref(),
                prior,
            )?,
        });
    }
    Ok(out)
}

/// Flattens the compute profile. `state` is positioned at `compute_profile.0`.
pub fn flatten_compute_profile(
    input: Option<&ComputeProfile>,
    state: StateView<'_>,
) -> Result<Option<ComputeProfileConfig>> {
    let Some(profile) = input else {
        return Ok(None);
    };
    let caps = profile.additional_virtual_machine_capabilities.as_ref();

    Ok(Some(ComputeProfileConfig {
        additional_capabilities_hibernation_enabled: caps
            .and_then(|c| c.hibernation_enabled)
            .unwrap_or(false),
        additional_capabilities_ultra_ssd_enabled: caps
            .and_then(|c| c.ultra_ssd_enabled)
            .unwrap_or(false),
        base_virtual_machine_profile: flatten_virtual_machine_profile(
            Some(&profile.base_virtual_machine_profile),
            state.at("base_virtual_machine_profile.0"),
        )
        .flattening("base_virtual_machine_profile")?,
        compute_api_version: profile.compute_api_version.clone().unwrap_or_default(),
        platform_fault_domain_count: profile.platform_fault_domain_count.unwrap_or(0),
    }))
}

pub fn flatten_regular_priority_profile(
    input: Option<&RegularPriorityProfile>,
) -> Option<RegularPriorityProfileConfig> {
    let profile = input?;
    Some(RegularPriorityProfileConfig {
        allocation_strategy: flatten_enum(profile.allocation_strategy.as_ref()),
        capacity: profile.capacity.unwrap_or(0),
        min_capacity: profile.min_capacity.unwrap_or(0),
    })
}

pub fn flatten_spot_priority_profile(
    input: Option<&SpotPriorityProfile>,
) -> Option<SpotPriorityProfileConfig> {
    let profile = input?;
    Some(SpotPriorityProfileConfig {
        allocation_strategy: flatten_enum(profile.allocation_strategy.as_ref()),
        capacity: profile.capacity.unwrap_or(0),
        eviction_policy: flatten_enum(profile.eviction_policy.as_ref()),
        maintain: profile.maintain.unwrap_or(false),
        max_price_per_vm: profile.max_price_per_vm.unwrap_or(0.0),
        min_capacity: profile.min_capacity.unwrap_or(0),
    })
}

pub fn flatten_vm_sizes_profile(input: Option<&[VmSizeProfile]>) -> Vec<VmSizeProfileConfig> {
    input
        .unwrap_or_default()
        .iter()
        .map(|size| VmSizeProfileConfig {
            name: size.name.clone(),
            rank: size.rank.unwrap_or(0),
        })
        .collect()
}

fn flatten_int_range(input: Option<&VmAttributeMinMaxInteger>) -> Option<IntegerRangeConfig> {
    let range = input?;
    Some(IntegerRangeConfig {
        min: range.min.unwrap_or(0),
        max: range.max.unwrap_or(0),
    })
}

fn flatten_double_range(input: Option<&VmAttributeMinMaxDouble>) -> Option<DoubleRangeConfig> {
    let range = input?;
    Some(DoubleRangeConfig {
        min: range.min.unwrap_or(0.0),
        max: range.max.unwrap_or(0.0),
    })
}

fn enum_strings<E: fmt::Display>(values: Option<&Vec<E>>) -> Vec<String> {
    values
        .map(|values| values.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

pub fn flatten_vm_attributes(input: Option<&VmAttributes>) -> Option<VmAttributesConfig> {
    let attrs = input?;
    Some(VmAttributesConfig {
        accelerator_count: flatten_int_range(attrs.accelerator_count.as_ref()),
        accelerator_manufacturers: enum_strings(attrs.accelerator_manufacturers.as_ref()),
        accelerator_support: flatten_enum(attrs.accelerator_support.as_ref()),
        accelerator_types: enum_strings(attrs.accelerator_types.as_ref()),
        architecture_types: enum_strings(attrs.architecture_types.as_ref()),
        burstable_support: flatten_enum(attrs.burstable_support.as_ref()),
        cpu_manufacturers: enum_strings(attrs.cpu_manufacturers.as_ref()),
        data_disk_count: flatten_int_range(attrs.data_disk_count.as_ref()),
        excluded_vm_sizes: attrs.excluded_vm_sizes.clone().unwrap_or_default(),
        local_storage_disk_types: enum_strings(attrs.local_storage_disk_types.as_ref()),
        local_storage_in_gib: flatten_double_range(attrs.local_storage_in_gib.as_ref()),
        local_storage_support: flatten_enum(attrs.local_storage_support.as_ref()),
        memory_in_gib: flatten_double_range(Some(&attrs.memory_in_gib)),
        memory_in_gib_per_vcpu: flatten_double_range(attrs.memory_in_gib_per_vcpu.as_ref()),
        network_bandwidth_in_mbps: flatten_double_range(attrs.network_bandwidth_in_mbps.as_ref()),
        network_interface_count: flatten_int_range(attrs.network_interface_count.as_ref()),
        rdma_network_interface_count: flatten_int_range(attrs.rdma_network_interface_count.as_ref()),
        rdma_support: flatten_enum(attrs.rdma_support.as_ref()),
        vcpu_count: flatten_int_range(Some(&attrs.vcpu_count)),
        vm_categories: enum_strings(attrs.vm_categories.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_view_paths() {
        let state = json!({
            "compute_profile": [{
                "base_virtual_machine_profile": [{
                    "os_profile": [{ "custom_data_base64": "abc" }]
                }]
            }]
        });
        let view = StateView::new(&state);
        assert_eq!(
            view.string("compute_profile.0.base_virtual_machine_profile.0.os_profile.0.custom_data_base64"),
            "abc"
        );
        let scoped = view.at("compute_profile.0").at("base_virtual_machine_profile.0");
        assert_eq!(scoped.string("os_profile.0.custom_data_base64"), "abc");
        assert_eq!(view.string("compute_profile.1.missing"), "");
        assert_eq!(StateView::empty().string("anything"), "");
    }

    #[test]
    fn test_nil_in_empty_out() {
        let state = StateView::empty();
        assert_eq!(flatten_identity(None), None);
        assert_eq!(flatten_plan(None), None);
        assert!(flatten_additional_location_profiles(None, state).unwrap().is_empty());
        assert_eq!(flatten_compute_profile(None, state).unwrap(), None);
        assert_eq!(flatten_regular_priority_profile(None), None);
        assert_eq!(flatten_spot_priority_profile(None), None);
        assert!(flatten_vm_sizes_profile(None).is_empty());
        assert_eq!(flatten_vm_attributes(None), None);
    }

    #[test]
    fn test_identity_round_trips_combined_type() {
        let identity = flatten_identity(Some(&ManagedServiceIdentity {
            identity_type: ManagedServiceIdentityType::parse("SystemAssigned, UserAssigned"),
            principal_id: Some("p".to_string()),
            tenant_id: Some("t".to_string()),
            user_assigned_identities: None,
        }))
        .unwrap();
        assert_eq!(identity.identity_type, "SystemAssigned, UserAssigned");
        assert_eq!(identity.principal_id, "p");

        assert_eq!(
            flatten_identity(Some(&ManagedServiceIdentity {
                identity_type: ManagedServiceIdentityType::None,
                ..Default::default()
            })),
            None
        );
    }

    #[test]
    fn test_no_trailing_additional_location_entry() {
        let profile = AdditionalLocationsProfile {
            location_profiles: vec![LocationProfile {
                location: "eastus".to_string(),
                virtual_machine_profile_override: None,
            }],
        };
        let flattened =
            flatten_additional_location_profiles(Some(&profile), StateView::empty()).unwrap();
        assert_eq!(flattened.len(), 1);
        assert_eq!(flattened[0].location, "eastus");
    }

    #[test]
    fn test_fleet_computed_fields() {
        let id = FleetId::new("sub", "rg1", "fleet1");
        let fleet = Fleet {
            location: "westeurope".to_string(),
            properties: Some(FleetProperties {
                unique_id: Some("uid".to_string()),
                time_created: Some("2024-11-01T00:00:00Z".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = flatten_fleet(&id, &fleet, StateView::empty()).unwrap();
        assert_eq!(config.name, "fleet1");
        assert_eq!(config.resource_group_name, "rg1");
        assert_eq!(config.unique_id, "uid");
        assert_eq!(config.time_created, "2024-11-01T00:00:00Z");
        assert!(config.compute_profile.is_none());
        assert!(config.tags.is_empty());
    }
}
