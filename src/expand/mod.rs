//! Configuration tree to API tree.
//!
//! One expander per nested block. Expanders are pure: an absent or empty
//! input yields `None`, which the API reads as "do not set". Enum strings are
//! coerced without validation since the schema already checked them.
//!
//! Only the extension JSON, data disk, additional location and compute
//! profile expanders can fail.

mod vm_profile;

pub use vm_profile::*;

use crate::api::*;
use crate::enums::*;
use crate::error::{ErrorContext, Result};
use crate::model::*;
use std::collections::BTreeMap;

pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn non_empty_list(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

pub(crate) fn non_zero(value: i64) -> Option<i64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn enum_list<E: for<'a> From<&'a str>>(values: &[String]) -> Option<Vec<E>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|v| E::from(v.as_str())).collect())
    }
}

/// Expands the whole configuration into a fleet record.
pub fn expand_fleet(config: &FleetConfig) -> Result<Fleet> {
    let properties = FleetProperties {
        additional_locations_profile: expand_additional_location_profiles(
            &config.additional_location_profile,
        )
        .expanding("additional_location_profile")?,
        compute_profile: expand_compute_profile(config.compute_profile.as_ref())
            .expanding("compute_profile")?,
        regular_priority_profile: expand_regular_priority_profile(
            config.regular_priority_profile.as_ref(),
        ),
        spot_priority_profile: expand_spot_priority_profile(config.spot_priority_profile.as_ref()),
        vm_attributes: expand_vm_attributes(config.vm_attributes.as_ref()),
        vm_sizes_profile: expand_vm_sizes_profile(&config.vm_sizes_profile),
        ..Default::default()
    };

    Ok(Fleet {
        location: config.location.clone(),
        identity: expand_identity(config.identity.as_ref()),
        plan: expand_plan(config.plan.as_ref()),
        properties: Some(properties),
        tags: Some(config.tags.clone()),
        zones: non_empty_list(&config.zones),
        ..Default::default()
    })
}

/// Expands identity; `identity_ids` become the user-assigned identity map.
pub fn expand_identity(input: Option<&IdentityConfig>) -> Option<ManagedServiceIdentity> {
    let identity = input?;
    let user_assigned_identities = if identity.identity_ids.is_empty() {
        None
    } else {
        Some(
            identity
                .identity_ids
                .iter()
                .map(|id| (id.clone(), UserAssignedIdentity::default()))
                .collect::<BTreeMap<_, _>>(),
        )
    };
    Some(ManagedServiceIdentity {
        identity_type: normalize_identity_type(&identity.identity_type),
        principal_id: None,
        tenant_id: None,
        user_assigned_identities,
    })
}

/// Parses an identity type, accepting the API's comma-joined form with or
/// without a space.
pub fn normalize_identity_type(value: &str) -> ManagedServiceIdentityType {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.eq_ignore_ascii_case("SystemAssigned,UserAssigned") {
        ManagedServiceIdentityType::SystemAndUserAssigned
    } else {
        ManagedServiceIdentityType::parse(value)
    }
}

pub fn expand_plan(input: Option<&PlanConfig>) -> Option<Plan> {
    let plan = input?;
    Some(Plan {
        name: plan.name.clone(),
        product: plan.product.clone(),
        publisher: plan.publisher.clone(),
        promotion_code: non_empty(&plan.promotion_code),
        version: None,
    })
}

pub fn expand_additional_location_profiles(
    input: &[AdditionalLocationProfileConfig],
) -> Result<Option<AdditionalLocationsProfile>> {
    if input.is_empty() {
        return Ok(None);
    }

    let mut location_profiles = Vec::with_capacity(input.len());
    for profile in input {
        location_profiles.push(LocationProfile {
            location: profile.location.clone(),
            virtual_machine_profile_override: expand_virtual_machine_profile(
                profile.virtual_machine_profile_override.as_ref(),
            )
            .expanding("virtual_machine_profile_override")?,
        });
    }
    Ok(Some(AdditionalLocationsProfile { location_profiles }))
}

pub fn expand_compute_profile(input: Option<&ComputeProfileConfig>) -> Result<Option<ComputeProfile>> {
    let Some(profile) = input else {
        return Ok(None);
    };
    let base = expand_virtual_machine_profile(profile.base_virtual_machine_profile.as_ref())
        .expanding("base_virtual_machine_profile")?;

    Ok(Some(ComputeProfile {
        additional_virtual_machine_capabilities: Some(AdditionalCapabilities {
            hibernation_enabled: Some(profile.additional_capabilities_hibernation_enabled),
            ultra_ssd_enabled: Some(profile.additional_capabilities_ultra_ssd_enabled),
        }),
        base_virtual_machine_profile: base.unwrap_or_default(),
        compute_api_version: non_empty(&profile.compute_api_version),
        platform_fault_domain_count: Some(profile.platform_fault_domain_count),
    }))
}

pub fn expand_regular_priority_profile(
    input: Option<&RegularPriorityProfileConfig>,
) -> Option<RegularPriorityProfile> {
    let profile = input?;
    Some(RegularPriorityProfile {
        allocation_strategy: expand_enum(&profile.allocation_strategy),
        capacity: Some(profile.capacity),
        min_capacity: Some(profile.min_capacity),
    })
}

pub fn expand_spot_priority_profile(
    input: Option<&SpotPriorityProfileConfig>,
) -> Option<SpotPriorityProfile> {
    let profile = input?;
    Some(SpotPriorityProfile {
        allocation_strategy: expand_enum(&profile.allocation_strategy),
        capacity: Some(profile.capacity),
        eviction_policy: expand_enum(&profile.eviction_policy),
        maintain: Some(profile.maintain),
        // Zero is rejected by the schema, so it means "unset".
        max_price_per_vm: (profile.max_price_per_vm != 0.0).then_some(profile.max_price_per_vm),
        min_capacity: Some(profile.min_capacity),
    })
}

pub fn expand_vm_sizes_profile(input: &[VmSizeProfileConfig]) -> Option<Vec<VmSizeProfile>> {
    if input.is_empty() {
        return None;
    }
    Some(
        input
            .iter()
            .map(|size| VmSizeProfile {
                name: size.name.clone(),
                rank: Some(size.rank),
            })
            .collect(),
    )
}

fn expand_int_range(input: Option<&IntegerRangeConfig>) -> Option<VmAttributeMinMaxInteger> {
    let range = input?;
    Some(VmAttributeMinMaxInteger {
        min: Some(range.min),
        max: non_zero(range.max),
    })
}

fn expand_double_range(input: Option<&DoubleRangeConfig>) -> Option<VmAttributeMinMaxDouble> {
    let range = input?;
    Some(VmAttributeMinMaxDouble {
        min: Some(range.min),
        max: (range.max != 0.0).then_some(range.max),
    })
}

pub fn expand_vm_attributes(input: Option<&VmAttributesConfig>) -> Option<VmAttributes> {
    let attrs = input?;
    Some(VmAttributes {
        accelerator_count: expand_int_range(attrs.accelerator_count.as_ref()),
        accelerator_manufacturers: enum_list(&attrs.accelerator_manufacturers),
        accelerator_support: expand_enum(&attrs.accelerator_support),
        accelerator_types: enum_list(&attrs.accelerator_types),
        architecture_types: enum_list(&attrs.architecture_types),
        burstable_support: expand_enum(&attrs.burstable_support),
        cpu_manufacturers: enum_list(&attrs.cpu_manufacturers),
        data_disk_count: expand_int_range(attrs.data_disk_count.as_ref()),
        excluded_vm_sizes: non_empty_list(&attrs.excluded_vm_sizes),
        local_storage_disk_types: enum_list(&attrs.local_storage_disk_types),
        local_storage_in_gib: expand_double_range(attrs.local_storage_in_gib.as_ref()),
        local_storage_support: expand_enum(&attrs.local_storage_support),
        memory_in_gib: expand_double_range(attrs.memory_in_gib.as_ref()).unwrap_or_default(),
        memory_in_gib_per_vcpu: expand_double_range(attrs.memory_in_gib_per_vcpu.as_ref()),
        network_bandwidth_in_mbps: expand_double_range(attrs.network_bandwidth_in_mbps.as_ref()),
        network_interface_count: expand_int_range(attrs.network_interface_count.as_ref()),
        rdma_network_interface_count: expand_int_range(attrs.rdma_network_interface_count.as_ref()),
        rdma_support: expand_enum(&attrs.rdma_support),
        vm_categories: enum_list(&attrs.vm_categories),
        vcpu_count: expand_int_range(attrs.vcpu_count.as_ref()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_in_nil_out() {
        assert_eq!(expand_identity(None), None);
        assert_eq!(expand_plan(None), None);
        assert_eq!(expand_additional_location_profiles(&[]).unwrap(), None);
        assert_eq!(expand_compute_profile(None).unwrap(), None);
        assert_eq!(expand_regular_priority_profile(None), None);
        assert_eq!(expand_spot_priority_profile(None), None);
        assert_eq!(expand_vm_sizes_profile(&[]), None);
        assert_eq!(expand_vm_attributes(None), None);
    }

    #[test]
    fn test_identity_type_normalization() {
        assert_eq!(
            normalize_identity_type("SystemAssigned,UserAssigned"),
            ManagedServiceIdentityType::SystemAndUserAssigned
        );
        assert_eq!(
            normalize_identity_type("SystemAssigned, UserAssigned"),
            ManagedServiceIdentityType::SystemAndUserAssigned
        );
        assert_eq!(
            normalize_identity_type("userassigned"),
            ManagedServiceIdentityType::UserAssigned
        );
    }

    #[test]
    fn test_identity_ids_become_map_keys() {
        let id = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/uai";
        let identity = expand_identity(Some(&IdentityConfig {
            identity_type: "UserAssigned".to_string(),
            identity_ids: vec![id.to_string()],
            ..Default::default()
        }))
        .unwrap();
        let map = identity.user_assigned_identities.unwrap();
        assert!(map.contains_key(id));
    }

    #[test]
    fn test_range_max_only_when_non_zero() {
        let attrs = expand_vm_attributes(Some(&VmAttributesConfig {
            vcpu_count: Some(IntegerRangeConfig { min: 2, max: 0 }),
            memory_in_gib: Some(DoubleRangeConfig { min: 0.0, max: 16.0 }),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(attrs.vcpu_count, VmAttributeMinMaxInteger { min: Some(2), max: None });
        assert_eq!(attrs.memory_in_gib.min, Some(0.0));
        assert_eq!(attrs.memory_in_gib.max, Some(16.0));
        assert_eq!(attrs.accelerator_count, None);
    }

    #[test]
    fn test_priority_profiles() {
        let regular = expand_regular_priority_profile(Some(&RegularPriorityProfileConfig {
            allocation_strategy: "LowestPrice".to_string(),
            capacity: 2,
            min_capacity: 1,
        }))
        .unwrap();
        assert_eq!(
            regular.allocation_strategy,
            Some(RegularPriorityAllocationStrategy::LowestPrice)
        );
        assert_eq!(regular.min_capacity, Some(1));

        let spot = expand_spot_priority_profile(Some(&SpotPriorityProfileConfig {
            allocation_strategy: "PriceCapacityOptimized".to_string(),
            capacity: 2,
            eviction_policy: "Delete".to_string(),
            maintain: true,
            max_price_per_vm: 0.0,
            min_capacity: 1,
        }))
        .unwrap();
        assert_eq!(spot.max_price_per_vm, None);
        assert_eq!(spot.maintain, Some(true));
    }

    #[test]
    fn test_compute_profile_error_names_the_field() {
        let profile = ComputeProfileConfig {
            base_virtual_machine_profile: Some(VirtualMachineProfileConfig {
                extension: vec![ExtensionConfig {
                    settings_json: "nope".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = expand_compute_profile(Some(&profile)).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("expanding base_virtual_machine_profile: expanding extension"));
    }
}
