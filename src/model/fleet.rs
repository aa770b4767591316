//! Fleet-level configuration records.

use super::{singleton, VirtualMachineProfileConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `azurerm_azure_fleet` configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    #[serde(with = "singleton")]
    pub identity: Option<IdentityConfig>,
    #[serde(with = "singleton")]
    pub plan: Option<PlanConfig>,
    pub additional_location_profile: Vec<AdditionalLocationProfileConfig>,
    #[serde(with = "singleton")]
    pub compute_profile: Option<ComputeProfileConfig>,
    #[serde(with = "singleton")]
    pub regular_priority_profile: Option<RegularPriorityProfileConfig>,
    #[serde(with = "singleton")]
    pub spot_priority_profile: Option<SpotPriorityProfileConfig>,
    pub vm_sizes_profile: Vec<VmSizeProfileConfig>,
    #[serde(with = "singleton")]
    pub vm_attributes: Option<VmAttributesConfig>,
    pub zones: Vec<String>,
    pub tags: BTreeMap<String, String>,
    /// Computed by the API.
    pub unique_id: String,
    /// Computed by the API.
    pub time_created: String,
}

/// System- and/or user-assigned managed identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    #[serde(rename = "type")]
    pub identity_type: String,
    pub identity_ids: Vec<String>,
    pub principal_id: String,
    pub tenant_id: String,
}

/// Marketplace plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub name: String,
    pub product: String,
    pub publisher: String,
    pub promotion_code: String,
}

/// An extra region with an optional VM profile override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalLocationProfileConfig {
    pub location: String,
    #[serde(with = "singleton")]
    pub virtual_machine_profile_override: Option<VirtualMachineProfileConfig>,
}

/// Compute profile: the base VM template plus fleet-wide capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeProfileConfig {
    pub additional_capabilities_hibernation_enabled: bool,
    pub additional_capabilities_ultra_ssd_enabled: bool,
    #[serde(with = "singleton")]
    pub base_virtual_machine_profile: Option<VirtualMachineProfileConfig>,
    pub compute_api_version: String,
    pub platform_fault_domain_count: i64,
}

/// Regular (non-evictable) capacity pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegularPriorityProfileConfig {
    pub allocation_strategy: String,
    pub capacity: i64,
    pub min_capacity: i64,
}

/// Spot (evictable) capacity pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotPriorityProfileConfig {
    pub allocation_strategy: String,
    pub capacity: i64,
    pub eviction_policy: String,
    pub maintain: bool,
    pub max_price_per_vm: f64,
    pub min_capacity: i64,
}

/// A candidate VM size and its rank for the `Prioritized` strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmSizeProfileConfig {
    pub name: String,
    pub rank: i64,
}

/// Integer min/max range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegerRangeConfig {
    pub min: i64,
    pub max: i64,
}

/// Floating point min/max range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleRangeConfig {
    pub min: f64,
    pub max: f64,
}

/// Attribute-based VM size selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmAttributesConfig {
    #[serde(with = "singleton")]
    pub accelerator_count: Option<IntegerRangeConfig>,
    pub accelerator_manufacturers: Vec<String>,
    pub accelerator_support: String,
    pub accelerator_types: Vec<String>,
    pub architecture_types: Vec<String>,
    pub burstable_support: String,
    pub cpu_manufacturers: Vec<String>,
    #[serde(with = "singleton")]
    pub data_disk_count: Option<IntegerRangeConfig>,
    pub excluded_vm_sizes: Vec<String>,
    pub local_storage_disk_types: Vec<String>,
    #[serde(with = "singleton")]
    pub local_storage_in_gib: Option<DoubleRangeConfig>,
    pub local_storage_support: String,
    #[serde(with = "singleton")]
    pub memory_in_gib: Option<DoubleRangeConfig>,
    #[serde(with = "singleton")]
    pub memory_in_gib_per_vcpu: Option<DoubleRangeConfig>,
    #[serde(with = "singleton")]
    pub network_bandwidth_in_mbps: Option<DoubleRangeConfig>,
    #[serde(with = "singleton")]
    pub network_interface_count: Option<IntegerRangeConfig>,
    #[serde(with = "singleton")]
    pub rdma_network_interface_count: Option<IntegerRangeConfig>,
    pub rdma_support: String,
    #[serde(with = "singleton")]
    pub vcpu_count: Option<IntegerRangeConfig>,
    pub vm_categories: Vec<String>,
}
