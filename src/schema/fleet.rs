//! Top-level `azurerm_azure_fleet` grammar.

use super::{location_equal, virtual_machine_profile_block, Attribute, Block, Schema};
use crate::enums::*;
use crate::validate::ids;
use crate::validate::values;
use serde_json::json;

/// Resource type name used in the host dialect.
pub const RESOURCE_TYPE: &str = "azurerm_azure_fleet";

/// Builds the complete fleet schema.
pub fn fleet_schema() -> Schema {
    Schema::new(
        RESOURCE_TYPE,
        Block::new()
            .with(
                "name",
                Attribute::required_string()
                    .force_new()
                    .validate(values::fleet_name()),
            )
            .with(
                "resource_group_name",
                Attribute::required_string()
                    .force_new()
                    .validate(values::string_len_between(1, 90)),
            )
            .with(
                "location",
                Attribute::required_string()
                    .force_new()
                    .validate(values::string_is_not_empty())
                    .diff_suppress(location_equal),
            )
            .with("identity", Attribute::optional_block(identity_block()))
            .with("plan", Attribute::optional_block(plan_block()))
            .with(
                "additional_location_profile",
                Attribute::block_list(
                    Block::new()
                        .with(
                            "location",
                            Attribute::required_string()
                                .validate(values::string_is_not_empty())
                                .diff_suppress(location_equal),
                        )
                        .with(
                            "virtual_machine_profile_override",
                            Attribute::optional_block(virtual_machine_profile_block()),
                        ),
                ),
            )
            .with("compute_profile", Attribute::required_block(compute_profile_block()))
            .with(
                "regular_priority_profile",
                Attribute::required_block(
                    Block::new()
                        .with(
                            "allocation_strategy",
                            Attribute::optional_string()
                                .default(json!("LowestPrice"))
                                .validate(values::string_in_slice(
                                    RegularPriorityAllocationStrategy::VALUES,
                                )),
                        )
                        .with("capacity", Attribute::required_int().validate(values::int_between(0, 10_000)))
                        .with(
                            "min_capacity",
                            Attribute::optional_int().validate(values::int_between(0, 10_000)),
                        ),
                ),
            )
            .with(
                "spot_priority_profile",
                Attribute::optional_block(
                    Block::new()
                        .with(
                            "allocation_strategy",
                            Attribute::optional_string()
                                .default(json!("PriceCapacityOptimized"))
                                .validate(values::string_in_slice(SpotAllocationStrategy::VALUES)),
                        )
                        .with("capacity", Attribute::required_int().validate(values::int_between(0, 10_000)))
                        .with(
                            "eviction_policy",
                            Attribute::optional_string()
                                .default(json!("Delete"))
                                .validate(values::string_in_slice(EvictionPolicy::VALUES)),
                        )
                        .with("maintain", Attribute::optional_bool().default(json!(true)))
                        .with("max_price_per_vm", Attribute::optional_float().validate(values::spot_max_price()))
                        .with(
                            "min_capacity",
                            Attribute::optional_int().validate(values::int_between(0, 10_000)),
                        ),
                ),
            )
            .with(
                "vm_sizes_profile",
                Attribute::block_list(
                    Block::new()
                        .with("name", Attribute::required_string().validate(values::string_is_not_empty()))
                        .with(
                            "rank",
                            Attribute::optional_int().validate(values::int_between(0, 65_535)),
                        ),
                )
                .required()
                .min_items(1)
                .max_items(15),
            )
            .with("vm_attributes", Attribute::optional_block(vm_attributes_block()))
            .with("zones", Attribute::string_set().validate(values::string_is_not_empty()))
            .with("tags", Attribute::optional_map())
            .with("unique_id", Attribute::computed_string())
            .with("time_created", Attribute::computed_string()),
    )
}

fn identity_block() -> Block {
    Block::new()
        .with(
            "type",
            Attribute::required_string().validate(values::string_in_slice(&[
                "SystemAssigned",
                "UserAssigned",
                "SystemAssigned, UserAssigned",
            ])),
        )
        .with(
            "identity_ids",
            Attribute::string_set().validate(ids::USER_ASSIGNED_IDENTITY.validator()),
        )
        .with("principal_id", Attribute::computed_string())
        .with("tenant_id", Attribute::computed_string())
}

fn plan_block() -> Block {
    let required = || Attribute::required_string().validate(values::string_is_not_empty());
    Block::new()
        .with("name", required())
        .with("product", required())
        .with("publisher", required())
        .with(
            "promotion_code",
            Attribute::optional_string().validate(values::string_is_not_empty()),
        )
}

fn compute_profile_block() -> Block {
    Block::new()
        .with(
            "base_virtual_machine_profile",
            Attribute::required_block(virtual_machine_profile_block()),
        )
        .with(
            "compute_api_version",
            Attribute::required_string().validate(values::string_is_not_empty()),
        )
        .with(
            "platform_fault_domain_count",
            Attribute::required_int().validate(values::int_between(1, 3)),
        )
        .with("additional_capabilities_hibernation_enabled", Attribute::optional_bool())
        .with("additional_capabilities_ultra_ssd_enabled", Attribute::optional_bool())
}

fn int_range_block(min_floor: i64) -> Block {
    Block::new()
        .with("min", Attribute::optional_int().validate(values::int_at_least(min_floor)))
        .with("max", Attribute::optional_int().validate(values::int_at_least(min_floor)))
}

fn float_range_block() -> Block {
    Block::new()
        .with("min", Attribute::optional_float().validate(values::float_at_least(0.0)))
        .with("max", Attribute::optional_float().validate(values::float_at_least(0.0)))
}

fn vm_attributes_block() -> Block {
    let support = || {
        Attribute::optional_string()
            .default(json!("Excluded"))
            .validate(values::string_in_slice(VmAttributeSupport::VALUES))
    };
    Block::new()
        .with(
            "memory_in_gib",
            Attribute::required_block(float_range_block()),
        )
        .with("vcpu_count", Attribute::required_block(int_range_block(0)))
        .with("accelerator_count", Attribute::optional_block(int_range_block(0)))
        .with(
            "accelerator_manufacturers",
            Attribute::string_set().validate(values::string_in_slice(AcceleratorManufacturer::VALUES)),
        )
        .with("accelerator_support", support())
        .with(
            "accelerator_types",
            Attribute::string_set().validate(values::string_in_slice(AcceleratorType::VALUES)),
        )
        .with(
            "architecture_types",
            Attribute::string_set().validate(values::string_in_slice(ArchitectureType::VALUES)),
        )
        .with("burstable_support", support())
        .with(
            "cpu_manufacturers",
            Attribute::string_set().validate(values::string_in_slice(CpuManufacturer::VALUES)),
        )
        .with("data_disk_count", Attribute::optional_block(int_range_block(0)))
        .with(
            "excluded_vm_sizes",
            Attribute::string_set().validate(values::string_is_not_empty()),
        )
        .with(
            "local_storage_disk_types",
            Attribute::string_set().validate(values::string_in_slice(LocalStorageDiskType::VALUES)),
        )
        .with("local_storage_in_gib", Attribute::optional_block(float_range_block()))
        .with("local_storage_support", support().default(json!("Included")))
        .with("memory_in_gib_per_vcpu", Attribute::optional_block(float_range_block()))
        .with("network_bandwidth_in_mbps", Attribute::optional_block(float_range_block()))
        .with("network_interface_count", Attribute::optional_block(int_range_block(0)))
        .with("rdma_network_interface_count", Attribute::optional_block(int_range_block(0)))
        .with("rdma_support", support())
        .with(
            "vm_categories",
            Attribute::string_set().validate(values::string_in_slice(VmCategory::VALUES)),
        )
}
