//! Virtual machine profile grammar.
//!
//! Shared by `compute_profile.base_virtual_machine_profile` and
//! `additional_location_profile.virtual_machine_profile_override`.

use super::{
    case_insensitive_equal, json_semantically_equal, none_is_unset, ssh_key_equal, Attribute, Block,
};
use crate::enums::*;
use crate::validate::ids;
use crate::validate::values::{self, Platform};
use serde_json::json;

pub fn virtual_machine_profile_block() -> Block {
    Block::new()
        .with("network_interface", Attribute::block_list(network_interface_block()).required())
        .with("os_profile", Attribute::required_block(os_profile_block()))
        .with("storage_profile", Attribute::required_block(storage_profile_block()))
        .with("boot_diagnostic_enabled", Attribute::optional_bool())
        .with(
            "boot_diagnostic_storage_account_endpoint",
            Attribute::optional_string().validate(values::is_url()),
        )
        .with(
            "capacity_reservation_group_id",
            Attribute::optional_string()
                .validate(ids::CAPACITY_RESERVATION_GROUP.validator())
                .diff_suppress(case_insensitive_equal),
        )
        .with("extension", Attribute::block_list(extension_block()))
        .with("extension_operations_enabled", Attribute::optional_bool().default(json!(true)))
        .with(
            "extensions_time_budget",
            Attribute::optional_string()
                .default(json!("PT1H30M"))
                .validate(values::iso8601_duration_between("PT15M", "PT2H")),
        )
        .with(
            "gallery_application",
            Attribute::block_list(gallery_application_block()).max_items(100),
        )
        .with(
            "license_type",
            Attribute::optional_string().validate(values::string_in_slice(&[
                "RHEL_BYOS",
                "SLES_BYOS",
                "Windows_Client",
                "Windows_Server",
            ])),
        )
        .with(
            "network_api_version",
            Attribute::optional_string()
                .default(json!("2020-11-01"))
                .validate(values::string_in_slice(NetworkApiVersion::VALUES)),
        )
        .with("scheduled_event_os_image_enabled", Attribute::optional_bool())
        .with(
            "scheduled_event_os_image_timeout",
            Attribute::optional_string().validate(values::string_in_slice(&["PT15M"])),
        )
        .with("scheduled_event_termination_enabled", Attribute::optional_bool())
        .with(
            "scheduled_event_termination_timeout",
            Attribute::optional_string().validate(values::iso8601_duration_between("PT5M", "PT15M")),
        )
        .with("security_profile", Attribute::optional_block(security_profile_block()))
        .with(
            "security_posture_reference",
            Attribute::optional_block(security_posture_reference_block()),
        )
        .with(
            "service_artifact_reference_id",
            Attribute::optional_string().validate(ids::SERVICE_ARTIFACT.validator()),
        )
        .with("user_data_base64", Attribute::optional_string().validate(values::is_base64()))
}

// ============================================================================
// OS profile
// ============================================================================

fn os_profile_block() -> Block {
    Block::new()
        .with(
            "custom_data_base64",
            Attribute::optional_string().sensitive().validate(values::is_base64()),
        )
        .with(
            "linux_configuration",
            Attribute::optional_block(linux_configuration_block())
                .exactly_one_of(&["windows_configuration"]),
        )
        .with(
            "windows_configuration",
            Attribute::optional_block(windows_configuration_block())
                .exactly_one_of(&["linux_configuration"]),
        )
}

fn linux_configuration_block() -> Block {
    Block::new()
        .with(
            "admin_username",
            Attribute::required_string().validate(values::admin_username(Platform::Linux)),
        )
        .with(
            "admin_password",
            Attribute::optional_string()
                .sensitive()
                .validate(values::admin_password(Platform::Linux)),
        )
        .with(
            "admin_ssh_key",
            Attribute::block_list(
                Block::new()
                    .with(
                        "public_key",
                        Attribute::required_string()
                            .validate(values::ssh_public_key())
                            .diff_suppress(ssh_key_equal),
                    )
                    .with(
                        "username",
                        Attribute::required_string().validate(values::admin_username(Platform::Linux)),
                    ),
            ),
        )
        .with("bypass_platform_safety_checks_enabled", Attribute::optional_bool())
        .with(
            "computer_name_prefix",
            Attribute::optional_string()
                .computed()
                .validate(values::computer_name_prefix(Platform::Linux)),
        )
        .with("password_authentication_enabled", Attribute::optional_bool())
        .with(
            "patch_assessment_mode",
            Attribute::optional_string()
                .default(json!("ImageDefault"))
                .validate(values::string_in_slice(LinuxPatchAssessmentMode::VALUES)),
        )
        .with(
            "patch_mode",
            Attribute::optional_string()
                .default(json!("ImageDefault"))
                .validate(values::string_in_slice(LinuxVmGuestPatchMode::VALUES)),
        )
        .with("provision_vm_agent_enabled", Attribute::optional_bool().default(json!(true)))
        .with(
            "reboot_setting",
            Attribute::optional_string().validate(values::string_in_slice(LinuxRebootSetting::VALUES)),
        )
        .with(
            "secret",
            Attribute::block_list(
                Block::new()
                    .with(
                        "key_vault_id",
                        Attribute::required_string().validate(ids::KEY_VAULT.validator()),
                    )
                    .with(
                        "certificate",
                        Attribute::block_list(Block::new().with(
                            "url",
                            Attribute::required_string().validate(values::key_vault_item_url()),
                        ))
                        .required()
                        .min_items(1),
                    ),
            ),
        )
        .with("vm_agent_platform_updates_enabled", Attribute::optional_bool())
}

fn windows_configuration_block() -> Block {
    Block::new()
        .with(
            "admin_password",
            Attribute::required_string()
                .sensitive()
                .validate(values::admin_password(Platform::Windows)),
        )
        .with(
            "admin_username",
            Attribute::required_string().validate(values::admin_username(Platform::Windows)),
        )
        .with(
            "additional_unattend_content",
            Attribute::block_list(
                Block::new()
                    .with("content", Attribute::required_string().sensitive())
                    .with(
                        "setting",
                        Attribute::required_string().validate(values::string_in_slice(SettingNames::VALUES)),
                    ),
            ),
        )
        .with("automatic_updates_enabled", Attribute::optional_bool().default(json!(true)))
        .with("bypass_platform_safety_checks_enabled", Attribute::optional_bool())
        .with(
            "computer_name_prefix",
            Attribute::optional_string()
                .computed()
                .validate(values::computer_name_prefix(Platform::Windows)),
        )
        .with("hot_patching_enabled", Attribute::optional_bool())
        .with(
            "patch_assessment_mode",
            Attribute::optional_string()
                .default(json!("ImageDefault"))
                .validate(values::string_in_slice(WindowsPatchAssessmentMode::VALUES)),
        )
        .with(
            "patch_mode",
            Attribute::optional_string()
                .default(json!("AutomaticByOS"))
                .validate(values::string_in_slice(WindowsVmGuestPatchMode::VALUES)),
        )
        .with("provision_vm_agent_enabled", Attribute::optional_bool().default(json!(true)))
        .with(
            "reboot_setting",
            Attribute::optional_string().validate(values::string_in_slice(WindowsRebootSetting::VALUES)),
        )
        .with(
            "secret",
            Attribute::block_list(
                Block::new()
                    .with(
                        "key_vault_id",
                        Attribute::required_string().validate(ids::KEY_VAULT.validator()),
                    )
                    .with(
                        "certificate",
                        Attribute::block_list(
                            Block::new()
                                .with("store", Attribute::required_string().validate(values::string_is_not_empty()))
                                .with(
                                    "url",
                                    Attribute::required_string().validate(values::key_vault_item_url()),
                                ),
                        )
                        .required()
                        .min_items(1),
                    ),
            ),
        )
        .with("time_zone", Attribute::optional_string().validate(values::string_is_not_empty()))
        .with("vm_agent_platform_updates_enabled", Attribute::optional_bool())
        .with(
            "winrm_listener",
            Attribute::block_list(
                Block::new()
                    .with(
                        "protocol",
                        Attribute::required_string().validate(values::string_in_slice(ProtocolTypes::VALUES)),
                    )
                    .with(
                        "certificate_url",
                        Attribute::optional_string().validate(values::key_vault_item_url()),
                    ),
            ),
        )
}

// ============================================================================
// Storage profile
// ============================================================================

fn storage_profile_block() -> Block {
    Block::new()
        .with(
            "data_disk",
            Attribute::block_list(
                Block::new()
                    .with(
                        "caching",
                        Attribute::optional_string()
                .validate(values::string_in_slice(CachingTypes::VALUES))
                .diff_suppress(none_is_unset),
                    )
                    .with(
                        "create_option",
                        Attribute::optional_string()
                            .default(json!("Empty"))
                            .validate(values::string_in_slice(&["Empty", "FromImage"])),
                    )
                    .with(
                        "delete_option",
                        Attribute::optional_string()
                            .default(json!("Delete"))
                            .validate(values::string_in_slice(DiskDeleteOptionTypes::VALUES)),
                    )
                    .with(
                        "disk_encryption_set_id",
                        Attribute::optional_string().validate(ids::DISK_ENCRYPTION_SET.validator()),
                    )
                    .with("disk_size_in_gib", Attribute::optional_int().validate(values::int_between(1, 32767)))
                    .with("lun", Attribute::optional_int().validate(values::int_between(0, 2000)))
                    .with(
                        "storage_account_type",
                        Attribute::optional_string()
                            .validate(values::string_in_slice(StorageAccountTypes::VALUES)),
                    )
                    .with("write_accelerator_enabled", Attribute::optional_bool()),
            ),
        )
        .with(
            "disk_controller_type",
            Attribute::optional_string().validate(values::string_in_slice(DiskControllerTypes::VALUES)),
        )
        .with("image_reference", Attribute::optional_block(image_reference_block()))
        .with("os_disk", Attribute::optional_block(os_disk_block()))
}

fn image_reference_block() -> Block {
    let marketplace = Attribute::optional_string()
        .validate(values::string_is_not_empty())
        .conflicts_with(&["id", "shared_gallery_image_id", "community_gallery_image_id"]);
    Block::new()
        .with(
            "id",
            Attribute::optional_string()
                .validate(ids::any_of(ids::IMAGE_IDS))
                .conflicts_with(&["shared_gallery_image_id", "community_gallery_image_id"]),
        )
        .with(
            "shared_gallery_image_id",
            Attribute::optional_string()
                .validate(ids::SHARED_GALLERY_IMAGE_VERSION.validator())
                .conflicts_with(&["community_gallery_image_id"]),
        )
        .with(
            "community_gallery_image_id",
            Attribute::optional_string().validate(ids::COMMUNITY_GALLERY_IMAGE_VERSION.validator()),
        )
        .with("publisher", marketplace.clone())
        .with("offer", marketplace.clone())
        .with("sku", marketplace.clone())
        .with("version", marketplace)
}

fn os_disk_block() -> Block {
    Block::new()
        .with(
            "caching",
            Attribute::optional_string()
                .validate(values::string_in_slice(CachingTypes::VALUES))
                .diff_suppress(none_is_unset),
        )
        .with(
            "delete_option",
            Attribute::optional_string()
                .default(json!("Delete"))
                .validate(values::string_in_slice(DiskDeleteOptionTypes::VALUES)),
        )
        .with(
            "diff_disk_option",
            Attribute::optional_string().validate(values::string_in_slice(DiffDiskOptions::VALUES)),
        )
        .with(
            "diff_disk_placement",
            Attribute::optional_string().validate(values::string_in_slice(DiffDiskPlacement::VALUES)),
        )
        .with(
            "disk_encryption_set_id",
            Attribute::optional_string()
                .validate(ids::DISK_ENCRYPTION_SET.validator())
                .conflicts_with(&["security_disk_encryption_set_id"]),
        )
        .with(
            "disk_size_in_gib",
            Attribute::optional_int().validate(values::int_between(0, 4095)),
        )
        .with(
            "security_disk_encryption_set_id",
            Attribute::optional_string().validate(ids::DISK_ENCRYPTION_SET.validator()),
        )
        .with(
            "security_encryption_type",
            Attribute::optional_string()
                .validate(values::string_in_slice(SecurityEncryptionTypes::VALUES)),
        )
        .with(
            "storage_account_type",
            Attribute::optional_string().validate(values::string_in_slice(StorageAccountTypes::VALUES)),
        )
        .with("write_accelerator_enabled", Attribute::optional_bool())
}

// ============================================================================
// Network profile
// ============================================================================

fn network_interface_block() -> Block {
    Block::new()
        .with("name", Attribute::required_string().validate(values::string_is_not_empty()))
        .with("accelerated_networking_enabled", Attribute::optional_bool())
        .with(
            "auxiliary_mode",
            Attribute::optional_string()
                .validate(values::string_in_slice(NetworkInterfaceAuxiliaryMode::VALUES))
                .diff_suppress(none_is_unset),
        )
        .with(
            "auxiliary_sku",
            Attribute::optional_string()
                .validate(values::string_in_slice(NetworkInterfaceAuxiliarySku::VALUES))
                .diff_suppress(none_is_unset),
        )
        .with(
            "delete_option",
            Attribute::optional_string().validate(values::string_in_slice(DeleteOptions::VALUES)),
        )
        .with("dns_servers", Attribute::string_list().validate(values::string_is_not_empty()))
        .with(
            "ip_configuration",
            Attribute::block_list(ip_configuration_block()).required().min_items(1),
        )
        .with("ip_forwarding_enabled", Attribute::optional_bool())
        .with(
            "network_security_group_id",
            Attribute::optional_string().validate(ids::NETWORK_SECURITY_GROUP.validator()),
        )
        .with("primary", Attribute::optional_bool())
}

fn ip_configuration_block() -> Block {
    Block::new()
        .with("name", Attribute::required_string().validate(values::string_is_not_empty()))
        .with(
            "application_gateway_backend_address_pool_ids",
            Attribute::string_set().validate(ids::APPLICATION_GATEWAY_BACKEND_POOL.validator()),
        )
        .with(
            "application_security_group_ids",
            Attribute::string_set()
                .max_items(20)
                .validate(ids::APPLICATION_SECURITY_GROUP.validator()),
        )
        .with(
            "load_balancer_backend_address_pool_ids",
            Attribute::string_set().validate(ids::LOAD_BALANCER_BACKEND_POOL.validator()),
        )
        .with("primary", Attribute::optional_bool())
        .with(
            "public_ip_address",
            Attribute::optional_block(public_ip_address_block()),
        )
        .with(
            "subnet_id",
            Attribute::optional_string()
                .validate(ids::SUBNET.validator())
                .diff_suppress(case_insensitive_equal),
        )
        .with(
            "version",
            Attribute::optional_string()
                .default(json!("IPv4"))
                .validate(values::string_in_slice(IpVersion::VALUES)),
        )
}

fn public_ip_address_block() -> Block {
    Block::new()
        .with("name", Attribute::required_string().validate(values::string_is_not_empty()))
        .with(
            "delete_option",
            Attribute::optional_string().validate(values::string_in_slice(DeleteOptions::VALUES)),
        )
        .with(
            "domain_name_label",
            Attribute::optional_string().validate(values::string_is_not_empty()),
        )
        .with(
            "domain_name_label_scope",
            Attribute::optional_string()
                .validate(values::string_in_slice(DomainNameLabelScopeTypes::VALUES)),
        )
        .with(
            "idle_timeout_in_minutes",
            Attribute::optional_int().validate(values::int_between(4, 32)),
        )
        .with(
            "ip_tag",
            Attribute::block_list(
                Block::new()
                    .with("tag", Attribute::required_string().validate(values::string_is_not_empty()))
                    .with("type", Attribute::required_string().validate(values::string_is_not_empty())),
            ),
        )
        .with(
            "public_ip_prefix_id",
            Attribute::optional_string().validate(ids::PUBLIC_IP_PREFIX.validator()),
        )
        .with(
            "sku_name",
            Attribute::optional_string()
                .validate(values::string_in_slice(PublicIpAddressSkuName::VALUES)),
        )
        .with(
            "sku_tier",
            Attribute::optional_string()
                .validate(values::string_in_slice(PublicIpAddressSkuTier::VALUES)),
        )
        .with(
            "version",
            Attribute::optional_string()
                .default(json!("IPv4"))
                .validate(values::string_in_slice(IpVersion::VALUES)),
        )
}

// ============================================================================
// Extensions, applications, security
// ============================================================================

fn extension_block() -> Block {
    Block::new()
        .with("name", Attribute::required_string().validate(values::string_is_not_empty()))
        .with("publisher", Attribute::required_string().validate(values::string_is_not_empty()))
        .with("type", Attribute::required_string().validate(values::string_is_not_empty()))
        .with(
            "type_handler_version",
            Attribute::required_string().validate(values::string_is_not_empty()),
        )
        .with("auto_upgrade_minor_version_enabled", Attribute::optional_bool())
        .with("automatic_upgrade_enabled", Attribute::optional_bool())
        .with(
            "extensions_to_provision_after_vm_creation",
            Attribute::string_list().validate(values::string_is_not_empty()),
        )
        .with(
            "force_extension_execution_on_change",
            Attribute::optional_string().validate(values::string_is_not_empty()),
        )
        .with(
            "protected_settings_from_key_vault",
            Attribute::optional_block(
                Block::new()
                    .with(
                        "secret_url",
                        Attribute::required_string().validate(values::key_vault_item_url()),
                    )
                    .with(
                        "source_vault_id",
                        Attribute::required_string().validate(ids::KEY_VAULT.validator()),
                    ),
            )
            .conflicts_with(&["protected_settings_json"]),
        )
        .with(
            "protected_settings_json",
            Attribute::optional_string()
                .sensitive()
                .validate(values::is_json())
                .conflicts_with(&["protected_settings_from_key_vault"]),
        )
        .with(
            "settings_json",
            Attribute::optional_string()
                .validate(values::is_json())
                .diff_suppress(json_semantically_equal),
        )
        .with("suppress_failures_enabled", Attribute::optional_bool())
}

fn gallery_application_block() -> Block {
    Block::new()
        .with(
            "version_id",
            Attribute::required_string().validate(ids::GALLERY_APPLICATION_VERSION.validator()),
        )
        .with("automatic_upgrade_enabled", Attribute::optional_bool())
        .with("configuration_blob_uri", Attribute::optional_string().validate(values::is_url()))
        .with("order", Attribute::optional_int().validate(values::int_between(0, 2_147_483_647)))
        .with("tag", Attribute::optional_string().validate(values::string_is_not_empty()))
        .with("treat_failure_as_deployment_failure_enabled", Attribute::optional_bool())
}

fn security_profile_block() -> Block {
    Block::new()
        .with("encryption_at_host_enabled", Attribute::optional_bool())
        .with(
            "proxy_agent",
            Attribute::optional_block(
                Block::new()
                    .with("enabled", Attribute::optional_bool())
                    .with("key_incarnation_value", Attribute::optional_int())
                    .with(
                        "mode",
                        Attribute::optional_string().validate(values::string_in_slice(ProxyAgentMode::VALUES)),
                    ),
            ),
        )
        .with("secure_boot_enabled", Attribute::optional_bool())
        .with(
            "security_type",
            Attribute::optional_string().validate(values::string_in_slice(SecurityTypes::VALUES)),
        )
        .with(
            "user_assigned_identity_id",
            Attribute::optional_string().validate(ids::USER_ASSIGNED_IDENTITY.validator()),
        )
        .with("vtpm_enabled", Attribute::optional_bool())
}

fn security_posture_reference_block() -> Block {
    Block::new()
        .with("id", Attribute::required_string().validate(values::string_is_not_empty()))
        .with(
            "excluded_extensions",
            Attribute::string_list().validate(values::string_is_not_empty()),
        )
        .with("override_enabled", Attribute::optional_bool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn profile_schema() -> Schema {
        Schema::new("profile", virtual_machine_profile_block())
    }

    #[test]
    fn test_sensitive_leaves() {
        let schema = profile_schema();
        for path in [
            "os_profile.0.custom_data_base64",
            "os_profile.0.linux_configuration.0.admin_password",
            "os_profile.0.windows_configuration.0.admin_password",
            "os_profile.0.windows_configuration.0.additional_unattend_content.0.content",
            "extension.0.protected_settings_json",
        ] {
            assert!(schema.lookup(path).unwrap().sensitive, "{} should be sensitive", path);
        }
    }

    #[test]
    fn test_defaults_declared() {
        let schema = profile_schema();
        let default = |path: &str| schema.lookup(path).unwrap().default.clone();
        assert_eq!(default("extension_operations_enabled"), Some(json!(true)));
        assert_eq!(default("extensions_time_budget"), Some(json!("PT1H30M")));
        assert_eq!(
            default("os_profile.0.windows_configuration.0.patch_mode"),
            Some(json!("AutomaticByOS"))
        );
        assert_eq!(
            default("network_interface.0.ip_configuration.0.version"),
            Some(json!("IPv4"))
        );
        assert_eq!(default("storage_profile.0.os_disk.0.delete_option"), Some(json!("Delete")));
    }

    #[test]
    fn test_protected_settings_conflict() {
        let schema = profile_schema();
        let attr = schema.lookup("extension.0.protected_settings_json").unwrap();
        assert_eq!(attr.conflicts_with, vec!["protected_settings_from_key_vault"]);
        assert!(schema
            .diff_suppressed("extension.0.settings_json", "{\"a\": 1}", "{\"a\":1}"));
    }
}
