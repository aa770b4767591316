//! Virtual machine profile expanders.

use super::{non_empty, non_empty_list, non_zero};
use crate::api::*;
use crate::enums::*;
use crate::error::{Error, ErrorContext, Result};
use crate::model::*;
use std::collections::HashSet;

/// Path of the authorized keys file for `username`.
pub fn ssh_key_path(username: &str) -> String {
    format!("/home/{}/.ssh/authorized_keys", username)
}

pub fn expand_virtual_machine_profile(
    input: Option<&VirtualMachineProfileConfig>,
) -> Result<Option<BaseVirtualMachineProfile>> {
    let Some(profile) = input else {
        return Ok(None);
    };

    let mut os_profile = expand_os_profile(profile.os_profile.as_ref());
    if let Some(os) = os_profile.as_mut() {
        os.allow_extension_operations = Some(profile.extension_operations_enabled);
    }

    let os_type = profile
        .os_profile
        .as_ref()
        .and_then(|os| os.configuration().ok())
        .map(|config| match config {
            OsConfiguration::Linux(_) => OperatingSystemTypes::Linux,
            OsConfiguration::Windows(_) => OperatingSystemTypes::Windows,
        });

    Ok(Some(BaseVirtualMachineProfile {
        application_profile: expand_gallery_applications(&profile.gallery_application),
        capacity_reservation: non_empty(&profile.capacity_reservation_group_id).map(|id| {
            CapacityReservationProfile {
                capacity_reservation_group: Some(SubResource::new(id)),
            }
        }),
        diagnostics_profile: Some(DiagnosticsProfile {
            boot_diagnostics: Some(BootDiagnostics {
                enabled: Some(profile.boot_diagnostic_enabled),
                storage_uri: non_empty(&profile.boot_diagnostic_storage_account_endpoint),
            }),
        }),
        extension_profile: expand_extension_profile(
            &profile.extension,
            &profile.extensions_time_budget,
        )
        .expanding("extension")?,
        license_type: non_empty(&profile.license_type),
        network_profile: expand_network_profile(
            &profile.network_interface,
            &profile.network_api_version,
        ),
        os_profile,
        scheduled_events_profile: expand_scheduled_events(profile),
        security_posture_reference: expand_security_posture_reference(
            profile.security_posture_reference.as_ref(),
        ),
        security_profile: expand_security_profile(profile.security_profile.as_ref()),
        service_artifact_reference: non_empty(&profile.service_artifact_reference_id)
            .map(|id| ServiceArtifactReference { id: Some(id) }),
        storage_profile: expand_storage_profile(profile.storage_profile.as_ref(), os_type)
            .expanding("storage_profile")?,
        user_data: non_empty(&profile.user_data_base64),
        time_created: None,
    }))
}

// ============================================================================
// OS profile
// ============================================================================

pub fn expand_os_profile(input: Option<&OsProfileConfig>) -> Option<OsProfile> {
    let profile = input?;
    let custom_data = non_empty(profile.custom_data_base64.expose());

    if let Some(linux) = &profile.linux_configuration {
        return Some(OsProfile {
            admin_password: non_empty(linux.admin_password.expose()),
            admin_username: non_empty(&linux.admin_username),
            computer_name_prefix: non_empty(&linux.computer_name_prefix),
            custom_data,
            linux_configuration: Some(expand_linux_configuration(linux)),
            secrets: expand_linux_secrets(&linux.secret),
            ..Default::default()
        });
    }

    if let Some(windows) = &profile.windows_configuration {
        return Some(OsProfile {
            admin_password: non_empty(windows.admin_password.expose()),
            admin_username: non_empty(&windows.admin_username),
            computer_name_prefix: non_empty(&windows.computer_name_prefix),
            custom_data,
            windows_configuration: Some(expand_windows_configuration(windows)),
            secrets: expand_windows_secrets(&windows.secret),
            ..Default::default()
        });
    }

    Some(OsProfile {
        custom_data,
        ..Default::default()
    })
}

pub fn expand_linux_configuration(input: &LinuxConfigurationConfig) -> LinuxConfiguration {
    let automatic_by_platform_settings =
        if !input.reboot_setting.is_empty() || input.bypass_platform_safety_checks_enabled {
            Some(LinuxAutomaticByPlatformSettings {
                bypass_platform_safety_checks_on_user_schedule: Some(
                    input.bypass_platform_safety_checks_enabled,
                ),
                reboot_setting: expand_enum(&input.reboot_setting),
            })
        } else {
            None
        };

    LinuxConfiguration {
        disable_password_authentication: Some(!input.password_authentication_enabled),
        enable_vm_agent_platform_updates: Some(input.vm_agent_platform_updates_enabled),
        patch_settings: Some(LinuxPatchSettings {
            assessment_mode: expand_enum(&input.patch_assessment_mode),
            automatic_by_platform_settings,
            patch_mode: expand_enum(&input.patch_mode),
        }),
        provision_vm_agent: Some(input.provision_vm_agent_enabled),
        ssh: expand_ssh_keys(&input.admin_ssh_key),
    }
}

pub fn expand_ssh_keys(input: &[AdminSshKeyConfig]) -> Option<SshConfiguration> {
    if input.is_empty() {
        return None;
    }
    Some(SshConfiguration {
        public_keys: Some(
            input
                .iter()
                .map(|key| SshPublicKey {
                    key_data: Some(key.public_key.clone()),
                    path: Some(ssh_key_path(&key.username)),
                })
                .collect(),
        ),
    })
}

fn expand_linux_secrets(input: &[LinuxSecretConfig]) -> Option<Vec<VaultSecretGroup>> {
    if input.is_empty() {
        return None;
    }
    Some(
        input
            .iter()
            .map(|secret| VaultSecretGroup {
                source_vault: Some(SubResource::new(secret.key_vault_id.clone())),
                vault_certificates: Some(
                    secret
                        .certificate
                        .iter()
                        .map(|cert| VaultCertificate {
                            certificate_store: None,
                            certificate_url: Some(cert.url.clone()),
                        })
                        .collect(),
                ),
            })
            .collect(),
    )
}

pub fn expand_windows_configuration(input: &WindowsConfigurationConfig) -> WindowsConfiguration {
    let automatic_by_platform_settings =
        if !input.reboot_setting.is_empty() || input.bypass_platform_safety_checks_enabled {
            Some(WindowsAutomaticByPlatformSettings {
                bypass_platform_safety_checks_on_user_schedule: Some(
                    input.bypass_platform_safety_checks_enabled,
                ),
                reboot_setting: expand_enum(&input.reboot_setting),
            })
        } else {
            None
        };

    let additional_unattend_content = if input.additional_unattend_content.is_empty() {
        None
    } else {
        Some(
            input
                .additional_unattend_content
                .iter()
                .map(|content| AdditionalUnattendContent {
                    component_name: Some("Microsoft-Windows-Shell-Setup".to_string()),
                    content: Some(content.content.expose().to_string()),
                    pass_name: Some("OobeSystem".to_string()),
                    setting_name: expand_enum(&content.setting),
                })
                .collect(),
        )
    };

    let win_rm = if input.winrm_listener.is_empty() {
        None
    } else {
        Some(WinRmConfiguration {
            listeners: Some(
                input
                    .winrm_listener
                    .iter()
                    .map(|listener| WinRmListener {
                        certificate_url: non_empty(&listener.certificate_url),
                        protocol: expand_enum(&listener.protocol),
                    })
                    .collect(),
            ),
        })
    };

    WindowsConfiguration {
        additional_unattend_content,
        enable_automatic_updates: Some(input.automatic_updates_enabled),
        enable_vm_agent_platform_updates: Some(input.vm_agent_platform_updates_enabled),
        patch_settings: Some(WindowsPatchSettings {
            assessment_mode: expand_enum(&input.patch_assessment_mode),
            automatic_by_platform_settings,
            enable_hotpatching: Some(input.hot_patching_enabled),
            patch_mode: expand_enum(&input.patch_mode),
        }),
        provision_vm_agent: Some(input.provision_vm_agent_enabled),
        time_zone: non_empty(&input.time_zone),
        win_rm,
    }
}

fn expand_windows_secrets(input: &[WindowsSecretConfig]) -> Option<Vec<VaultSecretGroup>> {
    if input.is_empty() {
        return None;
    }
    Some(
        input
            .iter()
            .map(|secret| VaultSecretGroup {
                source_vault: Some(SubResource::new(secret.key_vault_id.clone())),
                vault_certificates: Some(
                    secret
                        .certificate
                        .iter()
                        .map(|cert| VaultCertificate {
                            certificate_store: non_empty(&cert.store),
                            certificate_url: Some(cert.url.clone()),
                        })
                        .collect(),
                ),
            })
            .collect(),
    )
}

// ============================================================================
// Storage profile
// ============================================================================

pub fn expand_storage_profile(
    input: Option<&StorageProfileConfig>,
    os_type: Option<OperatingSystemTypes>,
) -> Result<Option<StorageProfile>> {
    let Some(profile) = input else {
        return Ok(None);
    };
    Ok(Some(StorageProfile {
        data_disks: expand_data_disks(&profile.data_disk).expanding("data_disk")?,
        disk_controller_type: expand_enum(&profile.disk_controller_type),
        image_reference: expand_image_reference(profile.image_reference.as_ref()),
        os_disk: expand_os_disk(profile.os_disk.as_ref(), os_type),
    }))
}

pub fn expand_image_reference(input: Option<&ImageReferenceConfig>) -> Option<ImageReference> {
    let image = input?;
    let mut output = ImageReference::default();
    match image.source()? {
        ImageSource::Id(id) => output.id = Some(id.to_string()),
        ImageSource::SharedGallery(id) => output.shared_gallery_image_id = Some(id.to_string()),
        ImageSource::CommunityGallery(id) => {
            output.community_gallery_image_id = Some(id.to_string())
        }
        ImageSource::Marketplace {
            publisher,
            offer,
            sku,
            version,
        } => {
            output.publisher = non_empty(publisher);
            output.offer = non_empty(offer);
            output.sku = non_empty(sku);
            output.version = non_empty(version);
        }
    }
    Some(output)
}

/// Expands the OS disk. `create_option` is always `FromImage`.
pub fn expand_os_disk(
    input: Option<&OsDiskConfig>,
    os_type: Option<OperatingSystemTypes>,
) -> Option<OsDisk> {
    let disk = input?;

    let diff_disk_settings = non_empty(&disk.diff_disk_option).map(|option| DiffDiskSettings {
        option: Some(DiffDiskOptions::from(option)),
        placement: expand_enum(&disk.diff_disk_placement),
    });

    Some(OsDisk {
        caching: expand_enum(&disk.caching),
        create_option: DiskCreateOptionTypes::FromImage,
        delete_option: expand_enum(&disk.delete_option),
        diff_disk_settings,
        disk_size_gb: non_zero(disk.disk_size_in_gib),
        managed_disk: expand_managed_disk(
            &disk.storage_account_type,
            &disk.disk_encryption_set_id,
            &disk.security_encryption_type,
            &disk.security_disk_encryption_set_id,
        ),
        name: None,
        os_type,
        write_accelerator_enabled: Some(disk.write_accelerator_enabled),
    })
}

fn expand_managed_disk(
    storage_account_type: &str,
    disk_encryption_set_id: &str,
    security_encryption_type: &str,
    security_disk_encryption_set_id: &str,
) -> Option<ManagedDiskParameters> {
    let security_profile =
        if security_encryption_type.is_empty() && security_disk_encryption_set_id.is_empty() {
            None
        } else {
            Some(VmDiskSecurityProfile {
                disk_encryption_set: non_empty(security_disk_encryption_set_id).map(SubResource::new),
                security_encryption_type: expand_enum(security_encryption_type),
            })
        };

    let managed = ManagedDiskParameters {
        disk_encryption_set: non_empty(disk_encryption_set_id).map(SubResource::new),
        security_profile,
        storage_account_type: expand_enum(storage_account_type),
    };

    if managed == ManagedDiskParameters::default() {
        None
    } else {
        Some(managed)
    }
}

/// Expands data disks. LUNs must be unique.
pub fn expand_data_disks(input: &[DataDiskConfig]) -> Result<Option<Vec<DataDisk>>> {
    if input.is_empty() {
        return Ok(None);
    }

    let mut seen = HashSet::new();
    let mut disks = Vec::with_capacity(input.len());
    for disk in input {
        if !seen.insert(disk.lun) {
            return Err(Error::malformed(format!(
                "the data disk lun {} is used more than once, each lun must be unique",
                disk.lun
            )));
        }
        disks.push(DataDisk {
            caching: expand_enum(&disk.caching),
            create_option: expand_enum(&disk.create_option).unwrap_or(DiskCreateOptionTypes::Empty),
            delete_option: expand_enum(&disk.delete_option),
            disk_size_gb: non_zero(disk.disk_size_in_gib),
            lun: disk.lun,
            managed_disk: expand_managed_disk(
                &disk.storage_account_type,
                &disk.disk_encryption_set_id,
                "",
                "",
            ),
            name: None,
            write_accelerator_enabled: Some(disk.write_accelerator_enabled),
        });
    }
    Ok(Some(disks))
}

// ============================================================================
// Network profile
// ============================================================================

pub fn expand_network_profile(
    input: &[NetworkInterfaceConfig],
    network_api_version: &str,
) -> Option<NetworkProfile> {
    if input.is_empty() && network_api_version.is_empty() {
        return None;
    }
    Some(NetworkProfile {
        network_api_version: expand_enum(network_api_version),
        network_interface_configurations: expand_network_interfaces(input),
    })
}

pub fn expand_network_interfaces(
    input: &[NetworkInterfaceConfig],
) -> Option<Vec<NetworkInterfaceConfiguration>> {
    if input.is_empty() {
        return None;
    }
    Some(
        input
            .iter()
            .map(|nic| NetworkInterfaceConfiguration {
                name: nic.name.clone(),
                properties: Some(NetworkInterfaceConfigurationProperties {
                    // The API only distinguishes an explicit "None" at create time.
                    auxiliary_mode: Some(
                        expand_enum(&nic.auxiliary_mode)
                            .unwrap_or(NetworkInterfaceAuxiliaryMode::None),
                    ),
                    auxiliary_sku: Some(
                        expand_enum(&nic.auxiliary_sku).unwrap_or(NetworkInterfaceAuxiliarySku::None),
                    ),
                    delete_option: expand_enum(&nic.delete_option),
                    dns_settings: non_empty_list(&nic.dns_servers).map(|servers| {
                        NetworkInterfaceDnsSettings {
                            dns_servers: Some(servers),
                        }
                    }),
                    enable_accelerated_networking: Some(nic.accelerated_networking_enabled),
                    enable_ip_forwarding: Some(nic.ip_forwarding_enabled),
                    ip_configurations: nic.ip_configuration.iter().map(expand_ip_configuration).collect(),
                    network_security_group: non_empty(&nic.network_security_group_id)
                        .map(SubResource::new),
                    primary: Some(nic.primary),
                }),
            })
            .collect(),
    )
}

fn sub_resources(ids: &[String]) -> Option<Vec<SubResource>> {
    non_empty_list(ids).map(|ids| ids.into_iter().map(SubResource::new).collect())
}

fn expand_ip_configuration(input: &IpConfigurationConfig) -> IpConfiguration {
    IpConfiguration {
        name: input.name.clone(),
        properties: Some(IpConfigurationProperties {
            application_gateway_backend_address_pools: sub_resources(
                &input.application_gateway_backend_address_pool_ids,
            ),
            application_security_groups: sub_resources(&input.application_security_group_ids),
            load_balancer_backend_address_pools: sub_resources(
                &input.load_balancer_backend_address_pool_ids,
            ),
            primary: Some(input.primary),
            private_ip_address_version: expand_enum(&input.version),
            public_ip_address_configuration: expand_public_ip_address(
                input.public_ip_address.as_ref(),
            ),
            subnet: non_empty(&input.subnet_id).map(SubResource::new),
        }),
    }
}

pub fn expand_public_ip_address(
    input: Option<&PublicIpAddressConfig>,
) -> Option<PublicIpAddressConfiguration> {
    let ip = input?;

    let sku = if ip.sku_name.is_empty() && ip.sku_tier.is_empty() {
        None
    } else {
        Some(PublicIpAddressSku {
            name: expand_enum(&ip.sku_name),
            tier: expand_enum(&ip.sku_tier),
        })
    };

    let ip_tags = if ip.ip_tag.is_empty() {
        None
    } else {
        Some(
            ip.ip_tag
                .iter()
                .map(|tag| IpTag {
                    ip_tag_type: Some(tag.tag_type.clone()),
                    tag: Some(tag.tag.clone()),
                })
                .collect(),
        )
    };

    Some(PublicIpAddressConfiguration {
        name: ip.name.clone(),
        properties: Some(PublicIpAddressConfigurationProperties {
            delete_option: expand_enum(&ip.delete_option),
            dns_settings: non_empty(&ip.domain_name_label).map(|label| PublicIpAddressDnsSettings {
                domain_name_label: label,
                domain_name_label_scope: expand_enum(&ip.domain_name_label_scope),
            }),
            idle_timeout_in_minutes: non_zero(ip.idle_timeout_in_minutes),
            ip_tags,
            public_ip_address_version: expand_enum(&ip.version),
            public_ip_prefix: non_empty(&ip.public_ip_prefix_id).map(SubResource::new),
        }),
        sku,
    })
}

// ============================================================================
// Extensions and applications
// ============================================================================

/// Parses a JSON object string; `""` means unset.
pub fn expand_json_object(field: &'static str, input: &str) -> Result<Option<JsonObject>> {
    if input.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(input)
        .map_err(|source| Error::Unmarshal { field, source })?;
    match value {
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(Error::malformed(format!(
            "`{}` must be a JSON object, got {}",
            field, other
        ))),
    }
}

pub fn expand_extension_profile(
    input: &[ExtensionConfig],
    time_budget: &str,
) -> Result<Option<ExtensionProfile>> {
    if input.is_empty() && time_budget.is_empty() {
        return Ok(None);
    }
    Ok(Some(ExtensionProfile {
        extensions: expand_extensions(input)?,
        extensions_time_budget: non_empty(time_budget),
    }))
}

pub fn expand_extensions(input: &[ExtensionConfig]) -> Result<Option<Vec<Extension>>> {
    if input.is_empty() {
        return Ok(None);
    }

    let mut extensions = Vec::with_capacity(input.len());
    for ext in input {
        let protected_settings_from_key_vault =
            ext.protected_settings_from_key_vault
                .as_ref()
                .map(|kv| KeyVaultSecretReference {
                    secret_url: kv.secret_url.expose().to_string(),
                    source_vault: SubResource::new(kv.source_vault_id.clone()),
                });

        extensions.push(Extension {
            name: Some(ext.name.clone()),
            properties: Some(ExtensionProperties {
                auto_upgrade_minor_version: Some(ext.auto_upgrade_minor_version_enabled),
                enable_automatic_upgrade: Some(ext.automatic_upgrade_enabled),
                force_update_tag: non_empty(&ext.force_extension_execution_on_change),
                protected_settings: expand_json_object(
                    "protected_settings_json",
                    ext.protected_settings_json.expose(),
                )?,
                protected_settings_from_key_vault,
                provision_after_extensions: non_empty_list(
                    &ext.extensions_to_provision_after_vm_creation,
                ),
                publisher: Some(ext.publisher.clone()),
                settings: expand_json_object("settings_json", &ext.settings_json)?,
                suppress_failures: Some(ext.suppress_failures_enabled),
                extension_type: Some(ext.extension_type.clone()),
                type_handler_version: Some(ext.type_handler_version.clone()),
            }),
        });
    }
    Ok(Some(extensions))
}

pub fn expand_gallery_applications(input: &[GalleryApplicationConfig]) -> Option<ApplicationProfile> {
    if input.is_empty() {
        return None;
    }
    Some(ApplicationProfile {
        gallery_applications: Some(
            input
                .iter()
                .map(|app| VmGalleryApplication {
                    configuration_reference: non_empty(&app.configuration_blob_uri),
                    enable_automatic_upgrade: Some(app.automatic_upgrade_enabled),
                    order: Some(app.order),
                    package_reference_id: app.version_id.clone(),
                    tags: non_empty(&app.tag),
                    treat_failure_as_deployment_failure: Some(
                        app.treat_failure_as_deployment_failure_enabled,
                    ),
                })
                .collect(),
        ),
    })
}

// ============================================================================
// Scheduled events and security
// ============================================================================

fn expand_scheduled_events(profile: &VirtualMachineProfileConfig) -> Option<ScheduledEventsProfile> {
    let os_image = (profile.scheduled_event_os_image_enabled
        || !profile.scheduled_event_os_image_timeout.is_empty())
    .then(|| OsImageNotificationProfile {
        enable: Some(profile.scheduled_event_os_image_enabled),
        not_before_timeout: non_empty(&profile.scheduled_event_os_image_timeout),
    });

    let terminate = (profile.scheduled_event_termination_enabled
        || !profile.scheduled_event_termination_timeout.is_empty())
    .then(|| TerminateNotificationProfile {
        enable: Some(profile.scheduled_event_termination_enabled),
        not_before_timeout: non_empty(&profile.scheduled_event_termination_timeout),
    });

    if os_image.is_none() && terminate.is_none() {
        return None;
    }
    Some(ScheduledEventsProfile {
        os_image_notification_profile: os_image,
        terminate_notification_profile: terminate,
    })
}

pub fn expand_security_profile(input: Option<&SecurityProfileConfig>) -> Option<SecurityProfile> {
    let profile = input?;
    Some(SecurityProfile {
        encryption_at_host: Some(profile.encryption_at_host_enabled),
        encryption_identity: non_empty(&profile.user_assigned_identity_id).map(|id| {
            EncryptionIdentity {
                user_assigned_identity_resource_id: Some(id),
            }
        }),
        proxy_agent_settings: profile.proxy_agent.as_ref().map(|agent| ProxyAgentSettings {
            enabled: Some(agent.enabled),
            key_incarnation_id: Some(agent.key_incarnation_value),
            mode: expand_enum(&agent.mode),
        }),
        security_type: expand_enum(&profile.security_type),
        uefi_settings: Some(UefiSettings {
            secure_boot_enabled: Some(profile.secure_boot_enabled),
            v_tpm_enabled: Some(profile.vtpm_enabled),
        }),
    })
}

pub fn expand_security_posture_reference(
    input: Option<&SecurityPostureReferenceConfig>,
) -> Option<SecurityPostureReference> {
    let reference = input?;
    Some(SecurityPostureReference {
        exclude_extensions: non_empty_list(&reference.excluded_extensions),
        id: non_empty(&reference.id),
        is_overridable: Some(reference.override_enabled),
    })
}
