//! Virtual machine profile flatteners.

use super::{id_of, ids_of, none_as_empty, StateView};
use crate::api::*;
use crate::enums::flatten_enum;
use crate::error::{Error, ErrorContext, Result};
use crate::model::*;
use once_cell::sync::Lazy;
use regex::Regex;

static SSH_KEY_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/home/([^/]+)/\.ssh/authorized_keys$").expect("Invalid SSH key path regex")
});

/// Recovers the username from an authorized keys path.
pub fn parse_ssh_key_path(path: &str) -> Result<String> {
    SSH_KEY_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::malformed(format!(
                "unable to parse username from SSH key path {:?}, expected /home/<username>/.ssh/authorized_keys",
                path
            ))
        })
}

/// Flattens a VM profile. `state` is positioned at the profile block.
pub fn flatten_virtual_machine_profile(
    input: Option<&BaseVirtualMachineProfile>,
    state: StateView<'_>,
) -> Result<Option<VirtualMachineProfileConfig>> {
    let Some(profile) = input else {
        return Ok(None);
    };

    let boot = profile
        .diagnostics_profile
        .as_ref()
        .and_then(|d| d.boot_diagnostics.as_ref());
    let extension_profile = profile.extension_profile.as_ref();
    let scheduled = profile.scheduled_events_profile.as_ref();
    let os_image = scheduled.and_then(|s| s.os_image_notification_profile.as_ref());
    let terminate = scheduled.and_then(|s| s.terminate_notification_profile.as_ref());
    let network = profile.network_profile.as_ref();

    let user_data_base64 = match &profile.user_data {
        Some(data) if !data.is_empty() => data.clone(),
        _ => state.string("user_data_base64"),
    };

    Ok(Some(VirtualMachineProfileConfig {
        boot_diagnostic_enabled: boot.and_then(|b| b.enabled).unwrap_or(false),
        boot_diagnostic_storage_account_endpoint: boot
            .and_then(|b| b.storage_uri.clone())
            .unwrap_or_default(),
        capacity_reservation_group_id: id_of(
            profile
                .capacity_reservation
                .as_ref()
                .and_then(|c| c.capacity_reservation_group.as_ref()),
        ),
        extension: flatten_extensions(
            extension_profile.and_then(|e| e.extensions.as_deref()),
            state.at("extension"),
        )
        .flattening("extension")?,
        extension_operations_enabled: profile
            .os_profile
            .as_ref()
            .and_then(|os| os.allow_extension_operations)
            .unwrap_or(true),
        extensions_time_budget: extension_profile
            .and_then(|e| e.extensions_time_budget.clone())
            .unwrap_or_default(),
        gallery_application: flatten_gallery_applications(profile.application_profile.as_ref()),
        license_type: profile.license_type.clone().unwrap_or_default(),
        network_api_version: flatten_enum(network.and_then(|n| n.network_api_version.as_ref())),
        network_interface: flatten_network_interfaces(
            network.and_then(|n| n.network_interface_configurations.as_deref()),
        ),
        os_profile: flatten_os_profile(profile.os_profile.as_ref(), state.at("os_profile.0"))
            .flattening("os_profile")?,
        scheduled_event_os_image_enabled: os_image.and_then(|p| p.enable).unwrap_or(false),
        scheduled_event_os_image_timeout: os_image
            .and_then(|p| p.not_before_timeout.clone())
            .unwrap_or_default(),
        scheduled_event_termination_enabled: terminate.and_then(|p| p.enable).unwrap_or(false),
        scheduled_event_termination_timeout: terminate
            .and_then(|p| p.not_before_timeout.clone())
            .unwrap_or_default(),
        security_posture_reference: flatten_security_posture_reference(
            profile.security_posture_reference.as_ref(),
        ),
        security_profile: flatten_security_profile(profile.security_profile.as_ref()),
        service_artifact_reference_id: profile
            .service_artifact_reference
            .as_ref()
            .and_then(|r| r.id.clone())
            .unwrap_or_default(),
        storage_profile: flatten_storage_profile(profile.storage_profile.as_ref()),
        user_data_base64,
    }))
}

// ============================================================================
// OS profile
// ============================================================================

/// Flattens the OS profile. Passwords and custom data come from `state`.
pub fn flatten_os_profile(
    input: Option<&OsProfile>,
    state: StateView<'_>,
) -> Result<Option<OsProfileConfig>> {
    let Some(profile) = input else {
        return Ok(None);
    };

    let linux_configuration = match &profile.linux_configuration {
        Some(linux) => Some(
            flatten_linux_configuration(profile, linux, state.at("linux_configuration.0"))
                .flattening("linux_configuration")?,
        ),
        None => None,
    };
    let windows_configuration = profile.windows_configuration.as_ref().map(|windows| {
        flatten_windows_configuration(profile, windows, state.at("windows_configuration.0"))
    });

    Ok(Some(OsProfileConfig {
        custom_data_base64: Sensitive::new(state.string("custom_data_base64")),
        linux_configuration,
        windows_configuration,
    }))
}

fn flatten_linux_configuration(
    profile: &OsProfile,
    linux: &LinuxConfiguration,
    state: StateView<'_>,
) -> Result<LinuxConfigurationConfig> {
    let mut admin_ssh_key = Vec::new();
    for key in linux
        .ssh
        .as_ref()
        .and_then(|ssh| ssh.public_keys.as_deref())
        .unwrap_or_default()
    {
        admin_ssh_key.push(AdminSshKeyConfig {
            public_key: key.key_data.clone().unwrap_or_default(),
            username: parse_ssh_key_path(key.path.as_deref().unwrap_or_default())
                .flattening("admin_ssh_key")?,
        });
    }

    let patch = linux.patch_settings.as_ref();
    let platform = patch.and_then(|p| p.automatic_by_platform_settings.as_ref());

    Ok(LinuxConfigurationConfig {
        admin_username: profile.admin_username.clone().unwrap_or_default(),
        admin_password: Sensitive::new(state.string("admin_password")),
        admin_ssh_key,
        bypass_platform_safety_checks_enabled: platform
            .and_then(|p| p.bypass_platform_safety_checks_on_user_schedule)
            .unwrap_or(false),
        computer_name_prefix: profile.computer_name_prefix.clone().unwrap_or_default(),
        password_authentication_enabled: !linux.disable_password_authentication.unwrap_or(false),
        patch_assessment_mode: flatten_enum(patch.and_then(|p| p.assessment_mode.as_ref())),
        patch_mode: flatten_enum(patch.and_then(|p| p.patch_mode.as_ref())),
        provision_vm_agent_enabled: linux.provision_vm_agent.unwrap_or(false),
        reboot_setting: flatten_enum(platform.and_then(|p| p.reboot_setting.as_ref())),
        secret: flatten_secrets(profile.secrets.as_deref())
            .into_iter()
            .map(|(key_vault_id, certs)| LinuxSecretConfig {
                key_vault_id,
                certificate: certs
                    .into_iter()
                    .map(|cert| LinuxCertificateConfig {
                        url: cert.certificate_url.unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect(),
        vm_agent_platform_updates_enabled: linux.enable_vm_agent_platform_updates.unwrap_or(false),
    })
}

fn flatten_windows_configuration(
    profile: &OsProfile,
    windows: &WindowsConfiguration,
    state: StateView<'_>,
) -> WindowsConfigurationConfig {
    let patch = windows.patch_settings.as_ref();
    let platform = patch.and_then(|p| p.automatic_by_platform_settings.as_ref());

    WindowsConfigurationConfig {
        additional_unattend_content: windows
            .additional_unattend_content
            .as_deref()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, content)| AdditionalUnattendContentConfig {
                content: Sensitive::new(
                    state.string(&format!("additional_unattend_content.{}.content", i)),
                ),
                setting: flatten_enum(content.setting_name.as_ref()),
            })
            .collect(),
        admin_password: Sensitive::new(state.string("admin_password")),
        admin_username: profile.admin_username.clone().unwrap_or_default(),
        automatic_updates_enabled: windows.enable_automatic_updates.unwrap_or(false),
        bypass_platform_safety_checks_enabled: platform
            .and_then(|p| p.bypass_platform_safety_checks_on_user_schedule)
            .unwrap_or(false),
        computer_name_prefix: profile.computer_name_prefix.clone().unwrap_or_default(),
        hot_patching_enabled: patch.and_then(|p| p.enable_hotpatching).unwrap_or(false),
        patch_assessment_mode: flatten_enum(patch.and_then(|p| p.assessment_mode.as_ref())),
        patch_mode: flatten_enum(patch.and_then(|p| p.patch_mode.as_ref())),
        provision_vm_agent_enabled: windows.provision_vm_agent.unwrap_or(false),
        reboot_setting: flatten_enum(platform.and_then(|p| p.reboot_setting.as_ref())),
        secret: flatten_secrets(profile.secrets.as_deref())
            .into_iter()
            .map(|(key_vault_id, certs)| WindowsSecretConfig {
                key_vault_id,
                certificate: certs
                    .into_iter()
                    .map(|cert| WindowsCertificateConfig {
                        store: cert.certificate_store.unwrap_or_default(),
                        url: cert.certificate_url.unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect(),
        time_zone: windows.time_zone.clone().unwrap_or_default(),
        vm_agent_platform_updates_enabled: windows
            .enable_vm_agent_platform_updates
            .unwrap_or(false),
        winrm_listener: windows
            .win_rm
            .as_ref()
            .and_then(|w| w.listeners.as_deref())
            .unwrap_or_default()
            .iter()
            .map(|listener| WinRmListenerConfig {
                certificate_url: listener.certificate_url.clone().unwrap_or_default(),
                protocol: flatten_enum(listener.protocol.as_ref()),
            })
            .collect(),
    }
}

fn flatten_secrets(input: Option<&[VaultSecretGroup]>) -> Vec<(String, Vec<VaultCertificate>)> {
    input
        .unwrap_or_default()
        .iter()
        .map(|group| {
            (
                id_of(group.source_vault.as_ref()),
                group.vault_certificates.clone().unwrap_or_default(),
            )
        })
        .collect()
}

// ============================================================================
// Storage profile
// ============================================================================

pub fn flatten_storage_profile(input: Option<&StorageProfile>) -> Option<StorageProfileConfig> {
    let profile = input?;
    Some(StorageProfileConfig {
        data_disk: flatten_data_disks(profile.data_disks.as_deref()),
        disk_controller_type: flatten_enum(profile.disk_controller_type.as_ref()),
        image_reference: flatten_image_reference(profile.image_reference.as_ref()),
        os_disk: flatten_os_disk(profile.os_disk.as_ref()),
    })
}

pub fn flatten_image_reference(input: Option<&ImageReference>) -> Option<ImageReferenceConfig> {
    let image = input?;
    Some(ImageReferenceConfig {
        community_gallery_image_id: image.community_gallery_image_id.clone().unwrap_or_default(),
        id: image.id.clone().unwrap_or_default(),
        offer: image.offer.clone().unwrap_or_default(),
        publisher: image.publisher.clone().unwrap_or_default(),
        shared_gallery_image_id: image.shared_gallery_image_id.clone().unwrap_or_default(),
        sku: image.sku.clone().unwrap_or_default(),
        version: image.version.clone().unwrap_or_default(),
    })
}

/// Flattens the OS disk; `None` caching becomes `""`.
pub fn flatten_os_disk(input: Option<&OsDisk>) -> Option<OsDiskConfig> {
    let disk = input?;
    let managed = disk.managed_disk.as_ref();
    let security = managed.and_then(|m| m.security_profile.as_ref());
    let diff = disk.diff_disk_settings.as_ref();

    Some(OsDiskConfig {
        caching: none_as_empty(disk.caching.as_ref()),
        delete_option: flatten_enum(disk.delete_option.as_ref()),
        diff_disk_option: flatten_enum(diff.and_then(|d| d.option.as_ref())),
        diff_disk_placement: flatten_enum(diff.and_then(|d| d.placement.as_ref())),
        disk_encryption_set_id: id_of(managed.and_then(|m| m.disk_encryption_set.as_ref())),
        disk_size_in_gib: disk.disk_size_gb.unwrap_or(0),
        security_disk_encryption_set_id: id_of(security.and_then(|s| s.disk_encryption_set.as_ref())),
        security_encryption_type: flatten_enum(
            security.and_then(|s| s.security_encryption_type.as_ref()),
        ),
        storage_account_type: flatten_enum(managed.and_then(|m| m.storage_account_type.as_ref())),
        write_accelerator_enabled: disk.write_accelerator_enabled.unwrap_or(false),
    })
}

pub fn flatten_data_disks(input: Option<&[DataDisk]>) -> Vec<DataDiskConfig> {
    input
        .unwrap_or_default()
        .iter()
        .map(|disk| {
            let managed = disk.managed_disk.as_ref();
            DataDiskConfig {
                caching: none_as_empty(disk.caching.as_ref()),
                create_option: disk.create_option.to_string(),
                delete_option: flatten_enum(disk.delete_option.as_ref()),
                disk_encryption_set_id: id_of(managed.and_then(|m| m.disk_encryption_set.as_ref())),
                disk_size_in_gib: disk.disk_size_gb.unwrap_or(0),
                lun: disk.lun,
                storage_account_type: flatten_enum(
                    managed.and_then(|m| m.storage_account_type.as_ref()),
                ),
                write_accelerator_enabled: disk.write_accelerator_enabled.unwrap_or(false),
            }
        })
        .collect()
}

// ============================================================================
// Network profile
// ============================================================================

pub fn flatten_network_interfaces(
    input: Option<&[NetworkInterfaceConfiguration]>,
) -> Vec<NetworkInterfaceConfig> {
    input
        .unwrap_or_default()
        .iter()
        .map(|nic| {
            let props = nic.properties.clone().unwrap_or_default();
            NetworkInterfaceConfig {
                accelerated_networking_enabled: props.enable_accelerated_networking.unwrap_or(false),
                auxiliary_mode: none_as_empty(props.auxiliary_mode.as_ref()),
                auxiliary_sku: none_as_empty(props.auxiliary_sku.as_ref()),
                delete_option: flatten_enum(props.delete_option.as_ref()),
                dns_servers: props
                    .dns_settings
                    .and_then(|d| d.dns_servers)
                    .unwrap_or_default(),
                ip_configuration: props
                    .ip_configurations
                    .iter()
                    .map(flatten_ip_configuration)
                    .collect(),
                ip_forwarding_enabled: props.enable_ip_forwarding.unwrap_or(false),
                name: nic.name.clone(),
                network_security_group_id: id_of(props.network_security_group.as_ref()),
                primary: props.primary.unwrap_or(false),
            }
        })
        .collect()
}

fn flatten_ip_configuration(input: &IpConfiguration) -> IpConfigurationConfig {
    let props = input.properties.clone().unwrap_or_default();
    IpConfigurationConfig {
        application_gateway_backend_address_pool_ids: ids_of(
            props.application_gateway_backend_address_pools.as_deref(),
        ),
        application_security_group_ids: ids_of(props.application_security_groups.as_deref()),
        load_balancer_backend_address_pool_ids: ids_of(
            props.load_balancer_backend_address_pools.as_deref(),
        ),
        name: input.name.clone(),
        primary: props.primary.unwrap_or(false),
        public_ip_address: flatten_public_ip_address(props.public_ip_address_configuration.as_ref()),
        subnet_id: id_of(props.subnet.as_ref()),
        version: flatten_enum(props.private_ip_address_version.as_ref()),
    }
}

pub fn flatten_public_ip_address(
    input: Option<&PublicIpAddressConfiguration>,
) -> Option<PublicIpAddressConfig> {
    let ip = input?;
    let props = ip.properties.clone().unwrap_or_default();
    let dns = props.dns_settings.as_ref();
    let sku = ip.sku.as_ref();

    Some(PublicIpAddressConfig {
        delete_option: flatten_enum(props.delete_option.as_ref()),
        domain_name_label: dns.map(|d| d.domain_name_label.clone()).unwrap_or_default(),
        domain_name_label_scope: flatten_enum(dns.and_then(|d| d.domain_name_label_scope.as_ref())),
        idle_timeout_in_minutes: props.idle_timeout_in_minutes.unwrap_or(0),
        ip_tag: props
            .ip_tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| IpTagConfig {
                tag: tag.tag.unwrap_or_default(),
                tag_type: tag.ip_tag_type.unwrap_or_default(),
            })
            .collect(),
        name: ip.name.clone(),
        public_ip_prefix_id: id_of(props.public_ip_prefix.as_ref()),
        sku_name: flatten_enum(sku.and_then(|s| s.name.as_ref())),
        sku_tier: flatten_enum(sku.and_then(|s| s.tier.as_ref())),
        version: flatten_enum(props.public_ip_address_version.as_ref()),
    })
}

// ============================================================================
// Extensions and applications
// ============================================================================

/// Flattens extensions. `state` is positioned at the `extension` list.
pub fn flatten_extensions(
    input: Option<&[Extension]>,
    state: StateView<'_>,
) -> Result<Vec<ExtensionConfig>> {
    let mut extensions = Vec::new();
    for ext in input.unwrap_or_default() {
        let props = ext.properties.clone().unwrap_or_default();
        let name = ext.name.clone().unwrap_or_default();
        let prior = state.find("name", &name);

        let settings_json = match &props.settings {
            Some(settings) => serde_json::to_string(settings)?,
            None => String::new(),
        };

        let protected_settings_from_key_vault =
            props
                .protected_settings_from_key_vault
                .as_ref()
                .map(|kv| {
                    let secret_url = if kv.secret_url.is_empty() {
                        prior.string("protected_settings_from_key_vault.0.secret_url")
                    } else {
                        kv.secret_url.clone()
                    };
                    ProtectedSettingsFromKeyVaultConfig {
                        secret_url: Sensitive::new(secret_url),
                        source_vault_id: id_of(Some(&kv.source_vault)),
                    }
                });

        extensions.push(ExtensionConfig {
            auto_upgrade_minor_version_enabled: props.auto_upgrade_minor_version.unwrap_or(false),
            automatic_upgrade_enabled: props.enable_automatic_upgrade.unwrap_or(false),
            extensions_to_provision_after_vm_creation: props
                .provision_after_extensions
                .unwrap_or_default(),
            force_extension_execution_on_change: props.force_update_tag.unwrap_or_default(),
            name,
            protected_settings_from_key_vault,
            protected_settings_json: Sensitive::new(prior.string("protected_settings_json")),
            publisher: props.publisher.unwrap_or_default(),
            settings_json,
            suppress_failures_enabled: props.suppress_failures.unwrap_or(false),
            extension_type: props.extension_type.unwrap_or_default(),
            type_handler_version: props.type_handler_version.unwrap_or_default(),
        });
    }
    Ok(extensions)
}

pub fn flatten_gallery_applications(
    input: Option<&ApplicationProfile>,
) -> Vec<GalleryApplicationConfig> {
    input
        .and_then(|p| p.gallery_applications.as_deref())
        .unwrap_or_default()
        .iter()
        .map(|app| GalleryApplicationConfig {
            automatic_upgrade_enabled: app.enable_automatic_upgrade.unwrap_or(false),
            configuration_blob_uri: app.configuration_reference.clone().unwrap_or_default(),
            order: app.order.unwrap_or(0),
            tag: app.tags.clone().unwrap_or_default(),
            treat_failure_as_deployment_failure_enabled: app
                .treat_failure_as_deployment_failure
                .unwrap_or(false),
            version_id: app.package_reference_id.clone(),
        })
        .collect()
}

// ============================================================================
// Security
// ============================================================================

pub fn flatten_security_profile(input: Option<&SecurityProfile>) -> Option<SecurityProfileConfig> {
    let profile = input?;
    let uefi = profile.uefi_settings.as_ref();
    Some(SecurityProfileConfig {
        encryption_at_host_enabled: profile.encryption_at_host.unwrap_or(false),
        proxy_agent: profile
            .proxy_agent_settings
            .as_ref()
            .map(|agent| ProxyAgentConfig {
                enabled: agent.enabled.unwrap_or(false),
                key_incarnation_value: agent.key_incarnation_id.unwrap_or(0),
                mode: flatten_enum(agent.mode.as_ref()),
            }),
        secure_boot_enabled: uefi.and_then(|u| u.secure_boot_enabled).unwrap_or(false),
        security_type: flatten_enum(profile.security_type.as_ref()),
        user_assigned_identity_id: profile
            .encryption_identity
            .as_ref()
            .and_then(|e| e.user_assigned_identity_resource_id.clone())
            .unwrap_or_default(),
        vtpm_enabled: uefi.and_then(|u| u.v_tpm_enabled).unwrap_or(false),
    })
}

pub fn flatten_security_posture_reference(
    input: Option<&SecurityPostureReference>,
) -> Option<SecurityPostureReferenceConfig> {
    let reference = input?;
    Some(SecurityPostureReferenceConfig {
        excluded_extensions: reference.exclude_extensions.clone().unwrap_or_default(),
        id: reference.id.clone().unwrap_or_default(),
        override_enabled: reference.is_overridable.unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_nil_in_empty_out() {
        let state = StateView::empty();
        assert_eq!(flatten_virtual_machine_profile(None, state).unwrap(), None);
        assert_eq!(flatten_os_profile(None, state).unwrap(), None);
        assert_eq!(flatten_storage_profile(None), None);
        assert_eq!(flatten_os_disk(None), None);
        assert!(flatten_data_disks(None).is_empty());
        assert!(flatten_network_interfaces(None).is_empty());
        assert!(flatten_extensions(None, state).unwrap().is_empty());
        assert!(flatten_gallery_applications(None).is_empty());
        assert_eq!(flatten_security_profile(None), None);
    }

    #[test]
    fn test_none_caching_is_empty_string() {
        let disk = flatten_os_disk(Some(&OsDisk {
            caching: Some(CachingTypes::None),
            create_option: DiskCreateOptionTypes::FromImage,
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(disk.caching, "");

        let disk = flatten_os_disk(Some(&OsDisk {
            caching: Some(CachingTypes::ReadOnly),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(disk.caching, "ReadOnly");
    }

    #[test]
    fn test_ssh_key_path_reverse_parse() {
        assert_eq!(
            parse_ssh_key_path("/home/azureuser/.ssh/authorized_keys").unwrap(),
            "azureuser"
        );
        assert!(parse_ssh_key_path("/root/.ssh/authorized_keys").is_err());
        assert!(parse_ssh_key_path("").is_err());
    }

    #[test]
    fn test_bad_ssh_path_is_fatal() {
        let os = OsProfile {
            linux_configuration: Some(LinuxConfiguration {
                ssh: Some(SshConfiguration {
                    public_keys: Some(vec![SshPublicKey {
                        key_data: Some("ssh-rsa AAAA".to_string()),
                        path: Some("/etc/keys".to_string()),
                    }]),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = flatten_os_profile(Some(&os), StateView::empty()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("flattening linux_configuration: flattening admin_ssh_key"));
    }

    #[test]
    fn test_sensitive_fields_come_from_state() {
        let state = json!({
            "custom_data_base64": "Y3VzdG9t",
            "linux_configuration": [{ "admin_password": "from-state" }],
        });
        let os = OsProfile {
            admin_password: Some("from-api".to_string()),
            admin_username: Some("azureuser".to_string()),
            custom_data: Some("ignored".to_string()),
            linux_configuration: Some(LinuxConfiguration {
                disable_password_authentication: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = flatten_os_profile(Some(&os), StateView::new(&state))
            .unwrap()
            .unwrap();
        assert_eq!(config.custom_data_base64.expose(), "Y3VzdG9t");
        let linux = config.linux_configuration.unwrap();
        assert_eq!(linux.admin_password.expose(), "from-state");
        assert!(linux.password_authentication_enabled);
    }

    #[test]
    fn test_extension_protected_settings_from_state() {
        let state = json!([{ "name": "health", "protected_settings_json": "{\"key\":\"secret\"}" }]);
        let mut settings = JsonObject::new();
        settings.insert("port".to_string(), json!(80));
        let ext = Extension {
            name: Some("health".to_string()),
            properties: Some(ExtensionProperties {
                publisher: Some("Microsoft.ManagedServices".to_string()),
                extension_type: Some("ApplicationHealthLinux".to_string()),
                settings: Some(settings),
                ..Default::default()
            }),
        };
        let flattened = flatten_extensions(Some(&[ext][..]), StateView::new(&state)).unwrap();
        assert_eq!(flattened[0].settings_json, "{\"port\":80}");
        assert_eq!(
            flattened[0].protected_settings_json.expose(),
            "{\"key\":\"secret\"}"
        );
        assert!(flattened[0].is_application_health());
    }

    #[test]
    fn test_extension_secrets_follow_name_not_position() {
        let state = json!([
            { "name": "first", "protected_settings_json": "{\"token\":\"one\"}" },
            { "name": "second", "protected_settings_json": "{\"token\":\"two\"}" }
        ]);
        let ext = |name: &str| Extension {
            name: Some(name.to_string()),
            properties: Some(ExtensionProperties::default()),
        };
        let returned = [ext("second"), ext("third"), ext("first")];

        let flattened = flatten_extensions(Some(&returned[..]), StateView::new(&state)).unwrap();
        let secrets: Vec<(&str, &str)> = flattened
            .iter()
            .map(|e| (e.name.as_str(), e.protected_settings_json.expose()))
            .collect();
        assert_eq!(
            secrets,
            vec![
                ("second", "{\"token\":\"two\"}"),
                ("third", ""),
                ("first", "{\"token\":\"one\"}"),
            ]
        );
    }

    #[test]
    fn test_nic_explicit_none_flattens_to_unset() {
        let nics = flatten_network_interfaces(Some(&[NetworkInterfaceConfiguration {
            name: "nic".to_string(),
            properties: Some(NetworkInterfaceConfigurationProperties {
                auxiliary_mode: Some(NetworkInterfaceAuxiliaryMode::None),
                auxiliary_sku: Some(NetworkInterfaceAuxiliarySku::A2),
                ..Default::default()
            }),
        }][..]));
        assert_eq!(nics[0].auxiliary_mode, "");
        assert_eq!(nics[0].auxiliary_sku, "A2");
    }
}
