//! Plan-time cross-field validation.
//!
//! Rejects OS profile combinations the API would refuse, or accept with
//! surprising semantics: patching settings without the matching patch mode,
//! extension operations without the VM agent, and hot patching outside the
//! images that support it. Runs after decoding and before expansion; the
//! first violated rule is reported as `MalformedInput`.

use crate::error::{Error, Result};
use crate::model::*;

const AUTOMATIC_BY_PLATFORM: &str = "AutomaticByPlatform";

/// Images that support hot patching, as `(publisher, offer, sku)`.
const HOT_PATCH_IMAGES: &[(&str, &str, &str)] = &[
    ("MicrosoftWindowsServer", "WindowsServer", "2022-datacenter-azure-edition-core"),
    ("MicrosoftWindowsServer", "WindowsServer", "2022-datacenter-azure-edition-core-smalldisk"),
    ("MicrosoftWindowsServer", "WindowsServer", "2022-datacenter-azure-edition-hotpatch"),
    ("MicrosoftWindowsServer", "WindowsServer", "2022-datacenter-azure-edition-hotpatch-smalldisk"),
    ("MicrosoftWindowsServer", "WindowsServer", "2025-datacenter-azure-edition"),
    ("MicrosoftWindowsServer", "WindowsServer", "2025-datacenter-azure-edition-smalldisk"),
    ("MicrosoftWindowsServer", "WindowsServer", "2025-datacenter-azure-edition-core"),
    ("MicrosoftWindowsServer", "WindowsServer", "2025-datacenter-azure-edition-core-smalldisk"),
];

/// Validates every virtual machine profile in the fleet.
pub fn validate_fleet(config: &FleetConfig) -> Result<()> {
    if let Some(profile) = config
        .compute_profile
        .as_ref()
        .and_then(|c| c.base_virtual_machine_profile.as_ref())
    {
        validate_virtual_machine_profile(profile)?;
    }

    for location in &config.additional_location_profile {
        if let Some(profile) = &location.virtual_machine_profile_override {
            validate_virtual_machine_profile(profile).map_err(|e| {
                Error::malformed(format!(
                    "additional location {:?}: {}",
                    location.location,
                    e.to_string().trim_start_matches("MalformedInput: ")
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates one virtual machine profile.
///
/// A profile without an OS profile has nothing to check.
pub fn validate_virtual_machine_profile(profile: &VirtualMachineProfileConfig) -> Result<()> {
    let Some(os_profile) = &profile.os_profile else {
        return Ok(());
    };

    let has_health_extension = profile.extension.iter().any(ExtensionConfig::is_application_health);

    match os_profile.configuration()? {
        OsConfiguration::Linux(linux) => validate_linux(linux, profile, has_health_extension),
        OsConfiguration::Windows(windows) => validate_windows(
            windows,
            profile,
            has_health_extension,
            is_hot_patch_image(image_reference(profile)),
        ),
    }
}

fn image_reference(profile: &VirtualMachineProfileConfig) -> Option<&ImageReferenceConfig> {
    profile
        .storage_profile
        .as_ref()
        .and_then(|s| s.image_reference.as_ref())
}

/// Whether the referenced marketplace image supports hot patching.
pub fn is_hot_patch_image(image: Option<&ImageReferenceConfig>) -> bool {
    match image.and_then(ImageReferenceConfig::source) {
        Some(ImageSource::Marketplace {
            publisher,
            offer,
            sku,
            ..
        }) => HOT_PATCH_IMAGES.iter().any(|(p, o, s)| {
            p.eq_ignore_ascii_case(publisher)
                && o.eq_ignore_ascii_case(offer)
                && s.eq_ignore_ascii_case(sku)
        }),
        _ => false,
    }
}

fn is_automatic_by_platform(value: &str) -> bool {
    value.eq_ignore_ascii_case(AUTOMATIC_BY_PLATFORM)
}

fn missing_health_extension() -> Error {
    Error::malformed(
        "when 'patch_mode' is set to 'AutomaticByPlatform' the 'extension' field must contain at least one 'application health extension'",
    )
}

fn validate_common(
    reboot_setting: &str,
    bypass_platform_safety_checks_enabled: bool,
    patch_mode: &str,
    patch_assessment_mode: &str,
    provision_vm_agent_enabled: bool,
    extension_operations_enabled: bool,
) -> Result<()> {
    if (!reboot_setting.is_empty() || bypass_platform_safety_checks_enabled)
        && !is_automatic_by_platform(patch_mode)
    {
        return Err(Error::malformed(
            "'reboot_setting' and 'bypass_platform_safety_checks_enabled' fields can only be set if 'patch_mode' is set to 'AutomaticByPlatform'",
        ));
    }

    if extension_operations_enabled && !provision_vm_agent_enabled {
        return Err(Error::malformed(
            "'extension_operations_enabled' can only be set to 'true' if 'provision_vm_agent_enabled' is set to 'true'",
        ));
    }

    if is_automatic_by_platform(patch_assessment_mode) && !provision_vm_agent_enabled {
        return Err(Error::malformed(
            "when 'patch_assessment_mode' is set to 'AutomaticByPlatform' the 'provision_vm_agent_enabled' field must be set to 'true'",
        ));
    }

    Ok(())
}

fn validate_automatic_patching(
    patch_mode: &str,
    provision_vm_agent_enabled: bool,
    has_health_extension: bool,
) -> Result<()> {
    if !is_automatic_by_platform(patch_mode) {
        return Ok(());
    }
    if !provision_vm_agent_enabled {
        return Err(Error::malformed(
            "when 'patch_mode' is set to 'AutomaticByPlatform' the 'provision_vm_agent_enabled' field must be set to 'true'",
        ));
    }
    if !has_health_extension {
        return Err(missing_health_extension());
    }
    Ok(())
}

fn validate_linux(
    linux: &LinuxConfigurationConfig,
    profile: &VirtualMachineProfileConfig,
    has_health_extension: bool,
) -> Result<()> {
    validate_common(
        &linux.reboot_setting,
        linux.bypass_platform_safety_checks_enabled,
        &linux.patch_mode,
        &linux.patch_assessment_mode,
        linux.provision_vm_agent_enabled,
        profile.extension_operations_enabled,
    )?;
    validate_automatic_patching(
        &linux.patch_mode,
        linux.provision_vm_agent_enabled,
        has_health_extension,
    )
}

fn validate_windows(
    windows: &WindowsConfigurationConfig,
    profile: &VirtualMachineProfileConfig,
    has_health_extension: bool,
    hot_patch_image: bool,
) -> Result<()> {
    validate_common(
        &windows.reboot_setting,
        windows.bypass_platform_safety_checks_enabled,
        &windows.patch_mode,
        &windows.patch_assessment_mode,
        windows.provision_vm_agent_enabled,
        profile.extension_operations_enabled,
    )?;

    if !hot_patch_image {
        if windows.hot_patching_enabled {
            let skus: Vec<&str> = HOT_PATCH_IMAGES.iter().map(|(_, _, sku)| *sku).collect();
            return Err(Error::malformed(format!(
                "'hot_patching_enabled' field is not supported unless you are using one of the following hotpatching enabled images: {}",
                skus.join(", ")
            )));
        }
        return validate_automatic_patching(
            &windows.patch_mode,
            windows.provision_vm_agent_enabled,
            has_health_extension,
        );
    }

    if !is_automatic_by_platform(&windows.patch_mode) {
        return Err(Error::malformed(
            "when referencing a hotpatching enabled image the 'patch_mode' field must always be set to 'AutomaticByPlatform'",
        ));
    }
    if !windows.provision_vm_agent_enabled {
        return Err(Error::malformed(
            "when referencing a hotpatching enabled image the 'provision_vm_agent_enabled' field must always be set to 'true'",
        ));
    }
    if !windows.hot_patching_enabled {
        return Err(Error::malformed(
            "when referencing a hotpatching enabled image the 'hot_patching_enabled' field must always be set to 'true'",
        ));
    }
    if !has_health_extension {
        return Err(Error::malformed(
            "when referencing a hotpatching enabled image the 'extension' field must always contain a 'application health extension'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health_extension() -> ExtensionConfig {
        ExtensionConfig {
            name: "health".to_string(),
            publisher: "Microsoft.ManagedServices".to_string(),
            extension_type: "ApplicationHealthLinux".to_string(),
            type_handler_version: "1.0".to_string(),
            ..Default::default()
        }
    }

    fn linux_profile(linux: LinuxConfigurationConfig) -> VirtualMachineProfileConfig {
        VirtualMachineProfileConfig {
            os_profile: Some(OsProfileConfig {
                linux_configuration: Some(linux),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn windows_profile(
        windows: WindowsConfigurationConfig,
        sku: &str,
    ) -> VirtualMachineProfileConfig {
        VirtualMachineProfileConfig {
            os_profile: Some(OsProfileConfig {
                windows_configuration: Some(windows),
                ..Default::default()
            }),
            storage_profile: Some(StorageProfileConfig {
                image_reference: Some(ImageReferenceConfig {
                    publisher: "MicrosoftWindowsServer".to_string(),
                    offer: "WindowsServer".to_string(),
                    sku: sku.to_string(),
                    version: "latest".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn message(err: Error) -> String {
        err.to_string()
    }

    #[test]
    fn test_automatic_by_platform_requires_health_extension() {
        let profile = linux_profile(LinuxConfigurationConfig {
            patch_mode: "AutomaticByPlatform".to_string(),
            provision_vm_agent_enabled: true,
            ..Default::default()
        });
        let err = validate_virtual_machine_profile(&profile).unwrap_err();
        assert_eq!(
            message(err),
            "MalformedInput: when 'patch_mode' is set to 'AutomaticByPlatform' the 'extension' field must contain at least one 'application health extension'"
        );

        let mut with_health = profile.clone();
        with_health.extension.push(health_extension());
        assert!(validate_virtual_machine_profile(&with_health).is_ok());
    }

    #[test]
    fn test_reboot_setting_requires_automatic_by_platform() {
        let profile = linux_profile(LinuxConfigurationConfig {
            reboot_setting: "Always".to_string(),
            patch_mode: "ImageDefault".to_string(),
            ..Default::default()
        });
        let err = validate_virtual_machine_profile(&profile).unwrap_err();
        assert!(message(err).contains("'reboot_setting'"));
    }

    #[test]
    fn test_extension_operations_require_vm_agent() {
        let mut profile = linux_profile(LinuxConfigurationConfig::default());
        profile.extension_operations_enabled = true;
        let err = validate_virtual_machine_profile(&profile).unwrap_err();
        assert!(message(err).contains("'extension_operations_enabled'"));
    }

    #[test]
    fn test_assessment_mode_requires_vm_agent() {
        let profile = linux_profile(LinuxConfigurationConfig {
            patch_assessment_mode: "AutomaticByPlatform".to_string(),
            ..Default::default()
        });
        let err = validate_virtual_machine_profile(&profile).unwrap_err();
        assert!(message(err).contains("'patch_assessment_mode'"));
    }

    #[test]
    fn test_hot_patch_image_recognition() {
        let image = ImageReferenceConfig {
            publisher: "microsoftwindowsserver".to_string(),
            offer: "WindowsServer".to_string(),
            sku: "2022-datacenter-azure-edition-hotpatch".to_string(),
            ..Default::default()
        };
        assert!(is_hot_patch_image(Some(&image)));

        let other = ImageReferenceConfig {
            sku: "2019-datacenter".to_string(),
            ..image
        };
        assert!(!is_hot_patch_image(Some(&other)));
        assert!(!is_hot_patch_image(None));
    }

    #[test]
    fn test_hot_patching_outside_supported_images() {
        let profile = windows_profile(
            WindowsConfigurationConfig {
                hot_patching_enabled: true,
                ..Default::default()
            },
            "2019-datacenter",
        );
        let err = validate_virtual_machine_profile(&profile).unwrap_err();
        assert!(message(err).contains("'hot_patching_enabled' field is not supported"));
    }

    #[test]
    fn test_hot_patch_image_requirements() {
        let sku = "2022-datacenter-azure-edition-core";
        let mut windows = WindowsConfigurationConfig {
            patch_mode: "AutomaticByPlatform".to_string(),
            provision_vm_agent_enabled: true,
            hot_patching_enabled: false,
            ..Default::default()
        };
        let err = validate_virtual_machine_profile(&windows_profile(windows.clone(), sku))
            .unwrap_err();
        assert!(message(err).contains("'hot_patching_enabled' field must always be set"));

        windows.hot_patching_enabled = true;
        let err = validate_virtual_machine_profile(&windows_profile(windows.clone(), sku))
            .unwrap_err();
        assert!(message(err).contains("application health extension"));

        let mut profile = windows_profile(windows, sku);
        profile.extension.push(ExtensionConfig {
            extension_type: "ApplicationHealthWindows".to_string(),
            ..health_extension()
        });
        assert!(validate_virtual_machine_profile(&profile).is_ok());
    }

    #[test]
    fn test_os_duality_is_enforced() {
        let profile = VirtualMachineProfileConfig {
            os_profile: Some(OsProfileConfig::default()),
            ..Default::default()
        };
        assert!(validate_virtual_machine_profile(&profile).is_err());
    }

    #[test]
    fn test_fleet_checks_location_overrides() {
        let config = FleetConfig {
            additional_location_profile: vec![AdditionalLocationProfileConfig {
                location: "eastus".to_string(),
                virtual_machine_profile_override: Some(linux_profile(LinuxConfigurationConfig {
                    patch_mode: "AutomaticByPlatform".to_string(),
                    provision_vm_agent_enabled: true,
                    ..Default::default()
                })),
            }],
            ..Default::default()
        };
        let err = validate_fleet(&config).unwrap_err();
        let message = message(err);
        assert!(message.starts_with("MalformedInput: additional location \"eastus\""));
        assert!(message.contains("application health extension"));
    }

    #[test]
    fn test_profile_without_os_profile_passes() {
        assert!(validate_fleet(&FleetConfig::default()).is_ok());
    }
}
