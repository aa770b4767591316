//! Virtual machine profile configuration records.
//!
//! The same profile shape is used for the fleet's base profile and for the
//! per-location overrides.

use super::{singleton, Sensitive};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The per-VM template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineProfileConfig {
    pub boot_diagnostic_enabled: bool,
    pub boot_diagnostic_storage_account_endpoint: String,
    pub capacity_reservation_group_id: String,
    pub extension: Vec<ExtensionConfig>,
    pub extension_operations_enabled: bool,
    pub extensions_time_budget: String,
    pub gallery_application: Vec<GalleryApplicationConfig>,
    pub license_type: String,
    pub network_api_version: String,
    pub network_interface: Vec<NetworkInterfaceConfig>,
    #[serde(with = "singleton")]
    pub os_profile: Option<OsProfileConfig>,
    pub scheduled_event_os_image_enabled: bool,
    pub scheduled_event_os_image_timeout: String,
    pub scheduled_event_termination_enabled: bool,
    pub scheduled_event_termination_timeout: String,
    #[serde(with = "singleton")]
    pub security_posture_reference: Option<SecurityPostureReferenceConfig>,
    #[serde(with = "singleton")]
    pub security_profile: Option<SecurityProfileConfig>,
    pub service_artifact_reference_id: String,
    #[serde(with = "singleton")]
    pub storage_profile: Option<StorageProfileConfig>,
    pub user_data_base64: String,
}

// ============================================================================
// OS profile
// ============================================================================

/// OS profile: exactly one of the Linux or Windows configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsProfileConfig {
    pub custom_data_base64: Sensitive,
    #[serde(with = "singleton")]
    pub linux_configuration: Option<LinuxConfigurationConfig>,
    #[serde(with = "singleton")]
    pub windows_configuration: Option<WindowsConfigurationConfig>,
}

/// The OS configuration chosen by an [`OsProfileConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OsConfiguration<'a> {
    Linux(&'a LinuxConfigurationConfig),
    Windows(&'a WindowsConfigurationConfig),
}

impl OsProfileConfig {
    /// Resolves the Linux/Windows duality.
    ///
    /// Fails when both or neither configuration is populated.
    pub fn configuration(&self) -> Result<OsConfiguration<'_>> {
        match (&self.linux_configuration, &self.windows_configuration) {
            (Some(linux), None) => Ok(OsConfiguration::Linux(linux)),
            (None, Some(windows)) => Ok(OsConfiguration::Windows(windows)),
            (Some(_), Some(_)) => Err(Error::malformed(
                "only one of 'linux_configuration' or 'windows_configuration' can be specified",
            )),
            (None, None) => Err(Error::malformed(
                "one of 'linux_configuration' or 'windows_configuration' must be specified",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxConfigurationConfig {
    pub admin_username: String,
    pub admin_password: Sensitive,
    pub admin_ssh_key: Vec<AdminSshKeyConfig>,
    pub bypass_platform_safety_checks_enabled: bool,
    pub computer_name_prefix: String,
    pub password_authentication_enabled: bool,
    pub patch_assessment_mode: String,
    pub patch_mode: String,
    pub provision_vm_agent_enabled: bool,
    pub reboot_setting: String,
    pub secret: Vec<LinuxSecretConfig>,
    pub vm_agent_platform_updates_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSshKeyConfig {
    pub public_key: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxSecretConfig {
    pub key_vault_id: String,
    pub certificate: Vec<LinuxCertificateConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxCertificateConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsConfigurationConfig {
    pub additional_unattend_content: Vec<AdditionalUnattendContentConfig>,
    pub admin_password: Sensitive,
    pub admin_username: String,
    pub automatic_updates_enabled: bool,
    pub bypass_platform_safety_checks_enabled: bool,
    pub computer_name_prefix: String,
    pub hot_patching_enabled: bool,
    pub patch_assessment_mode: String,
    pub patch_mode: String,
    pub provision_vm_agent_enabled: bool,
    pub reboot_setting: String,
    pub secret: Vec<WindowsSecretConfig>,
    pub time_zone: String,
    pub vm_agent_platform_updates_enabled: bool,
    pub winrm_listener: Vec<WinRmListenerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalUnattendContentConfig {
    pub content: Sensitive,
    pub setting: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsSecretConfig {
    pub key_vault_id: String,
    pub certificate: Vec<WindowsCertificateConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsCertificateConfig {
    pub store: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinRmListenerConfig {
    pub certificate_url: String,
    pub protocol: String,
}

// ============================================================================
// Storage profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageProfileConfig {
    pub data_disk: Vec<DataDiskConfig>,
    pub disk_controller_type: String,
    #[serde(with = "singleton")]
    pub image_reference: Option<ImageReferenceConfig>,
    #[serde(with = "singleton")]
    pub os_disk: Option<OsDiskConfig>,
}

/// Source image: a marketplace tuple or one of three image IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReferenceConfig {
    pub community_gallery_image_id: String,
    pub id: String,
    pub offer: String,
    pub publisher: String,
    pub shared_gallery_image_id: String,
    pub sku: String,
    pub version: String,
}

/// The image source selected by an [`ImageReferenceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource<'a> {
    Marketplace {
        publisher: &'a str,
        offer: &'a str,
        sku: &'a str,
        version: &'a str,
    },
    Id(&'a str),
    SharedGallery(&'a str),
    CommunityGallery(&'a str),
}

impl ImageReferenceConfig {
    /// Returns the populated image source, if any.
    ///
    /// The schema rejects references that populate more than one kind, so
    /// the first populated kind wins here.
    pub fn source(&self) -> Option<ImageSource<'_>> {
        if !self.id.is_empty() {
            Some(ImageSource::Id(&self.id))
        } else if !self.shared_gallery_image_id.is_empty() {
            Some(ImageSource::SharedGallery(&self.shared_gallery_image_id))
        } else if !self.community_gallery_image_id.is_empty() {
            Some(ImageSource::CommunityGallery(&self.community_gallery_image_id))
        } else if !self.publisher.is_empty() || !self.offer.is_empty() || !self.sku.is_empty() {
            Some(ImageSource::Marketplace {
                publisher: &self.publisher,
                offer: &self.offer,
                sku: &self.sku,
                version: &self.version,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsDiskConfig {
    pub caching: String,
    pub delete_option: String,
    pub diff_disk_option: String,
    pub diff_disk_placement: String,
    pub disk_encryption_set_id: String,
    pub disk_size_in_gib: i64,
    pub security_disk_encryption_set_id: String,
    pub security_encryption_type: String,
    pub storage_account_type: String,
    pub write_accelerator_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDiskConfig {
    pub caching: String,
    pub create_option: String,
    pub delete_option: String,
    pub disk_encryption_set_id: String,
    pub disk_size_in_gib: i64,
    pub lun: i64,
    pub storage_account_type: String,
    pub write_accelerator_enabled: bool,
}

// ============================================================================
// Network profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterfaceConfig {
    pub accelerated_networking_enabled: bool,
    pub auxiliary_mode: String,
    pub auxiliary_sku: String,
    pub delete_option: String,
    pub dns_servers: Vec<String>,
    pub ip_configuration: Vec<IpConfigurationConfig>,
    pub ip_forwarding_enabled: bool,
    pub name: String,
    pub network_security_group_id: String,
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpConfigurationConfig {
    pub application_gateway_backend_address_pool_ids: Vec<String>,
    pub application_security_group_ids: Vec<String>,
    pub load_balancer_backend_address_pool_ids: Vec<String>,
    pub name: String,
    pub primary: bool,
    #[serde(with = "singleton")]
    pub public_ip_address: Option<PublicIpAddressConfig>,
    pub subnet_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIpAddressConfig {
    pub delete_option: String,
    pub domain_name_label: String,
    pub domain_name_label_scope: String,
    pub idle_timeout_in_minutes: i64,
    pub ip_tag: Vec<IpTagConfig>,
    pub name: String,
    pub public_ip_prefix_id: String,
    pub sku_name: String,
    pub sku_tier: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpTagConfig {
    pub tag: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

// ============================================================================
// Extensions and applications
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub auto_upgrade_minor_version_enabled: bool,
    pub automatic_upgrade_enabled: bool,
    pub extensions_to_provision_after_vm_creation: Vec<String>,
    pub force_extension_execution_on_change: String,
    pub name: String,
    #[serde(with = "singleton")]
    pub protected_settings_from_key_vault: Option<ProtectedSettingsFromKeyVaultConfig>,
    pub protected_settings_json: Sensitive,
    pub publisher: String,
    pub settings_json: String,
    pub suppress_failures_enabled: bool,
    #[serde(rename = "type")]
    pub extension_type: String,
    pub type_handler_version: String,
}

impl ExtensionConfig {
    /// Whether this is an application health extension.
    pub fn is_application_health(&self) -> bool {
        self.publisher.eq_ignore_ascii_case("Microsoft.ManagedServices")
            && (self.extension_type.eq_ignore_ascii_case("ApplicationHealthLinux")
                || self.extension_type.eq_ignore_ascii_case("ApplicationHealthWindows"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectedSettingsFromKeyVaultConfig {
    pub secret_url: Sensitive,
    pub source_vault_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryApplicationConfig {
    pub automatic_upgrade_enabled: bool,
    pub configuration_blob_uri: String,
    pub order: i64,
    pub tag: String,
    pub treat_failure_as_deployment_failure_enabled: bool,
    pub version_id: String,
}

// ============================================================================
// Security
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityProfileConfig {
    pub encryption_at_host_enabled: bool,
    #[serde(with = "singleton")]
    pub proxy_agent: Option<ProxyAgentConfig>,
    pub secure_boot_enabled: bool,
    pub security_type: String,
    pub user_assigned_identity_id: String,
    pub vtpm_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyAgentConfig {
    pub enabled: bool,
    pub key_incarnation_value: i64,
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPostureReferenceConfig {
    pub excluded_extensions: Vec<String>,
    pub id: String,
    pub override_enabled: bool,
}
