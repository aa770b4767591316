//! API-side record tree for `Microsoft.AzureFleet/fleets`.
//!
//! Every field is optional: `None` means "do not set" on a write and
//! "not returned" on a read. Enum-valued fields use the closed types from
//! [`crate::enums`], whose `Unknown` variant keeps unrecognised wire values.

use crate::enums::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Opaque JSON object, used for extension settings.
pub type JsonObject = Map<String, Value>;

/// Reference to another ARM resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: Option<String>,
}

impl SubResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// Reference to an API entity (subnets, artifacts).
pub type ApiEntityReference = SubResource;

// ============================================================================
// Fleet
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fleet {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub location: String,
    pub identity: Option<ManagedServiceIdentity>,
    pub plan: Option<Plan>,
    pub properties: Option<FleetProperties>,
    pub tags: Option<BTreeMap<String, String>>,
    pub zones: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetProperties {
    pub provisioning_state: Option<ProvisioningState>,
    pub additional_locations_profile: Option<AdditionalLocationsProfile>,
    pub compute_profile: Option<ComputeProfile>,
    pub regular_priority_profile: Option<RegularPriorityProfile>,
    pub spot_priority_profile: Option<SpotPriorityProfile>,
    #[serde(rename = "vmAttributes")]
    pub vm_attributes: Option<VmAttributes>,
    #[serde(rename = "vmSizesProfile")]
    pub vm_sizes_profile: Option<Vec<VmSizeProfile>>,
    pub time_created: Option<String>,
    pub unique_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedServiceIdentity {
    #[serde(rename = "type")]
    pub identity_type: ManagedServiceIdentityType,
    pub principal_id: Option<String>,
    pub tenant_id: Option<String>,
    pub user_assigned_identities: Option<BTreeMap<String, UserAssignedIdentity>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignedIdentity {
    pub client_id: Option<String>,
    pub principal_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,
    pub product: String,
    pub publisher: String,
    pub promotion_code: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalLocationsProfile {
    #[serde(default)]
    pub location_profiles: Vec<LocationProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProfile {
    #[serde(default)]
    pub location: String,
    pub virtual_machine_profile_override: Option<BaseVirtualMachineProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeProfile {
    pub additional_virtual_machine_capabilities: Option<AdditionalCapabilities>,
    #[serde(default)]
    pub base_virtual_machine_profile: BaseVirtualMachineProfile,
    pub compute_api_version: Option<String>,
    pub platform_fault_domain_count: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalCapabilities {
    pub hibernation_enabled: Option<bool>,
    #[serde(rename = "ultraSSDEnabled")]
    pub ultra_ssd_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularPriorityProfile {
    pub allocation_strategy: Option<RegularPriorityAllocationStrategy>,
    pub capacity: Option<i64>,
    pub min_capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPriorityProfile {
    pub allocation_strategy: Option<SpotAllocationStrategy>,
    pub capacity: Option<i64>,
    pub eviction_policy: Option<EvictionPolicy>,
    pub maintain: Option<bool>,
    #[serde(rename = "maxPricePerVM")]
    pub max_price_per_vm: Option<f64>,
    pub min_capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmSizeProfile {
    pub name: String,
    pub rank: Option<i64>,
}

// ============================================================================
// VM attributes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmAttributeMinMaxInteger {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmAttributeMinMaxDouble {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmAttributes {
    pub accelerator_count: Option<VmAttributeMinMaxInteger>,
    pub accelerator_manufacturers: Option<Vec<AcceleratorManufacturer>>,
    pub accelerator_support: Option<VmAttributeSupport>,
    pub accelerator_types: Option<Vec<AcceleratorType>>,
    pub architecture_types: Option<Vec<ArchitectureType>>,
    pub burstable_support: Option<VmAttributeSupport>,
    pub cpu_manufacturers: Option<Vec<CpuManufacturer>>,
    pub data_disk_count: Option<VmAttributeMinMaxInteger>,
    #[serde(rename = "excludedVMSizes")]
    pub excluded_vm_sizes: Option<Vec<String>>,
    pub local_storage_disk_types: Option<Vec<LocalStorageDiskType>>,
    #[serde(rename = "localStorageInGiB")]
    pub local_storage_in_gib: Option<VmAttributeMinMaxDouble>,
    pub local_storage_support: Option<VmAttributeSupport>,
    #[serde(rename = "memoryInGiB")]
    #[serde(default)]
    pub memory_in_gib: VmAttributeMinMaxDouble,
    #[serde(rename = "memoryInGiBPerVCpu")]
    pub memory_in_gib_per_vcpu: Option<VmAttributeMinMaxDouble>,
    pub network_bandwidth_in_mbps: Option<VmAttributeMinMaxDouble>,
    pub network_interface_count: Option<VmAttributeMinMaxInteger>,
    pub rdma_network_interface_count: Option<VmAttributeMinMaxInteger>,
    pub rdma_support: Option<VmAttributeSupport>,
    pub vm_categories: Option<Vec<VmCategory>>,
    #[serde(rename = "vCpuCount")]
    #[serde(default)]
    pub vcpu_count: VmAttributeMinMaxInteger,
}

// ============================================================================
// Virtual machine profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseVirtualMachineProfile {
    pub application_profile: Option<ApplicationProfile>,
    pub capacity_reservation: Option<CapacityReservationProfile>,
    pub diagnostics_profile: Option<DiagnosticsProfile>,
    pub extension_profile: Option<ExtensionProfile>,
    pub license_type: Option<String>,
    pub network_profile: Option<NetworkProfile>,
    pub os_profile: Option<OsProfile>,
    pub scheduled_events_profile: Option<ScheduledEventsProfile>,
    pub security_posture_reference: Option<SecurityPostureReference>,
    pub security_profile: Option<SecurityProfile>,
    pub service_artifact_reference: Option<ServiceArtifactReference>,
    pub storage_profile: Option<StorageProfile>,
    pub user_data: Option<String>,
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationProfile {
    pub gallery_applications: Option<Vec<VmGalleryApplication>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmGalleryApplication {
    pub configuration_reference: Option<String>,
    pub enable_automatic_upgrade: Option<bool>,
    pub order: Option<i64>,
    pub package_reference_id: String,
    pub tags: Option<String>,
    pub treat_failure_as_deployment_failure: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReservationProfile {
    pub capacity_reservation_group: Option<SubResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsProfile {
    pub boot_diagnostics: Option<BootDiagnostics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootDiagnostics {
    pub enabled: Option<bool>,
    pub storage_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEventsProfile {
    pub os_image_notification_profile: Option<OsImageNotificationProfile>,
    pub terminate_notification_profile: Option<TerminateNotificationProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsImageNotificationProfile {
    pub enable: Option<bool>,
    pub not_before_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateNotificationProfile {
    pub enable: Option<bool>,
    pub not_before_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPostureReference {
    pub exclude_extensions: Option<Vec<String>>,
    pub id: Option<String>,
    pub is_overridable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArtifactReference {
    pub id: Option<String>,
}

// ============================================================================
// OS profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    pub admin_password: Option<String>,
    pub admin_username: Option<String>,
    pub allow_extension_operations: Option<bool>,
    pub computer_name_prefix: Option<String>,
    pub custom_data: Option<String>,
    pub linux_configuration: Option<LinuxConfiguration>,
    pub require_guest_provision_signal: Option<bool>,
    pub secrets: Option<Vec<VaultSecretGroup>>,
    pub windows_configuration: Option<WindowsConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration {
    pub disable_password_authentication: Option<bool>,
    #[serde(rename = "enableVMAgentPlatformUpdates")]
    pub enable_vm_agent_platform_updates: Option<bool>,
    pub patch_settings: Option<LinuxPatchSettings>,
    #[serde(rename = "provisionVMAgent")]
    pub provision_vm_agent: Option<bool>,
    pub ssh: Option<SshConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration {
    pub public_keys: Option<Vec<SshPublicKey>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    pub key_data: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxPatchSettings {
    pub assessment_mode: Option<LinuxPatchAssessmentMode>,
    pub automatic_by_platform_settings: Option<LinuxAutomaticByPlatformSettings>,
    pub patch_mode: Option<LinuxVmGuestPatchMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxAutomaticByPlatformSettings {
    pub bypass_platform_safety_checks_on_user_schedule: Option<bool>,
    pub reboot_setting: Option<LinuxRebootSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsConfiguration {
    pub additional_unattend_content: Option<Vec<AdditionalUnattendContent>>,
    pub enable_automatic_updates: Option<bool>,
    #[serde(rename = "enableVMAgentPlatformUpdates")]
    pub enable_vm_agent_platform_updates: Option<bool>,
    pub patch_settings: Option<WindowsPatchSettings>,
    #[serde(rename = "provisionVMAgent")]
    pub provision_vm_agent: Option<bool>,
    pub time_zone: Option<String>,
    #[serde(rename = "winRM")]
    pub win_rm: Option<WinRmConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalUnattendContent {
    pub component_name: Option<String>,
    pub content: Option<String>,
    pub pass_name: Option<String>,
    pub setting_name: Option<SettingNames>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsPatchSettings {
    pub assessment_mode: Option<WindowsPatchAssessmentMode>,
    pub automatic_by_platform_settings: Option<WindowsAutomaticByPlatformSettings>,
    pub enable_hotpatching: Option<bool>,
    pub patch_mode: Option<WindowsVmGuestPatchMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsAutomaticByPlatformSettings {
    pub bypass_platform_safety_checks_on_user_schedule: Option<bool>,
    pub reboot_setting: Option<WindowsRebootSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinRmConfiguration {
    pub listeners: Option<Vec<WinRmListener>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRmListener {
    pub certificate_url: Option<String>,
    pub protocol: Option<ProtocolTypes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSecretGroup {
    pub source_vault: Option<SubResource>,
    pub vault_certificates: Option<Vec<VaultCertificate>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultCertificate {
    pub certificate_store: Option<String>,
    pub certificate_url: Option<String>,
}

// ============================================================================
// Storage profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub data_disks: Option<Vec<DataDisk>>,
    pub disk_controller_type: Option<DiskControllerTypes>,
    pub image_reference: Option<ImageReference>,
    pub os_disk: Option<OsDisk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub community_gallery_image_id: Option<String>,
    pub id: Option<String>,
    pub offer: Option<String>,
    pub publisher: Option<String>,
    pub shared_gallery_image_id: Option<String>,
    pub sku: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    pub caching: Option<CachingTypes>,
    #[serde(default)]
    pub create_option: DiskCreateOptionTypes,
    pub delete_option: Option<DiskDeleteOptionTypes>,
    pub diff_disk_settings: Option<DiffDiskSettings>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<i64>,
    pub managed_disk: Option<ManagedDiskParameters>,
    pub name: Option<String>,
    pub os_type: Option<OperatingSystemTypes>,
    pub write_accelerator_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub caching: Option<CachingTypes>,
    #[serde(default)]
    pub create_option: DiskCreateOptionTypes,
    pub delete_option: Option<DiskDeleteOptionTypes>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<i64>,
    pub lun: i64,
    pub managed_disk: Option<ManagedDiskParameters>,
    pub name: Option<String>,
    pub write_accelerator_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffDiskSettings {
    pub option: Option<DiffDiskOptions>,
    pub placement: Option<DiffDiskPlacement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    pub disk_encryption_set: Option<SubResource>,
    pub security_profile: Option<VmDiskSecurityProfile>,
    pub storage_account_type: Option<StorageAccountTypes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDiskSecurityProfile {
    pub disk_encryption_set: Option<SubResource>,
    pub security_encryption_type: Option<SecurityEncryptionTypes>,
}

// ============================================================================
// Network profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub network_api_version: Option<NetworkApiVersion>,
    pub network_interface_configurations: Option<Vec<NetworkInterfaceConfiguration>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterfaceConfiguration {
    pub name: String,
    pub properties: Option<NetworkInterfaceConfigurationProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceConfigurationProperties {
    pub auxiliary_mode: Option<NetworkInterfaceAuxiliaryMode>,
    pub auxiliary_sku: Option<NetworkInterfaceAuxiliarySku>,
    pub delete_option: Option<DeleteOptions>,
    pub dns_settings: Option<NetworkInterfaceDnsSettings>,
    pub enable_accelerated_networking: Option<bool>,
    #[serde(rename = "enableIPForwarding")]
    pub enable_ip_forwarding: Option<bool>,
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,
    pub network_security_group: Option<SubResource>,
    pub primary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceDnsSettings {
    pub dns_servers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpConfiguration {
    pub name: String,
    pub properties: Option<IpConfigurationProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    pub application_gateway_backend_address_pools: Option<Vec<SubResource>>,
    pub application_security_groups: Option<Vec<SubResource>>,
    pub load_balancer_backend_address_pools: Option<Vec<SubResource>>,
    pub primary: Option<bool>,
    #[serde(rename = "privateIPAddressVersion")]
    pub private_ip_address_version: Option<IpVersion>,
    #[serde(rename = "publicIPAddressConfiguration")]
    pub public_ip_address_configuration: Option<PublicIpAddressConfiguration>,
    pub subnet: Option<ApiEntityReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicIpAddressConfiguration {
    pub name: String,
    pub properties: Option<PublicIpAddressConfigurationProperties>,
    pub sku: Option<PublicIpAddressSku>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpAddressSku {
    pub name: Option<PublicIpAddressSkuName>,
    pub tier: Option<PublicIpAddressSkuTier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressConfigurationProperties {
    pub delete_option: Option<DeleteOptions>,
    pub dns_settings: Option<PublicIpAddressDnsSettings>,
    pub idle_timeout_in_minutes: Option<i64>,
    pub ip_tags: Option<Vec<IpTag>>,
    #[serde(rename = "publicIPAddressVersion")]
    pub public_ip_address_version: Option<IpVersion>,
    #[serde(rename = "publicIPPrefix")]
    pub public_ip_prefix: Option<SubResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressDnsSettings {
    pub domain_name_label: String,
    pub domain_name_label_scope: Option<DomainNameLabelScopeTypes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpTag {
    pub ip_tag_type: Option<String>,
    pub tag: Option<String>,
}

// ============================================================================
// Extensions
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionProfile {
    pub extensions: Option<Vec<Extension>>,
    pub extensions_time_budget: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: Option<String>,
    pub properties: Option<ExtensionProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionProperties {
    pub auto_upgrade_minor_version: Option<bool>,
    pub enable_automatic_upgrade: Option<bool>,
    pub force_update_tag: Option<String>,
    pub protected_settings: Option<JsonObject>,
    pub protected_settings_from_key_vault: Option<KeyVaultSecretReference>,
    pub provision_after_extensions: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub settings: Option<JsonObject>,
    pub suppress_failures: Option<bool>,
    #[serde(rename = "type")]
    pub extension_type: Option<String>,
    pub type_handler_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultSecretReference {
    pub secret_url: String,
    pub source_vault: SubResource,
}

// ============================================================================
// Security profile
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityProfile {
    pub encryption_at_host: Option<bool>,
    pub encryption_identity: Option<EncryptionIdentity>,
    pub proxy_agent_settings: Option<ProxyAgentSettings>,
    pub security_type: Option<SecurityTypes>,
    pub uefi_settings: Option<UefiSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionIdentity {
    pub user_assigned_identity_resource_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyAgentSettings {
    pub enabled: Option<bool>,
    pub key_incarnation_id: Option<i64>,
    pub mode: Option<ProxyAgentMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UefiSettings {
    pub secure_boot_enabled: Option<bool>,
    #[serde(rename = "vTpmEnabled")]
    pub v_tpm_enabled: Option<bool>,
}

// ============================================================================
// Long-running operations
// ============================================================================

/// Body of an `Azure-AsyncOperation` status probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    pub error: Option<ApiErrorDetail>,
}

/// ARM error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: Option<ApiErrorDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorDetail {
    /// Renders `code: message`, falling back to whichever is present.
    pub fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "no error details returned".to_string(),
        }
    }
}

/// Removes `null` members from a JSON tree so unset fields are not sent.
pub fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fleet_decodes_arm_payload() {
        let fleet: Fleet = serde_json::from_value(json!({
            "id": "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.AzureFleet/fleets/fleet1",
            "name": "fleet1",
            "type": "Microsoft.AzureFleet/fleets",
            "location": "westeurope",
            "properties": {
                "provisioningState": "Succeeded",
                "uniqueId": "abc",
                "spotPriorityProfile": {
                    "capacity": 2,
                    "maxPricePerVM": -1.0,
                    "evictionPolicy": "Delete",
                    "allocationStrategy": "PriceCapacityOptimized"
                },
                "vmSizesProfile": [{ "name": "Standard_D2s_v3", "rank": 0 }],
                "computeProfile": {
                    "baseVirtualMachineProfile": {
                        "storageProfile": {
                            "osDisk": { "createOption": "FromImage", "caching": "None", "osType": "Linux" }
                        }
                    },
                    "additionalVirtualMachineCapabilities": { "ultraSSDEnabled": true }
                }
            }
        }))
        .unwrap();

        let props = fleet.properties.unwrap();
        assert_eq!(props.provisioning_state, Some(ProvisioningState::Succeeded));
        let spot = props.spot_priority_profile.unwrap();
        assert_eq!(spot.max_price_per_vm, Some(-1.0));
        assert_eq!(spot.eviction_policy, Some(EvictionPolicy::Delete));

        let compute = props.compute_profile.unwrap();
        let caps = compute.additional_virtual_machine_capabilities.unwrap();
        assert_eq!(caps.ultra_ssd_enabled, Some(true));
        assert_eq!(caps.hibernation_enabled, None);
        let os_disk = compute
            .base_virtual_machine_profile
            .storage_profile
            .unwrap()
            .os_disk
            .unwrap();
        assert_eq!(os_disk.caching, Some(CachingTypes::None));
        assert_eq!(os_disk.create_option, DiskCreateOptionTypes::FromImage);
    }

    #[test]
    fn test_strip_nulls() {
        let mut value = json!({
            "a": null,
            "b": { "c": null, "d": 1 },
            "e": [{ "f": null }]
        });
        strip_nulls(&mut value);
        assert_eq!(value, json!({ "b": { "d": 1 }, "e": [{}] }));
    }

    #[test]
    fn test_api_error_detail_describe() {
        let detail = ApiErrorDetail {
            code: Some("InvalidParameter".to_string()),
            message: Some("bad sku".to_string()),
        };
        assert_eq!(detail.describe(), "InvalidParameter: bad sku");
        assert_eq!(
            ApiErrorDetail::default().describe(),
            "no error details returned"
        );
    }
}
