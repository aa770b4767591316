//! Closed string sets published by the Azure Fleet and Compute APIs.
//!
//! Every enum is generated by [`api_enum!`] so the schema validators, the
//! expanders and the flatteners share one definition. Parsing is
//! case-insensitive; values the API returns that are not in the table are
//! kept verbatim in the `Unknown` variant so reads never lose data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! api_enum {
    (@first $first:ident $(, $rest:ident)*) => {
        Self::$first
    };
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value not known to this version of the provider.
            Unknown(String),
        }

        impl $name {
            /// Wire values accepted by the API, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            /// Returns the wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(other) => other.as_str(),
                }
            }

            /// Parses a wire value, ignoring ASCII case.
            pub fn parse(value: &str) -> Self {
                $(
                    if value.eq_ignore_ascii_case($wire) {
                        return Self::$variant;
                    }
                )+
                Self::Unknown(value.to_string())
            }
        }

        impl Default for $name {
            /// The first declared value.
            fn default() -> Self {
                api_enum!(@first $($variant),+)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::parse(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::parse(&value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok(Self::parse(&value))
            }
        }
    };
}

// ============================================================================
// Storage
// ============================================================================

api_enum! {
    /// Disk caching mode.
    CachingTypes {
        None => "None",
        ReadOnly => "ReadOnly",
        ReadWrite => "ReadWrite",
    }
}

api_enum! {
    /// Managed disk storage account type.
    StorageAccountTypes {
        StandardLrs => "Standard_LRS",
        PremiumLrs => "Premium_LRS",
        StandardSsdLrs => "StandardSSD_LRS",
        UltraSsdLrs => "UltraSSD_LRS",
        PremiumZrs => "Premium_ZRS",
        StandardSsdZrs => "StandardSSD_ZRS",
        PremiumV2Lrs => "PremiumV2_LRS",
    }
}

api_enum! {
    /// How a disk is created.
    DiskCreateOptionTypes {
        FromImage => "FromImage",
        Empty => "Empty",
        Attach => "Attach",
        Copy => "Copy",
        Restore => "Restore",
    }
}

api_enum! {
    /// What happens to a disk when the VM is deleted.
    DiskDeleteOptionTypes {
        Delete => "Delete",
        Detach => "Detach",
    }
}

api_enum! {
    /// Ephemeral OS disk option.
    DiffDiskOptions {
        Local => "Local",
    }
}

api_enum! {
    /// Ephemeral OS disk placement.
    DiffDiskPlacement {
        CacheDisk => "CacheDisk",
        ResourceDisk => "ResourceDisk",
        NvmeDisk => "NvmeDisk",
    }
}

api_enum! {
    /// Disk controller type.
    DiskControllerTypes {
        Scsi => "SCSI",
        NVMe => "NVMe",
    }
}

api_enum! {
    /// Operating system family of an OS disk.
    OperatingSystemTypes {
        Linux => "Linux",
        Windows => "Windows",
    }
}

api_enum! {
    /// Confidential VM disk encryption type.
    SecurityEncryptionTypes {
        VmGuestStateOnly => "VMGuestStateOnly",
        DiskWithVmGuestState => "DiskWithVMGuestState",
        NonPersistedTpm => "NonPersistedTPM",
    }
}

// ============================================================================
// Security
// ============================================================================

api_enum! {
    /// VM security type.
    SecurityTypes {
        TrustedLaunch => "TrustedLaunch",
        ConfidentialVm => "ConfidentialVM",
    }
}

api_enum! {
    /// Proxy agent enforcement mode.
    ProxyAgentMode {
        Audit => "Audit",
        Enforce => "Enforce",
    }
}

// ============================================================================
// OS profile
// ============================================================================

api_enum! {
    /// Linux guest patch mode.
    LinuxVmGuestPatchMode {
        ImageDefault => "ImageDefault",
        AutomaticByPlatform => "AutomaticByPlatform",
    }
}

api_enum! {
    /// Windows guest patch mode.
    WindowsVmGuestPatchMode {
        Manual => "Manual",
        AutomaticByOs => "AutomaticByOS",
        AutomaticByPlatform => "AutomaticByPlatform",
    }
}

api_enum! {
    /// Linux patch assessment mode.
    LinuxPatchAssessmentMode {
        ImageDefault => "ImageDefault",
        AutomaticByPlatform => "AutomaticByPlatform",
    }
}

api_enum! {
    /// Windows patch assessment mode.
    WindowsPatchAssessmentMode {
        ImageDefault => "ImageDefault",
        AutomaticByPlatform => "AutomaticByPlatform",
    }
}

api_enum! {
    /// Reboot behaviour for platform-orchestrated Linux patching.
    LinuxRebootSetting {
        Always => "Always",
        IfRequired => "IfRequired",
        Never => "Never",
    }
}

api_enum! {
    /// Reboot behaviour for platform-orchestrated Windows patching.
    WindowsRebootSetting {
        Always => "Always",
        IfRequired => "IfRequired",
        Never => "Never",
    }
}

api_enum! {
    /// Windows unattend setting name.
    SettingNames {
        AutoLogon => "AutoLogon",
        FirstLogonCommands => "FirstLogonCommands",
    }
}

api_enum! {
    /// WinRM listener protocol.
    ProtocolTypes {
        Http => "Http",
        Https => "Https",
    }
}

// ============================================================================
// Network
// ============================================================================

api_enum! {
    /// NIC auxiliary mode.
    NetworkInterfaceAuxiliaryMode {
        None => "None",
        AcceleratedConnections => "AcceleratedConnections",
        Floating => "Floating",
    }
}

api_enum! {
    /// NIC auxiliary SKU.
    NetworkInterfaceAuxiliarySku {
        None => "None",
        A1 => "A1",
        A2 => "A2",
        A4 => "A4",
        A8 => "A8",
    }
}

api_enum! {
    /// What happens to a NIC or public IP when the VM is deleted.
    DeleteOptions {
        Delete => "Delete",
        Detach => "Detach",
    }
}

api_enum! {
    /// IP address version.
    IpVersion {
        IPv4 => "IPv4",
        IPv6 => "IPv6",
    }
}

api_enum! {
    /// Public IP SKU name.
    PublicIpAddressSkuName {
        Basic => "Basic",
        Standard => "Standard",
    }
}

api_enum! {
    /// Public IP SKU tier.
    PublicIpAddressSkuTier {
        Regional => "Regional",
        Global => "Global",
    }
}

api_enum! {
    /// Domain name label reuse scope.
    DomainNameLabelScopeTypes {
        TenantReuse => "TenantReuse",
        SubscriptionReuse => "SubscriptionReuse",
        ResourceGroupReuse => "ResourceGroupReuse",
        NoReuse => "NoReuse",
    }
}

api_enum! {
    /// Network API version used to create NICs.
    #[allow(non_camel_case_types)]
    NetworkApiVersion {
        V2020_11_01 => "2020-11-01",
        V2022_11_01 => "2022-11-01",
    }
}

// ============================================================================
// Fleet
// ============================================================================

api_enum! {
    /// Spot VM eviction policy.
    EvictionPolicy {
        Delete => "Delete",
        Deallocate => "Deallocate",
    }
}

api_enum! {
    /// Spot capacity allocation strategy.
    SpotAllocationStrategy {
        PriceCapacityOptimized => "PriceCapacityOptimized",
        LowestPrice => "LowestPrice",
        CapacityOptimized => "CapacityOptimized",
    }
}

api_enum! {
    /// Regular capacity allocation strategy.
    RegularPriorityAllocationStrategy {
        LowestPrice => "LowestPrice",
        Prioritized => "Prioritized",
    }
}

api_enum! {
    /// Whether a VM attribute is excluded, included or required.
    VmAttributeSupport {
        Excluded => "Excluded",
        Included => "Included",
        Required => "Required",
    }
}

api_enum! {
    /// Local storage disk type.
    LocalStorageDiskType {
        Hdd => "HDD",
        Ssd => "SSD",
    }
}

api_enum! {
    /// Accelerator manufacturer.
    AcceleratorManufacturer {
        Amd => "AMD",
        Nvidia => "Nvidia",
        Xilinx => "Xilinx",
    }
}

api_enum! {
    /// Accelerator type.
    AcceleratorType {
        Gpu => "GPU",
        Fpga => "FPGA",
    }
}

api_enum! {
    /// VM size category.
    VmCategory {
        GeneralPurpose => "GeneralPurpose",
        ComputeOptimized => "ComputeOptimized",
        MemoryOptimized => "MemoryOptimized",
        StorageOptimized => "StorageOptimized",
        GpuAccelerated => "GpuAccelerated",
        FpgaAccelerated => "FpgaAccelerated",
        HighPerformanceCompute => "HighPerformanceCompute",
    }
}

api_enum! {
    /// CPU architecture.
    ArchitectureType {
        Arm64 => "ARM64",
        X64 => "X64",
    }
}

api_enum! {
    /// CPU manufacturer.
    CpuManufacturer {
        Intel => "Intel",
        Amd => "AMD",
        Microsoft => "Microsoft",
        Ampere => "Ampere",
    }
}

api_enum! {
    /// Managed service identity type.
    ManagedServiceIdentityType {
        None => "None",
        SystemAssigned => "SystemAssigned",
        UserAssigned => "UserAssigned",
        SystemAndUserAssigned => "SystemAssigned, UserAssigned",
    }
}

api_enum! {
    /// Fleet provisioning state.
    ProvisioningState {
        Succeeded => "Succeeded",
        Failed => "Failed",
        Canceled => "Canceled",
        Creating => "Creating",
        Updating => "Updating",
        Deleting => "Deleting",
        Migrating => "Migrating",
    }
}

/// Flattens an optional enum to its string form, or `""` when unset.
pub fn flatten_enum<E: fmt::Display>(value: Option<&E>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Expands a configuration string to an enum, treating `""` as unset.
pub fn expand_enum<E: for<'a> From<&'a str>>(value: &str) -> Option<E> {
    if value.is_empty() {
        None
    } else {
        Some(E::from(value))
    }
}
