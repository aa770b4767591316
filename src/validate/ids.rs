//! Azure resource ID parsing.
//!
//! Each ID kind is a path template such as
//! `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/...`.
//! Literal segments compare case-insensitively, `{name}` segments capture a
//! non-empty value.

use super::ValidateFunc;
use crate::error::{Error, Result};

/// A resource ID template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdKind {
    pub name: &'static str,
    pub template: &'static str,
}

macro_rules! id_kinds {
    ($( $(#[$meta:meta])* $konst:ident => ($name:literal, $template:literal) ),+ $(,)?) => {
        $(
            $(#[$meta])*
            pub const $konst: IdKind = IdKind { name: $name, template: $template };
        )+
    };
}

id_kinds! {
    FLEET => ("Fleet",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.AzureFleet/fleets/{fleetName}"),
    SUBNET => ("Subnet",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/virtualNetworks/{virtualNetworkName}/subnets/{subnetName}"),
    NETWORK_SECURITY_GROUP => ("Network Security Group",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/networkSecurityGroups/{networkSecurityGroupName}"),
    APPLICATION_SECURITY_GROUP => ("Application Security Group",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/applicationSecurityGroups/{applicationSecurityGroupName}"),
    PUBLIC_IP_PREFIX => ("Public IP Prefix",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/publicIPPrefixes/{publicIPPrefixName}"),
    LOAD_BALANCER_BACKEND_POOL => ("Load Balancer Backend Address Pool",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/loadBalancers/{loadBalancerName}/backendAddressPools/{backendAddressPoolName}"),
    APPLICATION_GATEWAY_BACKEND_POOL => ("Application Gateway Backend Address Pool",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Network/applicationGateways/{applicationGatewayName}/backendAddressPools/{backendAddressPoolName}"),
    KEY_VAULT => ("Key Vault",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.KeyVault/vaults/{vaultName}"),
    DISK_ENCRYPTION_SET => ("Disk Encryption Set",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/diskEncryptionSets/{diskEncryptionSetName}"),
    CAPACITY_RESERVATION_GROUP => ("Capacity Reservation Group",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/capacityReservationGroups/{capacityReservationGroupName}"),
    GALLERY_APPLICATION_VERSION => ("Gallery Application Version",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/galleries/{galleryName}/applications/{applicationName}/versions/{versionName}"),
    USER_ASSIGNED_IDENTITY => ("User Assigned Identity",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.ManagedIdentity/userAssignedIdentities/{userAssignedIdentityName}"),
    MANAGED_IMAGE => ("Image",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/images/{imageName}"),
    GALLERY_IMAGE => ("Gallery Image",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/galleries/{galleryName}/images/{imageName}"),
    GALLERY_IMAGE_VERSION => ("Gallery Image Version",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/galleries/{galleryName}/images/{imageName}/versions/{versionName}"),
    SHARED_GALLERY_IMAGE_VERSION => ("Shared Gallery Image Version",
        "/sharedGalleries/{galleryUniqueName}/images/{imageName}/versions/{versionName}"),
    COMMUNITY_GALLERY_IMAGE_VERSION => ("Community Gallery Image Version",
        "/communityGalleries/{galleryPublicName}/images/{imageName}/versions/{versionName}"),
    SERVICE_ARTIFACT => ("Service Artifact",
        "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.Compute/galleries/{galleryName}/serviceArtifacts/{serviceArtifactName}/vmArtifactsProfiles/{vmArtifactsProfileName}"),
}

/// A parsed resource ID: the kind plus the captured segment values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub kind: IdKind,
    values: Vec<(&'static str, String)>,
}

impl ParsedId {
    /// Returns a captured segment by its template name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl IdKind {
    /// Parses `value` against this template.
    pub fn parse(&self, value: &str) -> Result<ParsedId> {
        let fail = |message: String| Error::invalid_id(self.name, value, message);

        if !value.starts_with('/') {
            return Err(fail("expected the ID to start with '/'".to_string()));
        }

        let template: Vec<&'static str> = self.template.split('/').skip(1).collect();
        let actual: Vec<&str> = value.trim_end_matches('/').split('/').skip(1).collect();
        if template.len() != actual.len() {
            return Err(fail(format!(
                "expected {} segments but got {}",
                template.len(),
                actual.len()
            )));
        }

        let mut values = Vec::new();
        for (expected, got) in template.iter().zip(actual.iter()) {
            if let Some(name) = expected
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                if got.is_empty() {
                    return Err(fail(format!("the segment {:?} was empty", name)));
                }
                values.push((name, (*got).to_string()));
            } else if !expected.eq_ignore_ascii_case(got) {
                return Err(fail(format!(
                    "expected the segment {:?} but got {:?}",
                    expected, got
                )));
            }
        }

        Ok(ParsedId { kind: *self, values })
    }

    /// Returns a schema validator for this ID kind.
    pub fn validator(self) -> ValidateFunc {
        ValidateFunc::string(move |value| self.parse(value).map(|_| ()).map_err(|e| e.to_string()))
    }
}

/// Accepts a value matching any of the given kinds.
pub fn any_of(kinds: &'static [IdKind]) -> ValidateFunc {
    ValidateFunc::string(move |value| {
        if kinds.iter().any(|kind| kind.parse(value).is_ok()) {
            Ok(())
        } else {
            let names: Vec<&str> = kinds.iter().map(|kind| kind.name).collect();
            Err(format!(
                "expected one of the ID kinds [{}], got {:?}",
                names.join(", "),
                value
            ))
        }
    })
}

/// Kinds accepted for `image_reference.id`.
pub const IMAGE_IDS: &[IdKind] = &[MANAGED_IMAGE, GALLERY_IMAGE, GALLERY_IMAGE_VERSION];
