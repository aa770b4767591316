//! Schema integration tests.
//!
//! Full fleet documents run through the schema walker: required blocks,
//! one-of groups, item limits, leaf validators, defaults and redaction.

mod common;

use serde_json::json;

use azurefleet::schema::fleet_schema;

use common::*;

fn errors_for(config: &serde_json::Value) -> Vec<String> {
    fleet_schema().validate(config).errors
}

#[test]
fn test_basic_fleet_is_valid() {
    let diags = fleet_schema().validate(&basic_fleet_config());
    assert!(diags.is_ok(), "unexpected errors: {:?}", diags.errors);
}

#[test]
fn test_compute_profile_is_required() {
    let mut config = basic_fleet_config();
    config.as_object_mut().unwrap().remove("compute_profile");

    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("compute_profile: The argument \"compute_profile\" is required")));
}

#[test]
fn test_vm_profile_requires_storage_profile() {
    let mut config = basic_fleet_config();
    base_vm_profile_mut(&mut config)
        .as_object_mut()
        .unwrap()
        .remove("storage_profile");

    let errors = errors_for(&config);
    assert!(errors.iter().any(|e| e.starts_with(
        "compute_profile.0.base_virtual_machine_profile.0.storage_profile: The argument"
    )));
}

#[test]
fn test_os_profile_needs_exactly_one_configuration() {
    let mut config = basic_fleet_config();
    base_vm_profile_mut(&mut config)["os_profile"][0]["windows_configuration"] = json!([{
        "admin_username": "azureuser",
        "admin_password": ADMIN_PASSWORD
    }]);

    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("exactly one of `") && e.ends_with("got 2")));

    base_vm_profile_mut(&mut config)["os_profile"] = json!([{}]);
    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("exactly one of `") && e.ends_with("got 0")));
}

#[test]
fn test_vm_sizes_profile_limits() {
    let mut config = basic_fleet_config();
    let sizes: Vec<_> = (0..16)
        .map(|i| json!({ "name": format!("Standard_D{}s_v3", i + 2) }))
        .collect();
    config["vm_sizes_profile"] = json!(sizes);

    let errors = errors_for(&config);
    assert!(errors.iter().any(|e| e
        == "vm_sizes_profile: attribute supports 15 item maximum, but config has 16 declared"));

    config["vm_sizes_profile"] = json!([]);
    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("vm_sizes_profile: The argument")));
}

#[test]
fn test_reserved_admin_username_rejected() {
    let mut config = basic_fleet_config();
    base_vm_profile_mut(&mut config)["os_profile"][0]["linux_configuration"][0]["admin_username"] =
        json!("Administrator");

    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.contains("admin_username") && e.contains("is not allowed")));
}

#[test]
fn test_short_ssh_key_rejected() {
    let mut config = basic_fleet_config();
    base_vm_profile_mut(&mut config)["os_profile"][0]["linux_configuration"][0]["admin_ssh_key"] =
        json!([{ "public_key": "ssh-rsa AAAAB3NzaC1yc2E=", "username": "azureuser" }]);

    let errors = errors_for(&config);
    assert!(errors.iter().any(|e| e.contains("public_key")));
}

#[test]
fn test_invalid_subnet_id_rejected() {
    let mut config = basic_fleet_config();
    base_vm_profile_mut(&mut config)["network_interface"][0]["ip_configuration"][0]["subnet_id"] =
        json!("/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1");

    let errors = errors_for(&config);
    assert!(errors.iter().any(|e| e.contains("subnet_id")));
}

#[test]
fn test_computed_fields_cannot_be_configured() {
    let mut config = basic_fleet_config();
    config["unique_id"] = json!("abc");

    let errors = errors_for(&config);
    assert!(errors
        .iter()
        .any(|e| e.starts_with("unique_id: can't configure a value")));
}

#[test]
fn test_defaults_fill_nested_blocks() {
    let mut config = basic_fleet_config();
    fleet_schema().apply_defaults(&mut config);

    let profile = base_vm_profile_mut(&mut config);
    assert_eq!(profile["extension_operations_enabled"], json!(true));
    let linux = &profile["os_profile"][0]["linux_configuration"][0];
    assert_eq!(linux["patch_mode"], json!("ImageDefault"));
    assert_eq!(linux["patch_assessment_mode"], json!("ImageDefault"));
    assert_eq!(linux["provision_vm_agent_enabled"], json!(true));
}

#[test]
fn test_redact_hides_passwords() {
    let mut config = basic_fleet_config();
    fleet_schema().redact(&mut config);

    let linux = &base_vm_profile_mut(&mut config)["os_profile"][0]["linux_configuration"][0];
    assert_eq!(linux["admin_password"], json!("<sensitive>"));
    assert_eq!(linux["admin_username"], json!("azureuser"));
}

#[test]
fn test_location_changes_are_case_and_space_insensitive() {
    let schema = fleet_schema();
    assert!(!schema.values_differ("location", &json!("West Europe"), &json!("westeurope")));
    assert!(schema.values_differ("location", &json!("westeurope"), &json!("northeurope")));
}
