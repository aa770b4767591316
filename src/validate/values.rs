//! Domain value validators.

use super::{Diagnostics, ValidateFunc};
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static FLEET_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^_\W][\w\-.]{0,62}\w$").expect("Invalid fleet name regex"));

static ISO8601_DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("Invalid duration regex")
});

static KEY_VAULT_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(secrets|certificates|keys)/[A-Za-z0-9-]{1,127}(/[A-Za-z0-9]*)?/?$")
        .expect("Invalid key vault item regex")
});

static WINDOWS_USERNAME_FORBIDDEN: &[char] = &[
    '\\', '/', '"', '[', ']', ':', '|', '<', '>', '+', '=', ';', ',', '?', '*', '@', '&',
];

/// Reserved administrator names rejected on both platforms.
pub const DISALLOWED_ADMIN_USERNAMES: &[&str] = &[
    "administrator",
    "admin",
    "user",
    "user1",
    "test",
    "user2",
    "test1",
    "user3",
    "admin1",
    "1",
    "123",
    "a",
    "actuser",
    "adm",
    "admin2",
    "aspnet",
    "backup",
    "console",
    "david",
    "guest",
    "john",
    "owner",
    "root",
    "server",
    "sql",
    "support",
    "support_388945a0",
    "sys",
    "test2",
    "test3",
    "user4",
    "user5",
];

/// Well-known passwords rejected on both platforms.
pub const DISALLOWED_PASSWORDS: &[&str] = &[
    "abc@123",
    "P@$$w0rd",
    "P@ssw0rd",
    "P@ssword123",
    "Pa$$word",
    "pass@word1",
    "Password!",
    "Password1",
    "Password22",
    "iloveyou!",
];

/// Target platform for credential checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    fn username_max_len(self) -> usize {
        match self {
            Platform::Linux => 64,
            Platform::Windows => 20,
        }
    }

    fn password_len_range(self) -> (usize, usize) {
        match self {
            Platform::Linux => (6, 72),
            Platform::Windows => (8, 123),
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Checks an administrator username.
pub fn check_admin_username(platform: Platform, username: &str) -> Result<(), String> {
    let len = username.chars().count();
    let max = platform.username_max_len();
    if len == 0 || len > max {
        return Err(format!(
            "must be between 1 and {} characters long, got {}",
            max, len
        ));
    }

    if DISALLOWED_ADMIN_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
    {
        return Err(format!("specified admin username {:?} is not allowed", username));
    }

    if platform == Platform::Windows {
        if username.ends_with('.') {
            return Err("cannot end with a period".to_string());
        }
        if username.contains(WINDOWS_USERNAME_FORBIDDEN) {
            return Err(format!(
                "cannot contain the special characters {:?}",
                WINDOWS_USERNAME_FORBIDDEN.iter().collect::<String>()
            ));
        }
    }

    Ok(())
}

/// Counts how many of lowercase, uppercase, digit and special character
/// classes appear in `value`.
pub fn character_class_count(value: &str) -> usize {
    let lower = value.chars().any(|c| c.is_ascii_lowercase());
    let upper = value.chars().any(|c| c.is_ascii_uppercase());
    let digit = value.chars().any(|c| c.is_ascii_digit());
    let special = value.chars().any(|c| !c.is_ascii_alphanumeric());
    [lower, upper, digit, special].iter().filter(|b| **b).count()
}

/// Checks an administrator password for length and complexity.
pub fn check_admin_password(platform: Platform, password: &str) -> Result<(), String> {
    let (min, max) = platform.password_len_range();
    let len = password.chars().count();
    if len < min || len > max {
        return Err(format!("must be between {} and {} characters long", min, max));
    }

    if character_class_count(password) < 3 {
        return Err(
            "must contain at least 3 of: a lowercase character, an uppercase character, a digit, a special character"
                .to_string(),
        );
    }

    if DISALLOWED_PASSWORDS.contains(&password) {
        return Err("is a well known password and is not allowed".to_string());
    }

    Ok(())
}

/// Checks that a value looks like an OpenSSH public key.
pub fn check_ssh_public_key(key: &str) -> Result<(), String> {
    let normalized = normalize_ssh_key(key);
    let mut parts = normalized.split(' ');
    let key_type = parts.next().unwrap_or_default();
    let body = parts.next().unwrap_or_default();

    const KEY_TYPES: &[&str] = &[
        "ssh-rsa",
        "ssh-ed25519",
        "ecdsa-sha2-nistp256",
        "ecdsa-sha2-nistp384",
        "ecdsa-sha2-nistp521",
    ];
    if !KEY_TYPES.contains(&key_type) {
        return Err(format!("has unsupported key type {:?}", key_type));
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| format!("has an invalid key body: {}", e))?;
    if decoded.is_empty() {
        return Err("has an empty key body".to_string());
    }
    if key_type == "ssh-rsa" && decoded.len() < 256 {
        return Err("must be an RSA key of at least 2048 bits".to_string());
    }
    Ok(())
}

/// Removes line breaks and collapses runs of whitespace.
pub fn normalize_ssh_key(key: &str) -> String {
    key.replace(['\r', '\n'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Formats
// ============================================================================

/// Parses an ISO 8601 duration of the form `PnDTnHnMnS`.
pub fn parse_iso8601_duration(value: &str) -> Option<Duration> {
    if value == "P" || value.ends_with('T') {
        return None;
    }
    let caps = ISO8601_DURATION_REGEX.captures(value)?;
    let mut secs: u64 = 0;
    for (i, unit) in [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)] {
        if let Some(m) = caps.get(i) {
            let n: u64 = m.as_str().parse().ok()?;
            secs = secs.checked_add(n.checked_mul(unit)?)?;
        }
    }
    Some(Duration::from_secs(secs))
}

pub fn check_fleet_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 64 {
        return Err("must be between 1 and 64 characters".to_string());
    }
    if !FLEET_NAME_REGEX.is_match(name) {
        return Err(
            "must begin with a letter or number, end with a letter, number or underscore, and may contain only letters, numbers, underscores, periods, or hyphens"
                .to_string(),
        );
    }
    Ok(())
}

pub fn check_base64(value: &str) -> Result<(), String> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map(|_| ())
        .map_err(|e| format!("is not valid base64: {}", e))
}

pub fn check_json(value: &str) -> Result<(), String> {
    serde_json::from_str::<serde_json::Value>(value)
        .map(|_| ())
        .map_err(|e| format!("contains an invalid JSON: {}", e))
}

/// Checks a Key Vault nested item URL (`https://<vault>.vault.azure.net/secrets/<name>[/<version>]`).
pub fn check_key_vault_item_url(value: &str) -> Result<(), String> {
    let url = url::Url::parse(value).map_err(|e| format!("is not a valid URL: {}", e))?;
    if url.scheme() != "https" {
        return Err("must use the https scheme".to_string());
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("must contain a key vault host".to_string());
    }
    if !KEY_VAULT_ITEM_REGEX.is_match(url.path()) {
        return Err(format!(
            "expected a key vault item path like /secrets/<name>/<version>, got {:?}",
            url.path()
        ));
    }
    Ok(())
}

pub fn check_https_url(value: &str) -> Result<(), String> {
    let url = url::Url::parse(value).map_err(|e| format!("is not a valid URL: {}", e))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(format!("must use http or https, got {:?}", url.scheme()));
    }
    Ok(())
}

// ============================================================================
// Schema validators
// ============================================================================

pub fn string_is_not_empty() -> ValidateFunc {
    ValidateFunc::string(|s| {
        if s.trim().is_empty() {
            Err("must not be empty".to_string())
        } else {
            Ok(())
        }
    })
}

pub fn string_len_between(min: usize, max: usize) -> ValidateFunc {
    ValidateFunc::string(move |s| {
        let len = s.chars().count();
        if len < min || len > max {
            Err(format!(
                "must be between {} and {} characters, got {}",
                min, max, len
            ))
        } else {
            Ok(())
        }
    })
}

pub fn string_matches(regex: &'static Lazy<Regex>, message: &'static str) -> ValidateFunc {
    ValidateFunc::string(move |s| {
        if regex.is_match(s) {
            Ok(())
        } else {
            Err(message.to_string())
        }
    })
}

/// Accepts one of `values`, compared exactly.
pub fn string_in_slice(values: &'static [&'static str]) -> ValidateFunc {
    ValidateFunc::string(move |s| {
        if values.contains(&s) {
            Ok(())
        } else {
            Err(format!("must be one of {:?}, got {:?}", values, s))
        }
    })
}

pub fn int_between(min: i64, max: i64) -> ValidateFunc {
    ValidateFunc::int(move |n| {
        if n < min || n > max {
            Err(format!("must be in the range ({} - {}), got {}", min, max, n))
        } else {
            Ok(())
        }
    })
}

pub fn int_at_least(min: i64) -> ValidateFunc {
    ValidateFunc::int(move |n| {
        if n < min {
            Err(format!("must be at least ({}), got {}", min, n))
        } else {
            Ok(())
        }
    })
}

pub fn float_at_least(min: f64) -> ValidateFunc {
    ValidateFunc::float(move |n| {
        if n < min {
            Err(format!("must be at least ({}), got {}", min, n))
        } else {
            Ok(())
        }
    })
}

/// `-1` (pay up to the on-demand price) or a positive price.
pub fn spot_max_price() -> ValidateFunc {
    ValidateFunc::float(|n| {
        if n == -1.0 || n > 0.0 {
            Ok(())
        } else {
            Err(format!("must be -1 or greater than 0, got {}", n))
        }
    })
}

pub fn iso8601_duration_between(min: &'static str, max: &'static str) -> ValidateFunc {
    ValidateFunc::string(move |s| {
        let (Some(lo), Some(hi)) = (parse_iso8601_duration(min), parse_iso8601_duration(max))
        else {
            return Err(format!("has an invalid duration range {} - {}", min, max));
        };
        match parse_iso8601_duration(s) {
            Some(d) if d >= lo && d <= hi => Ok(()),
            Some(_) => Err(format!("must be between {} and {}, got {:?}", min, max, s)),
            None => Err(format!("is not a valid ISO 8601 duration: {:?}", s)),
        }
    })
}

pub fn is_base64() -> ValidateFunc {
    ValidateFunc::string(check_base64)
}

pub fn is_json() -> ValidateFunc {
    ValidateFunc::string(check_json)
}

pub fn is_url() -> ValidateFunc {
    ValidateFunc::string(check_https_url)
}

pub fn key_vault_item_url() -> ValidateFunc {
    ValidateFunc::string(check_key_vault_item_url)
}

pub fn fleet_name() -> ValidateFunc {
    ValidateFunc::string(check_fleet_name)
}

pub fn admin_username(platform: Platform) -> ValidateFunc {
    ValidateFunc::string(move |s| check_admin_username(platform, s))
}

pub fn admin_password(platform: Platform) -> ValidateFunc {
    ValidateFunc::string(move |s| check_admin_password(platform, s))
}

pub fn ssh_public_key() -> ValidateFunc {
    ValidateFunc::string(check_ssh_public_key)
}

/// Computer name prefixes: 1-58 characters on Linux, 1-15 on Windows, no
/// leading underscore or trailing period.
pub fn computer_name_prefix(platform: Platform) -> ValidateFunc {
    let max = match platform {
        Platform::Linux => 58,
        Platform::Windows => 15,
    };
    ValidateFunc::new(move |value, key| {
        let Some(s) = value.as_str() else {
            return Diagnostics::error(format!("expected type of {:?} to be string", key));
        };
        let len = s.chars().count();
        if len == 0 || len > max {
            return Diagnostics::error(format!(
                "{:?} must be between 1 and {} characters, got {}",
                key, max, len
            ));
        }
        if s.starts_with('_') || s.ends_with('.') {
            return Diagnostics::error(format!(
                "{:?} cannot begin with an underscore or end with a period",
                key
            ));
        }
        if platform == Platform::Windows && s.chars().all(|c| c.is_ascii_digit()) {
            return Diagnostics::error(format!("{:?} cannot be entirely numeric", key));
        }
        Diagnostics::ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_username_denylist_is_case_insensitive() {
        assert!(check_admin_username(Platform::Linux, "Administrator").is_err());
        assert!(check_admin_username(Platform::Windows, "ROOT").is_err());
        assert!(check_admin_username(Platform::Linux, "azureuser").is_ok());
    }

    #[test]
    fn test_admin_username_length() {
        assert!(check_admin_username(Platform::Linux, &"a".repeat(64)).is_ok());
        assert!(check_admin_username(Platform::Linux, &"b".repeat(65)).is_err());
        assert!(check_admin_username(Platform::Windows, &"b".repeat(21)).is_err());
        assert!(check_admin_username(Platform::Linux, "").is_err());
    }

    #[test]
    fn test_windows_username_characters() {
        assert!(check_admin_username(Platform::Windows, "adm.").is_err());
        assert!(check_admin_username(Platform::Windows, "a@b").is_err());
        assert!(check_admin_username(Platform::Windows, "fleetadmin").is_ok());
    }

    #[test]
    fn test_password_complexity() {
        assert!(check_admin_password(Platform::Linux, "P@ssw0rd1234!").is_ok());
        assert!(check_admin_password(Platform::Linux, "abcdefgh").is_err());
        assert!(check_admin_password(Platform::Linux, "Ab1!").is_err());
        assert!(check_admin_password(Platform::Windows, "Ab1!xyz").is_err());
        assert!(check_admin_password(Platform::Windows, "Ab1!xyzw").is_ok());
        assert!(check_admin_password(Platform::Windows, "P@ssw0rd").is_err());
    }

    #[test]
    fn test_iso8601_durations() {
        assert_eq!(
            parse_iso8601_duration("PT1H30M"),
            Some(Duration::from_secs(5400))
        );
        assert_eq!(parse_iso8601_duration("PT15M"), Some(Duration::from_secs(900)));
        assert_eq!(parse_iso8601_duration("P1D"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_iso8601_duration("P"), None);
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("15 minutes"), None);

        let v = iso8601_duration_between("PT15M", "PT2H");
        assert!(v.check(&json!("PT1H30M"), "extensions_time_budget").is_ok());
        assert!(!v.check(&json!("PT3H"), "extensions_time_budget").is_ok());
        assert!(!v.check(&json!("PT14M"), "extensions_time_budget").is_ok());
    }

    #[test]
    fn test_iso8601_duration_overflow_is_invalid() {
        assert_eq!(parse_iso8601_duration("P999999999999999D"), None);
        assert_eq!(parse_iso8601_duration("PT99999999999999999999M"), None);
        assert_eq!(parse_iso8601_duration("PT1H99999999999999999999M"), None);
        assert_eq!(
            parse_iso8601_duration("PT18446744073709551615S"),
            Some(Duration::from_secs(u64::MAX))
        );

        let v = iso8601_duration_between("PT15M", "PT2H");
        assert!(!v.check(&json!("PT1H99999999999999999999M"), "extensions_time_budget").is_ok());
    }

    #[test]
    fn test_fleet_name() {
        assert!(check_fleet_name("acctest-fleet-01").is_ok());
        assert!(check_fleet_name("_fleet").is_err());
        assert!(check_fleet_name("fleet-").is_err());
        assert!(check_fleet_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_json_and_base64() {
        assert!(check_json(r#"{"commandToExecute": "echo hi"}"#).is_ok());
        assert!(check_json("{not json").is_err());
        assert!(check_base64("aGVsbG8=").is_ok());
        assert!(check_base64("not base64!").is_err());
    }

    #[test]
    fn test_key_vault_item_url() {
        assert!(check_key_vault_item_url("https://kv1.vault.azure.net/secrets/secret1/abc123").is_ok());
        assert!(check_key_vault_item_url("https://kv1.vault.azure.net/secrets/secret1").is_ok());
        assert!(check_key_vault_item_url("http://kv1.vault.azure.net/secrets/secret1").is_err());
        assert!(check_key_vault_item_url("https://kv1.vault.azure.net/other/x").is_err());
    }

    #[test]
    fn test_ssh_key_normalization() {
        assert_eq!(
            normalize_ssh_key("ssh-rsa  AAAA\nBBBB  user@host\r\n"),
            "ssh-rsa AAAABBBB user@host"
        );
        assert!(check_ssh_public_key("ssh-dss AAAA").is_err());
    }

    #[test]
    fn test_spot_max_price() {
        let v = spot_max_price();
        assert!(v.check(&json!(-1.0), "max_price_per_vm").is_ok());
        assert!(v.check(&json!(0.5), "max_price_per_vm").is_ok());
        assert!(!v.check(&json!(0.0), "max_price_per_vm").is_ok());
    }

    #[test]
    fn test_computer_name_prefix() {
        let windows = computer_name_prefix(Platform::Windows);
        assert!(windows.check(&json!("web"), "computer_name_prefix").is_ok());
        assert!(!windows.check(&json!("1234"), "computer_name_prefix").is_ok());
        assert!(!windows.check(&json!("a".repeat(16)), "computer_name_prefix").is_ok());
    }
}
