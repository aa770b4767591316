//! Leaf validators.
//!
//! A validator inspects one configuration value and reports warnings and
//! errors; an empty error list means the value is accepted. Validators are
//! stateless and are attached to schema leaves in [`crate::schema`].
//!
//! - [`ids`] parses Azure resource IDs (subnets, key vaults, ...)
//! - [`values`] covers domain checks (usernames, passwords, durations, ...)

pub mod ids;
pub mod values;

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Warnings and errors reported for a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            warnings: Vec::new(),
            errors: vec![message.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Appends another set of diagnostics.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

impl From<Result<(), String>> for Diagnostics {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(message) => Self::error(message),
        }
    }
}

/// A leaf validator: `(value, key) -> diagnostics`.
#[derive(Clone)]
pub struct ValidateFunc(Arc<dyn Fn(&Value, &str) -> Diagnostics + Send + Sync>);

impl ValidateFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &str) -> Diagnostics + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Builds a validator over string values from a fallible predicate.
    ///
    /// The predicate's message is prefixed with the key. Non-string values
    /// are reported as a type error.
    pub fn string<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(move |value, key| match value.as_str() {
            Some(s) => f(s).map_err(|e| format!("{:?} {}", key, e)).into(),
            None => Diagnostics::error(format!("expected type of {:?} to be string", key)),
        })
    }

    /// Builds a validator over integer values from a fallible predicate.
    pub fn int<F>(f: F) -> Self
    where
        F: Fn(i64) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(move |value, key| match value.as_i64() {
            Some(n) => f(n).map_err(|e| format!("{:?} {}", key, e)).into(),
            None => Diagnostics::error(format!("expected type of {:?} to be integer", key)),
        })
    }

    /// Builds a validator over float values from a fallible predicate.
    pub fn float<F>(f: F) -> Self
    where
        F: Fn(f64) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(move |value, key| match value.as_f64() {
            Some(n) => f(n).map_err(|e| format!("{:?} {}", key, e)).into(),
            None => Diagnostics::error(format!("expected type of {:?} to be float", key)),
        })
    }

    /// Runs the validator.
    pub fn check(&self, value: &Value, key: &str) -> Diagnostics {
        (self.0)(value, key)
    }
}

impl fmt::Debug for ValidateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidateFunc")
    }
}

/// Runs every validator and merges the diagnostics.
pub fn all(validators: Vec<ValidateFunc>) -> ValidateFunc {
    ValidateFunc::new(move |value, key| {
        let mut diags = Diagnostics::ok();
        for validator in &validators {
            diags.extend(validator.check(value, key));
        }
        diags
    })
}
