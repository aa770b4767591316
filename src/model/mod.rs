//! Configuration-side record tree.
//!
//! This is the shape the host runtime hands to the resource: nested blocks
//! of scalars, where every singleton block travels as a list holding zero
//! or one element. In Rust those blocks are `Option<T>` fields serialized
//! through [`singleton`], which keeps the wire convention while letting
//! code distinguish an absent block (`None`) from a block present with all
//! default fields (`Some(T::default())`).

mod fleet;
mod vm_profile;

pub use fleet::*;
pub use vm_profile::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration value that must never be logged.
///
/// Serializes transparently as the underlying string; `Debug` and
/// `Display` print a placeholder.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<sensitive>")
    }
}

impl fmt::Display for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<sensitive>")
    }
}

impl From<&str> for Sensitive {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Sensitive {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Serde adapter for singleton blocks modelled as lists with `MaxItems = 1`.
///
/// `None` is written as `[]`, `Some(v)` as `[v]`. Reading accepts `null`,
/// `[]` and `[v]`; more than one element is rejected.
pub mod singleton {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => std::slice::from_ref(inner).serialize(serializer),
            None => {
                let empty: [&T; 0] = [];
                empty.serialize(serializer)
            }
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let mut items: Vec<T> = Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default();
        if items.len() > 1 {
            return Err(D::Error::custom(format!(
                "expected at most 1 item, got {}",
                items.len()
            )));
        }
        Ok(items.pop())
    }
}
