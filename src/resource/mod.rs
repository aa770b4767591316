//! Resource lifecycle seam.
//!
//! A [`Resource`] owns one schema and implements the four lifecycle entry
//! points the host runtime drives. Each entry point receives a
//! [`ResourceData`] handle carrying the planned configuration, the prior
//! local state and the resource ID, and writes its outcome back to it.

mod fleet;

pub use fleet::FleetResource;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::flatten::StateView;
use crate::schema::Schema;
use crate::validate::Diagnostics;

/// A managed resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name in the host dialect.
    fn name(&self) -> &'static str;

    /// The configuration grammar.
    fn schema(&self) -> &Schema;

    /// Validates a configuration tree against the schema.
    fn validate(&self, config: &Value) -> Diagnostics {
        self.schema().validate(config)
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()>;

    async fn read(&self, data: &mut ResourceData) -> Result<()>;

    async fn update(&self, data: &mut ResourceData) -> Result<()>;

    async fn delete(&self, data: &mut ResourceData) -> Result<()>;
}

/// Per-operation budgets for the polling loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub create: Duration,
    #[serde(with = "humantime_serde")]
    pub read: Duration,
    #[serde(with = "humantime_serde")]
    pub update: Duration,
    #[serde(with = "humantime_serde")]
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            read: Duration::from_secs(5 * 60),
            update: Duration::from_secs(30 * 60),
            delete: Duration::from_secs(30 * 60),
        }
    }
}

/// State handle passed to every lifecycle call.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<Schema>,
    id: Option<String>,
    config: Value,
    state: Value,
    gone: bool,
}

impl ResourceData {
    /// A handle for a resource that does not exist yet.
    pub fn new(schema: Arc<Schema>, config: Value) -> Self {
        Self {
            schema,
            id: None,
            config,
            state: Value::Null,
            gone: false,
        }
    }

    /// Sets the prior local state.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Sets the resource ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The resource ID, or `MalformedInput` when none is recorded.
    pub fn require_id(&self) -> Result<&str> {
        self.id()
            .ok_or_else(|| Error::malformed("resource has no ID recorded in state"))
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
        self.gone = false;
    }

    /// The planned configuration.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// The local state as last written.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Read-only view of the local state for sensitive-field recovery.
    pub fn state_view(&self) -> StateView<'_> {
        if self.state.is_null() {
            StateView::empty()
        } else {
            StateView::new(&self.state)
        }
    }

    pub fn set_state(&mut self, state: Value) {
        self.state = state;
    }

    /// Records that the remote object no longer exists.
    pub fn mark_gone(&mut self) {
        self.id = None;
        self.state = Value::Null;
        self.gone = true;
    }

    pub fn is_gone(&self) -> bool {
        self.gone
    }

    /// Decodes the planned configuration, with schema defaults applied.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut config = self.config.clone();
        self.schema.apply_defaults(&mut config);
        serde_json::from_value(config).map_err(|source| Error::Unmarshal {
            field: "configuration",
            source,
        })
    }

    /// Whether the planned value at `key` differs from the stored one.
    ///
    /// Both sides get schema defaults, and zero values are treated as
    /// unset, so an omitted field equals an explicit `""`, `false`, `0` or
    /// empty list. Diff suppressors apply to every leaf below `key`.
    pub fn has_change(&self, key: &str) -> bool {
        let canonical = |value: &Value| {
            let mut value = value.clone();
            self.schema.apply_defaults(&mut value);
            prune_zero_values(&mut value);
            value
        };
        let old = canonical(&self.state);
        let new = canonical(&self.config);
        let old_value = StateView::new(&old).value(key).cloned().unwrap_or(Value::Null);
        let new_value = StateView::new(&new).value(key).cloned().unwrap_or(Value::Null);
        self.schema.values_differ(key, &old_value, &new_value)
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Removes zero-valued fields from every object in the tree.
fn prune_zero_values(value: &mut Value) {
    match value {
        Value::Object(map) => prune_map(map),
        Value::Array(items) => items.iter_mut().for_each(prune_zero_values),
        _ => {}
    }
}

fn prune_map(map: &mut Map<String, Value>) {
    for child in map.values_mut() {
        prune_zero_values(child);
    }
    map.retain(|_, child| !is_zero(child));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fleet_schema;
    use serde_json::json;

    fn data(config: Value, state: Value) -> ResourceData {
        ResourceData::new(Arc::new(fleet_schema()), config).with_state(state)
    }

    #[test]
    fn test_timeout_defaults() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.create, Duration::from_secs(1800));
        assert_eq!(timeouts.read, Duration::from_secs(300));
        assert_eq!(timeouts.delete, Duration::from_secs(1800));
    }

    #[test]
    fn test_timeouts_parse_humantime() {
        let timeouts: Timeouts = serde_json::from_value(json!({ "create": "45m" })).unwrap();
        assert_eq!(timeouts.create, Duration::from_secs(45 * 60));
        assert_eq!(timeouts.update, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_has_change_ignores_zero_values() {
        let d = data(
            json!({ "zones": [], "tags": { "env": "prod" } }),
            json!({ "tags": { "env": "prod" } }),
        );
        assert!(!d.has_change("zones"));
        assert!(!d.has_change("tags"));
    }

    #[test]
    fn test_has_change_detects_nested_change() {
        let state = json!({
            "regular_priority_profile": [{ "capacity": 2, "min_capacity": 1 }]
        });
        let config = json!({
            "regular_priority_profile": [{ "capacity": 3, "min_capacity": 1 }]
        });
        assert!(data(config, state.clone()).has_change("regular_priority_profile"));
        assert!(!data(state.clone(), state).has_change("regular_priority_profile"));
    }

    #[test]
    fn test_has_change_applies_defaults() {
        let state = json!({
            "regular_priority_profile": [{ "allocation_strategy": "LowestPrice", "capacity": 2 }]
        });
        let config = json!({ "regular_priority_profile": [{ "capacity": 2 }] });
        assert!(!data(config, state).has_change("regular_priority_profile"));
    }

    #[test]
    fn test_has_change_honours_suppressors() {
        let d = data(json!({ "location": "West Europe" }), json!({ "location": "westeurope" }));
        assert!(!d.has_change("location"));
    }

    #[test]
    fn test_mark_gone_clears_state() {
        let mut d = data(json!({}), json!({ "name": "f1" })).with_id("/subscriptions/s");
        d.mark_gone();
        assert!(d.is_gone());
        assert_eq!(d.id(), None);
        assert!(d.state().is_null());
        assert!(d.require_id().is_err());
    }

    #[test]
    fn test_decode_reports_unmarshal() {
        let d = data(json!({ "name": 5 }), Value::Null);
        let err = d.decode::<crate::model::FleetConfig>().unwrap_err();
        assert!(err.to_string().starts_with("unmarshaling configuration: "));
    }
}
