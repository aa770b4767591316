//! Schema declaration for the fleet resource.
//!
//! A [`Schema`] is a recursive [`Block`] of named [`Attribute`]s. Each
//! attribute carries its kind, cardinality, default, leaf validator,
//! conflict rules and advisory flags (force-new, sensitive, diff
//! suppression). Singleton blocks are lists with `max_items(1)`.
//!
//! The declaration drives four things:
//!
//! - [`Schema::validate`] walks a JSON configuration tree and reports
//!   every violation with its dotted path
//! - [`Schema::apply_defaults`] fills declared defaults into a tree
//! - [`Schema::values_differ`] compares two trees with diff suppression,
//!   which backs the update dirty flags
//! - [`Schema::force_new_paths`] lists attributes that need a replacement

mod fleet;
mod vm_profile;

pub use fleet::{fleet_schema, RESOURCE_TYPE};
pub use vm_profile::virtual_machine_profile_block;

use crate::validate::values::normalize_ssh_key;
use crate::validate::{Diagnostics, ValidateFunc};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Predicate treating two textually different values as equal.
pub type DiffSuppressFunc = fn(old: &str, new: &str) -> bool;

/// Shape of an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Bool,
    Int,
    Float,
    String,
    /// Ordered list of elements.
    List,
    /// Unordered collection of unique elements.
    Set,
    /// String-keyed map of strings.
    Map,
}

impl AttributeKind {
    fn name(self) -> &'static str {
        match self {
            AttributeKind::Bool => "bool",
            AttributeKind::Int => "int",
            AttributeKind::Float => "float",
            AttributeKind::String => "string",
            AttributeKind::List => "list",
            AttributeKind::Set => "set",
            AttributeKind::Map => "map",
        }
    }
}

/// Element type of a list or set.
#[derive(Debug, Clone)]
pub enum Element {
    String,
    Int,
    Block(Block),
}

/// One named field.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub elem: Option<Element>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub validate: Option<ValidateFunc>,
    pub conflicts_with: Vec<&'static str>,
    pub exactly_one_of: Vec<&'static str>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub diff_suppress: Option<DiffSuppressFunc>,
}

impl Attribute {
    fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            elem: None,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            validate: None,
            conflicts_with: Vec::new(),
            exactly_one_of: Vec::new(),
            min_items: None,
            max_items: None,
            diff_suppress: None,
        }
    }

    fn required_of(kind: AttributeKind) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    fn optional_of(kind: AttributeKind) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    pub fn required_string() -> Self {
        Self::required_of(AttributeKind::String)
    }

    pub fn optional_string() -> Self {
        Self::optional_of(AttributeKind::String)
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::new(AttributeKind::String)
        }
    }

    pub fn required_int() -> Self {
        Self::required_of(AttributeKind::Int)
    }

    pub fn optional_int() -> Self {
        Self::optional_of(AttributeKind::Int)
    }

    pub fn required_float() -> Self {
        Self::required_of(AttributeKind::Float)
    }

    pub fn optional_float() -> Self {
        Self::optional_of(AttributeKind::Float)
    }

    pub fn required_bool() -> Self {
        Self::required_of(AttributeKind::Bool)
    }

    pub fn optional_bool() -> Self {
        Self::optional_of(AttributeKind::Bool)
    }

    pub fn optional_map() -> Self {
        Self::optional_of(AttributeKind::Map)
    }

    /// An ordered list of strings.
    pub fn string_list() -> Self {
        Self {
            elem: Some(Element::String),
            ..Self::optional_of(AttributeKind::List)
        }
    }

    /// A set of strings.
    pub fn string_set() -> Self {
        Self {
            elem: Some(Element::String),
            ..Self::optional_of(AttributeKind::Set)
        }
    }

    /// A required singleton block.
    pub fn required_block(block: Block) -> Self {
        Self {
            elem: Some(Element::Block(block)),
            min_items: Some(1),
            max_items: Some(1),
            ..Self::required_of(AttributeKind::List)
        }
    }

    /// An optional singleton block.
    pub fn optional_block(block: Block) -> Self {
        Self {
            elem: Some(Element::Block(block)),
            max_items: Some(1),
            ..Self::optional_of(AttributeKind::List)
        }
    }

    /// A list of blocks.
    pub fn block_list(block: Block) -> Self {
        Self {
            elem: Some(Element::Block(block)),
            ..Self::optional_of(AttributeKind::List)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Optional, with the API filling the value when unset.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn validate(mut self, validator: ValidateFunc) -> Self {
        self.validate = Some(validator);
        self
    }

    pub fn conflicts_with(mut self, keys: &[&'static str]) -> Self {
        self.conflicts_with.extend_from_slice(keys);
        self
    }

    pub fn exactly_one_of(mut self, keys: &[&'static str]) -> Self {
        self.exactly_one_of.extend_from_slice(keys);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn diff_suppress(mut self, f: DiffSuppressFunc) -> Self {
        self.diff_suppress = Some(f);
        self
    }

    /// Returns the nested block, if this attribute holds blocks.
    pub fn block(&self) -> Option<&Block> {
        match &self.elem {
            Some(Element::Block(block)) => Some(block),
            _ => None,
        }
    }

    /// Whether users may set this attribute.
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }
}

/// A nested set of attributes.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: IndexMap<&'static str, Attribute>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

/// Schema for one resource type.
#[derive(Debug, Clone)]
pub struct Schema {
    pub type_name: &'static str,
    pub block: Block,
}

impl Schema {
    pub fn new(type_name: &'static str, block: Block) -> Self {
        Self { type_name, block }
    }

    /// Looks up an attribute by dotted path; numeric list indexes are skipped.
    pub fn lookup(&self, path: &str) -> Option<&Attribute> {
        let mut block = &self.block;
        let mut found: Option<&Attribute> = None;
        for segment in path.split('.') {
            if segment.parse::<usize>().is_ok() {
                continue;
            }
            if let Some(parent) = found {
                block = parent.block()?;
            }
            found = Some(block.get(segment)?);
        }
        found
    }

    /// Top-level attributes whose change requires replacement.
    pub fn force_new_paths(&self) -> Vec<&'static str> {
        self.block
            .attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Validates a configuration tree.
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::ok();
        match config.as_object() {
            Some(object) => validate_block(&self.block, object, "", &mut diags),
            None => diags
                .errors
                .push("configuration must be an object".to_string()),
        }
        diags
    }

    /// Fills declared defaults for unset attributes.
    pub fn apply_defaults(&self, config: &mut Value) {
        if let Some(object) = config.as_object_mut() {
            apply_block_defaults(&self.block, object);
        }
    }

    /// Whether the stored and planned values at `path` differ, honoring
    /// diff suppressors on every leaf below it.
    pub fn values_differ(&self, path: &str, old: &Value, new: &Value) -> bool {
        match self.lookup(path) {
            Some(attr) => attribute_values_differ(attr, old, new),
            None => old != new,
        }
    }

    /// Whether the change from `old` to `new` at leaf `path` is suppressed.
    pub fn diff_suppressed(&self, path: &str, old: &str, new: &str) -> bool {
        self.lookup(path)
            .and_then(|attr| attr.diff_suppress)
            .map_or(false, |f| f(old, new))
    }

    /// Replaces every sensitive value with a placeholder.
    pub fn redact(&self, config: &mut Value) {
        if let Some(object) = config.as_object_mut() {
            redact_block(&self.block, object);
        }
    }

    /// Machine-readable description of the schema.
    pub fn describe(&self) -> Value {
        json!({
            "type": self.type_name,
            "block": describe_block(&self.block),
        })
    }
}

/// A value counts as set when it is not null and not an empty string,
/// list or map.
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn validate_block(block: &Block, object: &Map<String, Value>, prefix: &str, diags: &mut Diagnostics) {
    for key in object.keys() {
        match block.get(key) {
            None => diags.errors.push(format!(
                "{}: An argument named {:?} is not expected here",
                join_path(prefix, key),
                key
            )),
            Some(attr) if !attr.is_configurable() && is_set(object.get(key)) => {
                diags.errors.push(format!(
                    "{}: can't configure a value for {:?}: its value will be decided automatically",
                    join_path(prefix, key),
                    key
                ))
            }
            Some(_) => {}
        }
    }

    for (name, attr) in &block.attributes {
        let path = join_path(prefix, name);
        let value = object.get(*name);

        if attr.required && !is_set(value) {
            diags.errors.push(format!(
                "{}: The argument {:?} is required, but no definition was found",
                path, name
            ));
            continue;
        }

        if is_set(value) {
            for other in &attr.conflicts_with {
                if is_set(object.get(*other)) {
                    diags.errors.push(format!(
                        "{}: conflicts with {}",
                        path,
                        join_path(prefix, other)
                    ));
                }
            }
        }

        if !attr.exactly_one_of.is_empty() {
            let mut group: Vec<&str> = attr.exactly_one_of.clone();
            if !group.contains(name) {
                group.push(name);
            }
            group.sort_unstable();
            let count = group.iter().filter(|k| is_set(object.get(**k))).count();
            if count != 1 {
                let paths: Vec<String> = group.iter().map(|k| join_path(prefix, k)).collect();
                let message = format!(
                    "exactly one of `{}` must be specified, got {}",
                    paths.join(","),
                    count
                );
                if !diags.errors.contains(&message) {
                    diags.errors.push(message);
                }
            }
        }

        if let Some(value) = value {
            if !value.is_null() {
                validate_value(attr, value, &path, diags);
            }
        }
    }
}

fn validate_value(attr: &Attribute, value: &Value, path: &str, diags: &mut Diagnostics) {
    let type_ok = match attr.kind {
        AttributeKind::Bool => value.is_boolean(),
        AttributeKind::Int => value.is_i64(),
        AttributeKind::Float => value.is_number(),
        AttributeKind::String => value.is_string(),
        AttributeKind::List | AttributeKind::Set => value.is_array(),
        AttributeKind::Map => value
            .as_object()
            .map_or(false, |m| m.values().all(Value::is_string)),
    };
    if !type_ok {
        diags.errors.push(format!(
            "{}: expected a value of type {}",
            path,
            attr.kind.name()
        ));
        return;
    }

    match attr.kind {
        AttributeKind::List | AttributeKind::Set => {
            let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
            if let Some(min) = attr.min_items {
                if items.len() < min {
                    diags.errors.push(format!(
                        "{}: attribute supports {} item minimum, but config has only {} declared",
                        path,
                        min,
                        items.len()
                    ));
                }
            }
            if let Some(max) = attr.max_items {
                if items.len() > max {
                    diags.errors.push(format!(
                        "{}: attribute supports {} item maximum, but config has {} declared",
                        path,
                        max,
                        items.len()
                    ));
                }
            }
            if attr.kind == AttributeKind::Set {
                for (i, item) in items.iter().enumerate() {
                    if items[..i].contains(item) {
                        diags
                            .errors
                            .push(format!("{}: duplicate set element {}", path, item));
                    }
                }
            }
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                match &attr.elem {
                    Some(Element::Block(block)) => match item.as_object() {
                        Some(object) => validate_block(block, object, &item_path, diags),
                        None => diags
                            .errors
                            .push(format!("{}: expected a block", item_path)),
                    },
                    Some(Element::String) if !item.is_string() => diags
                        .errors
                        .push(format!("{}: expected a value of type string", item_path)),
                    Some(Element::Int) if !item.is_i64() => diags
                        .errors
                        .push(format!("{}: expected a value of type int", item_path)),
                    _ => {
                        if let Some(validator) = &attr.validate {
                            diags.extend(validator.check(item, &item_path));
                        }
                    }
                }
            }
        }
        _ => {
            if let Some(validator) = &attr.validate {
                diags.extend(validator.check(value, path));
            }
        }
    }
}

fn apply_block_defaults(block: &Block, object: &mut Map<String, Value>) {
    for (name, attr) in &block.attributes {
        if let Some(default) = &attr.default {
            let unset = object.get(*name).map_or(true, Value::is_null);
            if unset {
                object.insert((*name).to_string(), default.clone());
            }
        }
        if let (Some(nested_block), Some(Value::Array(items))) =
            (attr.block(), object.get_mut(*name))
        {
            for item in items.iter_mut() {
                if let Some(nested) = item.as_object_mut() {
                    apply_block_defaults(nested_block, nested);
                }
            }
        }
    }
}

/// String view of a leaf value; null reads as the empty string.
fn leaf(v: &Value) -> Option<&str> {
    match v {
        Value::Null => Some(""),
        v => v.as_str(),
    }
}

fn attribute_values_differ(attr: &Attribute, old: &Value, new: &Value) -> bool {
    if let (Some(f), Some(o), Some(n)) = (attr.diff_suppress, leaf(old), leaf(new)) {
        if f(o, n) {
            return false;
        }
    }
    match (attr.block(), old, new) {
        (Some(block), Value::Array(olds), Value::Array(news)) => {
            olds.len() != news.len()
                || olds
                    .iter()
                    .zip(news.iter())
                    .any(|(o, n)| block_values_differ(block, o, n))
        }
        _ => old != new,
    }
}

fn block_values_differ(block: &Block, old: &Value, new: &Value) -> bool {
    let (Some(olds), Some(news)) = (old.as_object(), new.as_object()) else {
        return old != new;
    };
    block.attributes.iter().any(|(name, attr)| {
        let o = olds.get(*name).unwrap_or(&Value::Null);
        let n = news.get(*name).unwrap_or(&Value::Null);
        // the API owns computed values the configuration leaves unset
        if attr.computed && (!attr.optional || n.is_null()) {
            return false;
        }
        attribute_values_differ(attr, o, n)
    })
}

fn redact_block(block: &Block, object: &mut Map<String, Value>) {
    for (name, attr) in &block.attributes {
        let Some(value) = object.get_mut(*name) else {
            continue;
        };
        if attr.sensitive && is_set(Some(&*value)) {
            *value = Value::String("<sensitive>".to_string());
            continue;
        }
        if let (Some(nested_block), Value::Array(items)) = (attr.block(), value) {
            for item in items.iter_mut() {
                if let Some(nested) = item.as_object_mut() {
                    redact_block(nested_block, nested);
                }
            }
        }
    }
}

fn describe_block(block: &Block) -> Value {
    let mut out = Map::new();
    for (name, attr) in &block.attributes {
        let mut entry = Map::new();
        entry.insert("type".into(), json!(attr.kind.name()));
        for (flag, set) in [
            ("required", attr.required),
            ("optional", attr.optional),
            ("computed", attr.computed),
            ("force_new", attr.force_new),
            ("sensitive", attr.sensitive),
        ] {
            if set {
                entry.insert(flag.into(), json!(true));
            }
        }
        if let Some(default) = &attr.default {
            entry.insert("default".into(), default.clone());
        }
        if let Some(max) = attr.max_items {
            entry.insert("max_items".into(), json!(max));
        }
        if let Some(min) = attr.min_items {
            entry.insert("min_items".into(), json!(min));
        }
        if !attr.conflicts_with.is_empty() {
            entry.insert("conflicts_with".into(), json!(attr.conflicts_with));
        }
        if !attr.exactly_one_of.is_empty() {
            entry.insert("exactly_one_of".into(), json!(attr.exactly_one_of));
        }
        match &attr.elem {
            Some(Element::Block(nested)) => {
                entry.insert("block".into(), describe_block(nested));
            }
            Some(Element::String) => {
                entry.insert("elem".into(), json!("string"));
            }
            Some(Element::Int) => {
                entry.insert("elem".into(), json!("int"));
            }
            None => {}
        }
        out.insert((*name).to_string(), Value::Object(entry));
    }
    Value::Object(out)
}

// ============================================================================
// Diff suppressors
// ============================================================================

/// JSON documents that parse to the same value are equal.
pub fn json_semantically_equal(old: &str, new: &str) -> bool {
    if old == new {
        return true;
    }
    match (
        serde_json::from_str::<Value>(old),
        serde_json::from_str::<Value>(new),
    ) {
        (Ok(o), Ok(n)) => o == n,
        _ => false,
    }
}

/// SSH keys that differ only in line breaks or whitespace runs are equal.
pub fn ssh_key_equal(old: &str, new: &str) -> bool {
    normalize_ssh_key(old) == normalize_ssh_key(new)
}

/// Azure locations compare without case and spaces (`West Europe` == `westeurope`).
pub fn location_equal(old: &str, new: &str) -> bool {
    normalize_location(old) == normalize_location(new)
}

pub fn normalize_location(location: &str) -> String {
    location.replace(' ', "").to_lowercase()
}

/// An explicit `"None"` and an unset value are equal.
pub fn none_is_unset(old: &str, new: &str) -> bool {
    normalize_none(old) == normalize_none(new)
}

fn normalize_none(v: &str) -> &str {
    if v.eq_ignore_ascii_case("None") {
        ""
    } else {
        v
    }
}

/// Resource IDs compare case-insensitively.
pub fn case_insensitive_equal(old: &str, new: &str) -> bool {
    old.eq_ignore_ascii_case(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::values::string_len_between;
    use pretty_assertions::assert_eq;

    fn sample() -> Schema {
        Schema::new(
            "sample",
            Block::new()
                .with("name", Attribute::required_string().force_new())
                .with("comment", Attribute::optional_string().validate(string_len_between(1, 4)))
                .with("mode", Attribute::optional_string().default(json!("Auto")))
                .with("id_out", Attribute::computed_string())
                .with(
                    "inner",
                    Attribute::optional_block(
                        Block::new()
                            .with("a", Attribute::optional_string().exactly_one_of(&["b"]))
                            .with("b", Attribute::optional_string())
                            .with(
                                "doc",
                                Attribute::optional_string().diff_suppress(json_semantically_equal),
                            )
                            .with("secret", Attribute::optional_string().sensitive().conflicts_with(&["b"]))
                            .with("prefix", Attribute::optional_string().computed())
                            .with("stamp", Attribute::computed_string()),
                    ),
                ),
        )
    }

    #[test]
    fn test_required_and_unknown() {
        let diags = sample().validate(&json!({ "bogus": 1 }));
        assert_eq!(diags.errors.len(), 2);
        assert!(diags.errors.iter().any(|e| e.contains("\"name\" is required")));
        assert!(diags.errors.iter().any(|e| e.contains("\"bogus\" is not expected")));
    }

    #[test]
    fn test_computed_only_rejected() {
        let diags = sample().validate(&json!({ "name": "x", "id_out": "y" }));
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].contains("decided automatically"));
    }

    #[test]
    fn test_max_items_and_exactly_one_of() {
        let diags = sample().validate(&json!({
            "name": "x",
            "inner": [{ "a": "1" }, { "b": "2" }]
        }));
        assert_eq!(
            diags.errors,
            vec!["inner: attribute supports 1 item maximum, but config has 2 declared".to_string()]
        );

        let diags = sample().validate(&json!({ "name": "x", "inner": [{ "a": "1", "b": "2" }] }));
        assert_eq!(
            diags.errors,
            vec!["exactly one of `inner.0.a,inner.0.b` must be specified, got 2".to_string()]
        );
    }

    #[test]
    fn test_conflicts_with() {
        let diags = sample().validate(&json!({
            "name": "x",
            "inner": [{ "b": "2", "secret": "s" }]
        }));
        assert_eq!(diags.errors, vec!["inner.0.secret: conflicts with inner.0.b".to_string()]);
    }

    #[test]
    fn test_leaf_validator_and_type() {
        let diags = sample().validate(&json!({ "name": 1, "comment": "too long" }));
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = json!({ "name": "x" });
        sample().apply_defaults(&mut config);
        assert_eq!(config["mode"], json!("Auto"));

        let mut config = json!({ "name": "x", "mode": "Manual" });
        sample().apply_defaults(&mut config);
        assert_eq!(config["mode"], json!("Manual"));
    }

    #[test]
    fn test_values_differ_honours_suppressors() {
        let schema = sample();
        let old = json!([{ "doc": "{\"a\": 1}", "a": "x" }]);
        let new = json!([{ "doc": "{\"a\":1}", "a": "x" }]);
        assert!(!schema.values_differ("inner", &old, &new));

        let changed = json!([{ "doc": "{\"a\":2}", "a": "x" }]);
        assert!(schema.values_differ("inner", &old, &changed));
        assert!(schema.diff_suppressed("inner.0.doc", "{ }", "{}"));
    }

    #[test]
    fn test_values_differ_ignores_api_computed_values() {
        let schema = sample();
        let stored = json!([{ "a": "x", "prefix": "gen-", "stamp": "2024-11-01T10:00:00Z" }]);
        assert!(!schema.values_differ("inner", &stored, &json!([{ "a": "x" }])));
        assert!(schema.values_differ("inner", &stored, &json!([{ "a": "x", "prefix": "web-" }])));
    }

    #[test]
    fn test_lookup_force_new_and_redact() {
        let schema = sample();
        assert!(schema.lookup("inner.0.secret").unwrap().sensitive);
        assert!(schema.lookup("inner.0.missing").is_none());
        assert_eq!(schema.force_new_paths(), vec!["name"]);

        let mut config = json!({ "name": "x", "inner": [{ "secret": "hunter2" }] });
        schema.redact(&mut config);
        assert_eq!(config["inner"][0]["secret"], json!("<sensitive>"));
    }

    #[test]
    fn test_suppressors() {
        assert!(location_equal("West Europe", "westeurope"));
        assert!(ssh_key_equal("ssh-rsa AAAA\nBBBB", "ssh-rsa AAAABBBB"));
        assert!(!json_semantically_equal("{", "{}"));
    }
}
