//! Attribute schemas and the payload differ.
//!
//! A view type declares which props reach the native side. The differ turns
//! props into the initial creation payload and computes the changed subset
//! between two prop maps. Props outside the schema never leave this layer.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::props::{Payload, Props, CHILDREN_PROP};

/// Returns `true` when the two values should be treated as different.
pub type DiffFn = fn(&Value, &Value) -> bool;

/// Converts a prop value into the form the native side expects.
pub type ProcessFn = fn(&Value) -> Value;

#[derive(Clone)]
pub enum AttributeConfig {
    /// Compared by value equality and sent unchanged.
    Plain,
    /// Compared and converted with the supplied functions.
    Custom {
        diff: Option<DiffFn>,
        process: Option<ProcessFn>,
    },
    /// An object (or array of objects) whose entries are flattened into the
    /// top-level payload, as style props are.
    Nested(ValidAttributes),
}

impl fmt::Debug for AttributeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeConfig::Plain => f.write_str("Plain"),
            AttributeConfig::Custom { diff, process } => f
                .debug_struct("Custom")
                .field("diff", &diff.is_some())
                .field("process", &process.is_some())
                .finish(),
            AttributeConfig::Nested(nested) => f.debug_tuple("Nested").field(nested).finish(),
        }
    }
}

/// Ordered set of attribute names a view type accepts.
#[derive(Clone, Debug, Default)]
pub struct ValidAttributes {
    attributes: IndexMap<String, AttributeConfig>,
}

impl ValidAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema where every listed attribute is [`AttributeConfig::Plain`].
    pub fn plain<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes = names
            .into_iter()
            .map(|name| (name.into(), AttributeConfig::Plain))
            .collect();
        Self { attributes }
    }

    pub fn with(mut self, name: impl Into<String>, config: AttributeConfig) -> Self {
        self.insert(name, config);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, config: AttributeConfig) {
        self.attributes.insert(name.into(), config);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeConfig> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Computes property payloads against a view type's schema.
pub trait AttributeDiffer {
    /// Payload for a freshly created view; `None` when no attribute is set.
    fn create(&self, props: &Props, valid: &ValidAttributes) -> Option<Payload>;

    /// Changed attributes between `old` and `new`; `None` when nothing changed.
    fn diff(&self, old: &Props, new: &Props, valid: &ValidAttributes) -> Option<Payload>;
}

/// Default differ.
///
/// Removed attributes are sent as `null` so the native side resets them.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadDiffer;

impl AttributeDiffer for PayloadDiffer {
    fn create(&self, props: &Props, valid: &ValidAttributes) -> Option<Payload> {
        let mut payload = Payload::new();
        add_properties(&mut payload, props, valid);
        non_empty(payload)
    }

    fn diff(&self, old: &Props, new: &Props, valid: &ValidAttributes) -> Option<Payload> {
        let mut payload = Payload::new();
        diff_properties(&mut payload, old, new, valid);
        non_empty(payload)
    }
}

fn non_empty(payload: Payload) -> Option<Payload> {
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

fn add_properties(payload: &mut Payload, props: &Props, valid: &ValidAttributes) {
    for (name, value) in props {
        if name == CHILDREN_PROP {
            continue;
        }
        match valid.get(name) {
            None => {}
            Some(AttributeConfig::Plain) => {
                payload.insert(name.clone(), value.clone());
            }
            Some(AttributeConfig::Custom { process, .. }) => {
                payload.insert(name.clone(), processed(*process, value));
            }
            Some(AttributeConfig::Nested(nested)) => {
                add_properties(payload, &flatten_nested(Some(value)), nested);
            }
        }
    }
}

fn diff_properties(payload: &mut Payload, old: &Props, new: &Props, valid: &ValidAttributes) {
    for (name, next) in new {
        if name == CHILDREN_PROP {
            continue;
        }
        let prev = old.get(name);
        match valid.get(name) {
            None => {}
            Some(AttributeConfig::Plain) => {
                if prev != Some(next) {
                    payload.insert(name.clone(), next.clone());
                }
            }
            Some(AttributeConfig::Custom { diff, process }) => {
                let changed = match (prev, diff) {
                    (None, _) => true,
                    (Some(prev), Some(diff)) => diff(prev, next),
                    (Some(prev), None) => prev != next,
                };
                if changed {
                    payload.insert(name.clone(), processed(*process, next));
                }
            }
            Some(AttributeConfig::Nested(nested)) => {
                let prev = flatten_nested(prev);
                let next = flatten_nested(Some(next));
                diff_properties(payload, &prev, &next, nested);
            }
        }
    }

    for (name, prev) in old {
        if name == CHILDREN_PROP || new.contains_key(name) {
            continue;
        }
        match valid.get(name) {
            None => {}
            Some(AttributeConfig::Nested(nested)) => {
                let prev = flatten_nested(Some(prev));
                diff_properties(payload, &prev, &Props::new(), nested);
            }
            Some(_) => {
                payload.insert(name.clone(), Value::Null);
            }
        }
    }
}

fn processed(process: Option<ProcessFn>, value: &Value) -> Value {
    match process {
        Some(process) => process(value),
        None => value.clone(),
    }
}

/// Merges an object, or an arbitrarily nested array of objects, into one map.
/// Later entries win; other values (`null`, `false`) contribute nothing.
fn flatten_nested(value: Option<&Value>) -> Props {
    let mut flat = Props::new();
    if let Some(value) = value {
        collect_nested(&mut flat, value);
    }
    flat
}

fn collect_nested(flat: &mut Props, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                flat.insert(key.clone(), entry.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_nested(flat, item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
