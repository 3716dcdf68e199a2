//! View type schemas.
//!
//! A [`ViewConfig`] is registered once per native view class. The class name
//! is the only key: registration returns a [`ViewType`] carrying it, and
//! element types handed to the bridge must use that same name.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::attributes::ValidAttributes;
use crate::collections::map::HashMap;
use crate::error::BridgeError;
use crate::props::Props;

/// Name of a registered native view class.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewType(Arc<str>);

impl ViewType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ViewType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ViewType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Advisory check for a single prop.
#[derive(Clone, Copy)]
pub struct PropValidator {
    pub prop: &'static str,
    pub expected: &'static str,
    pub check: fn(&Value) -> bool,
}

impl PropValidator {
    pub fn new(prop: &'static str, expected: &'static str, check: fn(&Value) -> bool) -> Self {
        Self {
            prop,
            expected,
            check,
        }
    }

    pub fn string(prop: &'static str) -> Self {
        Self::new(prop, "a string", Value::is_string)
    }

    pub fn number(prop: &'static str) -> Self {
        Self::new(prop, "a number", Value::is_number)
    }

    pub fn boolean(prop: &'static str) -> Self {
        Self::new(prop, "a boolean", Value::is_boolean)
    }
}

impl fmt::Debug for PropValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropValidator")
            .field("prop", &self.prop)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropViolation {
    pub prop: String,
    pub expected: String,
}

/// Schema of one native view class.
#[derive(Clone, Debug)]
pub struct ViewConfig {
    pub ui_view_class_name: ViewType,
    pub valid_attributes: ValidAttributes,
    pub prop_validators: Vec<PropValidator>,
}

impl ViewConfig {
    pub fn new(ui_view_class_name: impl Into<Arc<str>>) -> Self {
        Self {
            ui_view_class_name: ViewType::new(ui_view_class_name),
            valid_attributes: ValidAttributes::new(),
            prop_validators: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, valid_attributes: ValidAttributes) -> Self {
        self.valid_attributes = valid_attributes;
        self
    }

    pub fn with_validator(mut self, validator: PropValidator) -> Self {
        self.prop_validators.push(validator);
        self
    }

    pub fn view_type(&self) -> &ViewType {
        &self.ui_view_class_name
    }

    /// Runs the advisory validators. Absent props are not checked.
    pub fn validate(&self, props: &Props) -> Vec<PropViolation> {
        self.prop_validators
            .iter()
            .filter(|validator| {
                props
                    .get(validator.prop)
                    .is_some_and(|value| !(validator.check)(value))
            })
            .map(|validator| PropViolation {
                prop: validator.prop.to_owned(),
                expected: validator.expected.to_owned(),
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ViewConfigRegistry {
    configs: HashMap<ViewType, ViewConfig>,
}

impl ViewConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the schema for its class name.
    pub fn register(&mut self, config: ViewConfig) -> ViewType {
        let view_type = config.ui_view_class_name.clone();
        if self.configs.insert(view_type.clone(), config).is_some() {
            log::trace!("replaced view config for {view_type}");
        }
        view_type
    }

    pub fn resolve(&self, name: &str) -> Option<&ViewConfig> {
        self.configs.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ViewConfig, BridgeError> {
        self.resolve(name).ok_or_else(|| BridgeError::TypeNotRegistered {
            type_name: name.to_owned(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_is_keyed_by_class_name_and_last_write_wins() {
        let mut registry = ViewConfigRegistry::new();
        let first = registry.register(
            ViewConfig::new("RCTView").with_attributes(ValidAttributes::plain(["color"])),
        );
        let second = registry.register(
            ViewConfig::new("RCTView").with_attributes(ValidAttributes::plain(["color", "flex"])),
        );
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        let resolved = registry.resolve("RCTView").expect("registered");
        assert!(resolved.valid_attributes.contains("flex"));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = ViewConfigRegistry::new();
        assert_eq!(
            registry.require("Box").map(|_| ()),
            Err(BridgeError::TypeNotRegistered {
                type_name: "Box".to_owned()
            })
        );
    }

    #[test]
    fn validators_only_flag_present_mismatches() {
        let config = ViewConfig::new("RCTText")
            .with_validator(PropValidator::number("numberOfLines"))
            .with_validator(PropValidator::boolean("selectable"));
        let props = match json!({"numberOfLines": "two"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(
            config.validate(&props),
            vec![PropViolation {
                prop: "numberOfLines".to_owned(),
                expected: "a number".to_owned(),
            }]
        );
    }
}
