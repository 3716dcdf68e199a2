//! Prop and payload maps exchanged with the native side.

use serde_json::Value;

/// Props as handed over by the reconciler for one element.
pub type Props = serde_json::Map<String, Value>;

/// Serializable property payload sent along with native commands.
pub type Payload = serde_json::Map<String, Value>;

pub const CHILDREN_PROP: &str = "children";
pub const TEXT_PROP: &str = "text";

/// Renders a prop value the way it is shown as text on the native side.
///
/// Strings are used as-is, every other value uses its JSON spelling.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Returns the text of scalar `children` (a string or a number), if any.
pub fn scalar_text_children(props: &Props) -> Option<String> {
    match props.get(CHILDREN_PROP)? {
        value @ (Value::String(_) | Value::Number(_)) => Some(stringify(value)),
        _ => None,
    }
}

pub fn text_payload(text: impl Into<String>) -> Payload {
    let mut payload = Payload::new();
    payload.insert(TEXT_PROP.to_owned(), Value::String(text.into()));
    payload
}
