//! Purpose: Structural classification of raw JSON payloads before decoding.
//! Exports: `Shape`, `classify`.
//! Role: Guard layer that turns tag/payload disagreements into handled skips.
//! Invariants: Classification is pure and total; every `Value` maps to a `Shape`.
use serde_json::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    String,
    List,
    Map,
    Other,
}

impl Shape {
    pub fn label(self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::List => "list",
            Shape::Map => "map",
            Shape::Other => "other",
        }
    }
}

pub fn classify(value: &Value) -> Shape {
    match value {
        Value::String(_) => Shape::String,
        Value::Array(_) => Shape::List,
        Value::Object(_) => Shape::Map,
        _ => Shape::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::{Shape, classify};
    use serde_json::json;

    #[test]
    fn classifies_each_structural_kind() {
        assert_eq!(classify(&json!("text")), Shape::String);
        assert_eq!(classify(&json!(["a"])), Shape::List);
        assert_eq!(classify(&json!({"a": 1})), Shape::Map);
        assert_eq!(classify(&json!(5)), Shape::Other);
        assert_eq!(classify(&json!(true)), Shape::Other);
        assert_eq!(classify(&json!(null)), Shape::Other);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Shape::String.label(), "string");
        assert_eq!(Shape::List.label(), "list");
        assert_eq!(Shape::Map.label(), "map");
        assert_eq!(Shape::Other.label(), "other");
    }
}
