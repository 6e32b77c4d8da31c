//! Boundary validation for JSON request bodies.
//!
//! Bodies are parsed into a [`serde_json::Value`] first and then checked field
//! by field, so a single response can report every problem at once:
//!
//! ```json
//! { "formErrors": [], "fieldErrors": { "name": ["Required"] } }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("validation failed")]
pub struct ValidationErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn form(message: impl Into<String>) -> Self {
        ValidationErrors {
            form_errors: vec![message.into()],
            field_errors: BTreeMap::new(),
        }
    }

    pub fn add_field(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

/// Parses a request body that must be a JSON object.
pub fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, ValidationErrors> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationErrors::form(format!("Invalid JSON body: {e}")))?;
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ValidationErrors::form(format!(
            "Expected object, received {}",
            json_type_name(&other)
        ))),
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a missing member is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Field-by-field reader over a JSON object that accumulates errors.
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    pub fn new(object: &'a Map<String, Value>) -> Self {
        Fields {
            object,
            errors: ValidationErrors::default(),
        }
    }

    fn present(&mut self, name: &str, presence: Presence) -> Option<&'a Value> {
        let value = self.object.get(name);
        if value.is_none() && presence == Presence::Required {
            self.errors.add_field(name, "Required");
        }
        value
    }

    fn mismatch(&mut self, name: &str, expected: &str, value: &Value) {
        self.errors.add_field(
            name,
            format!("Expected {expected}, received {}", json_type_name(value)),
        );
    }

    pub fn string(&mut self, name: &str, presence: Presence) -> Option<&'a str> {
        match self.present(name, presence)? {
            Value::String(s) => Some(s.as_str()),
            other => {
                self.mismatch(name, "string", other);
                None
            }
        }
    }

    pub fn non_empty_string(&mut self, name: &str, presence: Presence) -> Option<String> {
        let value = self.string(name, presence)?;
        if value.is_empty() {
            self.errors
                .add_field(name, "String must contain at least 1 character(s)");
            return None;
        }
        Some(value.to_string())
    }

    pub fn number(&mut self, name: &str, presence: Presence) -> Option<f64> {
        match self.present(name, presence)? {
            Value::Number(n) => n.as_f64(),
            other => {
                self.mismatch(name, "number", other);
                None
            }
        }
    }

    pub fn positive_number(&mut self, name: &str, presence: Presence) -> Option<f64> {
        let value = self.number(name, presence)?;
        if value <= 0.0 {
            self.errors.add_field(name, "Number must be greater than 0");
            return None;
        }
        Some(value)
    }

    /// Accepts a number or a string holding a finite number.
    pub fn coerced_number(&mut self, name: &str, presence: Presence) -> Option<f64> {
        match self.present(name, presence)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    self.errors
                        .add_field(name, format!("Expected number, received \"{s}\""));
                    None
                }
            },
            other => {
                self.mismatch(name, "number", other);
                None
            }
        }
    }

    pub fn one_of(&mut self, name: &str, allowed: &[&str], presence: Presence) -> Option<&'a str> {
        let value = self.string(name, presence)?;
        if !allowed.contains(&value) {
            let expected = allowed
                .iter()
                .map(|a| format!("'{a}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            self.errors.add_field(
                name,
                format!("Invalid enum value. Expected {expected}, received '{value}'"),
            );
            return None;
        }
        Some(value)
    }

    /// Reads a member that may be explicitly `null`.
    /// Returns `None` when absent, `Some(None)` for `null`.
    pub fn nullable_string(&mut self, name: &str) -> Option<Option<&'a str>> {
        match self.object.get(name)? {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s.as_str())),
            other => {
                self.mismatch(name, "string", other);
                None
            }
        }
    }

    pub fn reject_unknown(&mut self, known: &[&str]) {
        let unknown: Vec<&String> = self
            .object
            .keys()
            .filter(|key| !known.contains(&key.as_str()))
            .collect();
        for key in unknown {
            self.errors.add_field(key, "Unrecognized key");
        }
    }

    pub fn error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add_field(name, message);
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(o) => o,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_parse_json_object() {
        assert!(parse_json_object(br#"{"a":1}"#).is_ok());

        let err = parse_json_object(b"[1,2]").unwrap_err();
        assert_eq!(err.form_errors, vec!["Expected object, received array"]);

        let err = parse_json_object(b"{not json").unwrap_err();
        assert!(err.form_errors[0].starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_collects_all_errors() {
        let body = object(json!({"name": "", "tons": -1, "kind": "X", "extra": true}));
        let mut fields = Fields::new(&body);
        assert_eq!(fields.non_empty_string("name", Presence::Required), None);
        assert_eq!(fields.non_empty_string("location", Presence::Required), None);
        assert_eq!(fields.positive_number("tons", Presence::Required), None);
        assert_eq!(fields.one_of("kind", &["A", "B"], Presence::Optional), None);
        fields.reject_unknown(&["name", "location", "tons", "kind"]);

        let errors = fields.finish().unwrap_err();
        assert_eq!(
            errors.field_errors["name"],
            vec!["String must contain at least 1 character(s)"]
        );
        assert_eq!(errors.field_errors["location"], vec!["Required"]);
        assert_eq!(
            errors.field_errors["tons"],
            vec!["Number must be greater than 0"]
        );
        assert_eq!(
            errors.field_errors["kind"],
            vec!["Invalid enum value. Expected 'A' | 'B', received 'X'"]
        );
        assert_eq!(errors.field_errors["extra"], vec!["Unrecognized key"]);
    }

    #[test]
    fn test_type_mismatch_and_optional() {
        let body = object(json!({"hectares": "big", "description": null}));
        let mut fields = Fields::new(&body);
        assert_eq!(fields.number("hectares", Presence::Optional), None);
        assert_eq!(fields.string("description", Presence::Optional), None);
        assert_eq!(fields.string("certifier", Presence::Optional), None);

        let errors = fields.finish().unwrap_err();
        assert_eq!(
            errors.field_errors["hectares"],
            vec!["Expected number, received string"]
        );
        assert_eq!(
            errors.field_errors["description"],
            vec!["Expected string, received null"]
        );
        assert!(!errors.field_errors.contains_key("certifier"));
    }

    #[test]
    fn test_coerced_number() {
        let body = object(json!({"a": "12.5", "b": 3, "c": "abc"}));
        let mut fields = Fields::new(&body);
        assert_eq!(fields.coerced_number("a", Presence::Required), Some(12.5));
        assert_eq!(fields.coerced_number("b", Presence::Required), Some(3.0));
        assert_eq!(fields.coerced_number("c", Presence::Required), None);
        assert!(fields.finish().is_err());
    }

    #[test]
    fn test_nullable_string() {
        let body = object(json!({"processedAt": null, "other": "x"}));
        let mut fields = Fields::new(&body);
        assert_eq!(fields.nullable_string("processedAt"), Some(None));
        assert_eq!(fields.nullable_string("other"), Some(Some("x")));
        assert_eq!(fields.nullable_string("missing"), None);
        assert!(fields.finish().is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let mut errors = ValidationErrors::default();
        errors.add_field("name", "Required");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"formErrors": [], "fieldErrors": {"name": ["Required"]}})
        );
    }
}
