//! Declarative input schemas for tool arguments
//!
//! A [`ToolSchema`] is a list of [`FieldSpec`]s. The same declaration is used
//! twice: to validate incoming arguments (collecting every violation, not just
//! the first) and to render the JSON Schema advertised to MCP clients.

mod field;
mod tools;

pub use field::{FieldKind, FieldSpec};
pub use tools::{SchemaRegistry, schema_for};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// One violation found while validating arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path to the offending value, e.g. `filter.predicates.0.value`
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Arguments that passed validation, with defaults filled in and unknown keys dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Explicit workspace id, if the caller supplied one
    pub fn workspace_id(&self) -> Option<&str> {
        self.get_str("workspaceId")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Convert into a typed input struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

/// Schema for one tool's arguments
#[derive(Debug, Clone, Default)]
pub struct ToolSchema {
    fields: Vec<FieldSpec>,
}

impl ToolSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate raw arguments; absent or null arguments count as `{}`
    pub fn validate(&self, raw: Option<&Value>) -> Result<ValidatedArgs, Vec<FieldError>> {
        debug!(fields = self.fields.len(), "ToolSchema::validate: called");
        let empty = Map::new();
        let object = match raw {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(vec![FieldError::new(
                    "",
                    format!("Expected object, received {}", field::type_name(other)),
                )]);
            }
        };

        let mut errors = Vec::new();
        let validated = field::check_fields(&self.fields, object, "", &mut errors);

        if errors.is_empty() {
            Ok(ValidatedArgs(validated))
        } else {
            debug!(count = errors.len(), "ToolSchema::validate: rejected");
            Err(errors)
        }
    }

    /// JSON Schema advertised in `tools/list`
    pub fn json_schema(&self) -> Value {
        field::object_schema(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ToolSchema {
        ToolSchema::new(vec![
            FieldSpec::string("name").min_len(1).max_len(5).trim().required(),
            FieldSpec::number("limit").range(1.0, 100.0).default_value(json!(10)),
            FieldSpec::enumeration("order", &["asc", "dsc"]),
            FieldSpec::datetime("due"),
        ])
    }

    #[test]
    fn test_valid_input_gets_defaults() {
        let args = sample().validate(Some(&json!({"name": "abc"}))).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(10)));
        assert_eq!(args.get_str("name"), Some("abc"));
        assert!(args.get("order").is_none());
    }

    #[test]
    fn test_null_arguments_treated_as_empty() {
        let errors = sample().validate(None).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", "Required")]);

        let errors = sample().validate(Some(&Value::Null)).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_object_arguments_rejected_at_root() {
        let errors = sample().validate(Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("", "Expected object, received array")]);
    }

    #[test]
    fn test_all_errors_reported() {
        let errors = sample()
            .validate(Some(&json!({
                "name": "toolong",
                "limit": 500,
                "order": "up",
                "due": "tomorrow"
            })))
            .unwrap_err();

        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "limit", "order", "due"]);
        assert_eq!(errors[0].message, "String must contain at most 5 character(s)");
        assert_eq!(errors[1].message, "Number must be less than or equal to 100");
        assert_eq!(errors[2].message, "Invalid enum value. Expected 'asc' | 'dsc', received 'up'");
        assert_eq!(errors[3].message, "Invalid datetime");
    }

    #[test]
    fn test_unknown_keys_dropped() {
        let args = sample().validate(Some(&json!({"name": "a", "extra": true}))).unwrap();
        assert!(args.get("extra").is_none());
    }

    #[test]
    fn test_lengths_checked_on_untrimmed_input() {
        let args = sample().validate(Some(&json!({"name": "   "}))).unwrap();
        assert_eq!(args.get_str("name"), Some(""));

        let args = sample().validate(Some(&json!({"name": " ab  "}))).unwrap();
        assert_eq!(args.get_str("name"), Some("ab"));

        let errors = sample().validate(Some(&json!({"name": "  abc  "}))).unwrap_err();
        assert_eq!(errors[0].message, "String must contain at most 5 character(s)");
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(serde::Deserialize)]
        struct Input {
            name: String,
            limit: u32,
        }

        let args = sample().validate(Some(&json!({"name": "x"}))).unwrap();
        let input: Input = args.deserialize().unwrap();
        assert_eq!(input.name, "x");
        assert_eq!(input.limit, 10);
    }

    #[test]
    fn test_json_schema_lists_required() {
        let schema = sample().json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["name"]));
        assert_eq!(schema["properties"]["limit"]["default"], json!(10));
        assert_eq!(schema["properties"]["order"]["enum"], json!(["asc", "dsc"]));
    }

    #[test]
    fn test_field_error_display() {
        assert_eq!(FieldError::new("a.b", "Required").to_string(), "a.b: Required");
    }
}
