//! Field declarations and the checks behind them

use chrono::DateTime;
use serde_json::{Map, Value, json};

use super::FieldError;

/// Shape and constraints of a single value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String {
        min_len: Option<usize>,
        max_len: Option<usize>,
        trim: bool,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Enum(&'static [&'static str]),
    /// RFC 3339 timestamp in UTC: uppercase `T` separator, `Z` suffix
    DateTime,
    Object(Vec<FieldSpec>),
    Array(Box<FieldKind>),
}

/// A named field inside an object schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    fn with_kind(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description: "",
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::with_kind(
            name,
            FieldKind::String {
                min_len: None,
                max_len: None,
                trim: false,
            },
        )
    }

    pub fn number(name: &'static str) -> Self {
        Self::with_kind(
            name,
            FieldKind::Number {
                min: None,
                max: None,
            },
        )
    }

    pub fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::with_kind(name, FieldKind::Enum(values))
    }

    pub fn datetime(name: &'static str) -> Self {
        Self::with_kind(name, FieldKind::DateTime)
    }

    pub fn object(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self::with_kind(name, FieldKind::Object(fields))
    }

    pub fn array(name: &'static str, items: FieldKind) -> Self {
        Self::with_kind(name, FieldKind::Array(Box::new(items)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        if let FieldKind::String { min_len, .. } = &mut self.kind {
            *min_len = Some(len);
        }
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        if let FieldKind::String { max_len, .. } = &mut self.kind {
            *max_len = Some(len);
        }
        self
    }

    pub fn trim(mut self) -> Self {
        if let FieldKind::String { trim, .. } = &mut self.kind {
            *trim = true;
        }
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        if let FieldKind::Number { min, .. } = &mut self.kind {
            *min = Some(value);
        }
        self
    }

    pub fn range(mut self, low: f64, high: f64) -> Self {
        if let FieldKind::Number { min, max, .. } = &mut self.kind {
            *min = Some(low);
            *max = Some(high);
        }
        self
    }

}

pub(super) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// RFC 3339 also allows a space or lowercase `t` between date and time
fn is_utc_datetime(s: &str) -> bool {
    s.as_bytes().get(10) == Some(&b'T') && s.ends_with('Z') && DateTime::parse_from_rfc3339(s).is_ok()
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

pub(super) fn check_fields(
    fields: &[FieldSpec],
    object: &Map<String, Value>,
    prefix: &str,
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for spec in fields {
        let path = join_path(prefix, spec.name);
        match object.get(spec.name) {
            Some(value) => {
                if let Some(checked) = check_value(&spec.kind, value, &path, errors) {
                    out.insert(spec.name.to_string(), checked);
                }
            }
            None => {
                if let Some(default) = &spec.default {
                    out.insert(spec.name.to_string(), default.clone());
                } else if spec.required {
                    errors.push(FieldError::new(path, "Required"));
                }
            }
        }
    }

    out
}

fn check_value(kind: &FieldKind, value: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<Value> {
    let mismatch = |expected: &str| FieldError::new(path, format!("Expected {expected}, received {}", type_name(value)));

    match kind {
        FieldKind::String { min_len, max_len, trim } => {
            let Some(s) = value.as_str() else {
                errors.push(mismatch("string"));
                return None;
            };
            // Lengths apply to the raw input; trimming only shapes the output
            let len = s.chars().count();

            let mut ok = true;
            if let Some(min) = min_len
                && len < *min
            {
                errors.push(FieldError::new(path, format!("String must contain at least {min} character(s)")));
                ok = false;
            }
            if let Some(max) = max_len
                && len > *max
            {
                errors.push(FieldError::new(path, format!("String must contain at most {max} character(s)")));
                ok = false;
            }
            let s = if *trim { s.trim() } else { s };
            ok.then(|| Value::String(s.to_string()))
        }
        FieldKind::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                errors.push(mismatch("number"));
                return None;
            };

            let mut ok = true;
            if let Some(min) = min
                && n < *min
            {
                errors.push(FieldError::new(path, format!("Number must be greater than or equal to {min}")));
                ok = false;
            }
            if let Some(max) = max
                && n > *max
            {
                errors.push(FieldError::new(path, format!("Number must be less than or equal to {max}")));
                ok = false;
            }
            ok.then(|| value.clone())
        }
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Some(value.clone()),
            _ => {
                let expected = allowed.iter().map(|v| format!("'{v}'")).collect::<Vec<_>>().join(" | ");
                let received = match value {
                    Value::String(s) => format!("'{s}'"),
                    other => type_name(other).to_string(),
                };
                errors.push(FieldError::new(
                    path,
                    format!("Invalid enum value. Expected {expected}, received {received}"),
                ));
                None
            }
        },
        FieldKind::DateTime => match value.as_str() {
            Some(s) if is_utc_datetime(s) => Some(value.clone()),
            Some(_) => {
                errors.push(FieldError::new(path, "Invalid datetime"));
                None
            }
            None => {
                errors.push(mismatch("string"));
                None
            }
        },
        FieldKind::Object(fields) => {
            let Some(object) = value.as_object() else {
                errors.push(mismatch("object"));
                return None;
            };
            let before = errors.len();
            let checked = check_fields(fields, object, path, errors);
            (errors.len() == before).then_some(Value::Object(checked))
        }
        FieldKind::Array(items) => {
            let Some(array) = value.as_array() else {
                errors.push(mismatch("array"));
                return None;
            };
            let before = errors.len();
            let checked: Vec<Value> = array
                .iter()
                .enumerate()
                .filter_map(|(i, item)| check_value(items, item, &join_path(path, &i.to_string()), errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(checked))
        }
    }
}

pub(super) fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in fields {
        let mut schema = kind_schema(&spec.kind);
        if !spec.description.is_empty() {
            schema["description"] = json!(spec.description);
        }
        if let Some(default) = &spec.default {
            schema["default"] = default.clone();
        }
        if spec.required {
            required.push(json!(spec.name));
        }
        properties.insert(spec.name.to_string(), schema);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::String { min_len, max_len, .. } => {
            let mut schema = json!({"type": "string"});
            if let Some(min) = min_len {
                schema["minLength"] = json!(min);
            }
            if let Some(max) = max_len {
                schema["maxLength"] = json!(max);
            }
            schema
        }
        FieldKind::Number { min, max } => {
            let mut schema = json!({"type": "number"});
            if let Some(min) = min {
                schema["minimum"] = json!(min);
            }
            if let Some(max) = max {
                schema["maximum"] = json!(max);
            }
            schema
        }
        FieldKind::Enum(values) => json!({"type": "string", "enum": values}),
        FieldKind::DateTime => json!({"type": "string", "format": "date-time"}),
        FieldKind::Object(fields) => object_schema(fields),
        FieldKind::Array(items) => json!({"type": "array", "items": kind_schema(items)}),
    }
}
