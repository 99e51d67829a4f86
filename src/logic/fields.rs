use serde_json::Value;

use crate::model::{FieldDescription, FieldType};

pub fn detect_field_type(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Null,
        Value::String(_) => FieldType::String,
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                FieldType::Integer
            } else {
                FieldType::Float
            }
        }
        Value::Bool(_) => FieldType::Boolean,
        Value::Array(_) => FieldType::Array,
        Value::Object(_) => FieldType::Object,
    }
}

/// Derive a draft field-description list from a stored response body.
/// Keys are dotted paths; array-of-object values descend into element 0
/// with an `[0]` segment. Unparsable input yields an empty list, which the
/// caller treats as "nothing to document" rather than an error.
pub fn extract_fields(json_text: &str) -> Vec<FieldDescription> {
    let Ok(parsed) = serde_json::from_str::<Value>(json_text) else {
        return Vec::new();
    };

    let mut fields = Vec::new();

    // A top-level {"data": [...]} listing envelope is documented by its
    // first element rather than the envelope itself.
    if let Value::Object(map) = &parsed {
        if let Some(Value::Array(items)) = map.get("data") {
            if let Some(first) = items.first() {
                collect_fields(first, "", &mut fields);
                return fields;
            }
        }
    }

    collect_fields(&parsed, "", &mut fields);
    fields
}

fn collect_fields(value: &Value, prefix: &str, out: &mut Vec<FieldDescription>) {
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(key, child)| (key.clone(), child)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (index.to_string(), child))
            .collect(),
        _ => return,
    };

    for (key, child) in entries {
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match child {
            Value::Array(items) if items.first().map_or(false, Value::is_object) => {
                out.push(FieldDescription {
                    key: full_key.clone(),
                    field_type: FieldType::Array,
                    description: String::new(),
                });
                collect_fields(&items[0], &format!("{}[0]", full_key), out);
            }
            Value::Object(_) => {
                out.push(FieldDescription {
                    key: full_key.clone(),
                    field_type: FieldType::Object,
                    description: String::new(),
                });
                collect_fields(child, &full_key, out);
            }
            other => out.push(FieldDescription {
                key: full_key,
                field_type: detect_field_type(other),
                description: String::new(),
            }),
        }
    }
}

/// Turn the raw text of a query-parameter example into a typed value:
/// booleans and plain decimal numerals are promoted, `{...}`/`[...]` are
/// parsed as JSON when valid, everything else stays a string.
pub fn infer_param_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }
    if trimmed == "true" {
        return Value::Bool(true);
    }
    if trimmed == "false" {
        return Value::Bool(false);
    }
    if is_plain_decimal(trimmed) {
        if let Ok(number) = serde_json::from_str::<serde_json::Number>(trimmed) {
            return Value::Number(number);
        }
    }
    if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

// Matches an optional minus, digits, and at most one fractional part.
// Exponents and leading dots deliberately stay strings.
fn is_plain_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let integral = parts.next().unwrap_or("");
    let fractional = parts.next();

    if integral.is_empty() || !integral.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match fractional {
        None => true,
        Some(fraction) => !fraction.is_empty() && fraction.chars().all(|c| c.is_ascii_digit()),
    }
}
