//! Argument validation against tool input schemas.
//!
//! Covers the schema subset the registry uses: property `type`, `required`,
//! `enum`, `minimum`/`maximum`, `minLength`, array `items.type` and
//! `additionalProperties: false`. Runs before any handler, so a rejected
//! call never reaches a remote API.

use bridge_core::{Error, Result};
use serde_json::{Map, Value};

/// Validate tool arguments against the tool's input schema.
pub fn validate(tool: &str, schema: &Value, args: &Value) -> Result<()> {
    let args = args
        .as_object()
        .ok_or_else(|| invalid(tool, "arguments must be a JSON object".to_string()))?;
    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if args.get(field).map_or(true, Value::is_null) {
                return Err(invalid(tool, format!("missing required field '{}'", field)));
            }
        }
    }

    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (field, value) in args {
        let Some(property) = properties.get(field) else {
            if closed {
                return Err(invalid(tool, format!("unknown field '{}'", field)));
            }
            continue;
        };

        // Explicit null on an optional field means "not given"
        if value.is_null() {
            continue;
        }

        check_property(field, property, value).map_err(|msg| invalid(tool, msg))?;
    }

    Ok(())
}

fn invalid(tool: &str, message: String) -> Error {
    Error::Validation(format!("{}: {}", tool, message))
}

fn check_property(field: &str, schema: &Value, value: &Value) -> std::result::Result<(), String> {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !has_type(value, expected) {
            return Err(format!(
                "field '{}' must be {} {}, got {}",
                field,
                article(expected),
                expected,
                type_name(value)
            ));
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(format!(
                "field '{}' must be one of {}",
                field,
                options.join(", ")
            ));
        }
    }

    if let Some(number) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if number < min {
                return Err(format!("field '{}' must be >= {}", field, min));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if number > max {
                return Err(format!("field '{}' must be <= {}", field, max));
            }
        }
    }

    if let (Some(text), Some(min_len)) = (
        value.as_str(),
        schema.get("minLength").and_then(Value::as_u64),
    ) {
        if (text.trim().chars().count() as u64) < min_len {
            return Err(format!("field '{}' must not be empty", field));
        }
    }

    if let (Some(items), Some(item_type)) = (
        value.as_array(),
        schema
            .get("items")
            .and_then(|i| i.get("type"))
            .and_then(Value::as_str),
    ) {
        if let Some((index, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| !has_type(item, item_type))
        {
            return Err(format!(
                "field '{}[{}]' must be {} {}, got {}",
                field,
                index,
                article(item_type),
                item_type,
                type_name(item)
            ));
        }
    }

    Ok(())
}

fn has_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn article(type_name: &str) -> &'static str {
    if type_name.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{self, CREATE_ISSUE, GITHUB_UPDATE_PR, LIST_ISSUES};
    use serde_json::json;

    fn schema_of(name: &str) -> Value {
        tools::registry(true)
            .into_iter()
            .find(|t| t.name == name)
            .unwrap()
            .input_schema
    }

    fn message(result: Result<()>) -> String {
        match result.unwrap_err() {
            Error::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_create_issue() {
        let args = json!({
            "title": "Crash on save",
            "teamId": "team-1",
            "priority": 2,
            "labelIds": ["l1", "l2"]
        });
        assert!(validate(CREATE_ISSUE, &schema_of(CREATE_ISSUE), &args).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let msg = message(validate(
            CREATE_ISSUE,
            &schema_of(CREATE_ISSUE),
            &json!({"teamId": "team-1"}),
        ));
        assert_eq!(msg, "create-issue: missing required field 'title'");
    }

    #[test]
    fn test_null_required_field_counts_as_missing() {
        let msg = message(validate(
            CREATE_ISSUE,
            &schema_of(CREATE_ISSUE),
            &json!({"title": null, "teamId": "team-1"}),
        ));
        assert!(msg.contains("'title'"));
    }

    #[test]
    fn test_blank_required_string_rejected() {
        let msg = message(validate(
            CREATE_ISSUE,
            &schema_of(CREATE_ISSUE),
            &json!({"title": "   ", "teamId": "team-1"}),
        ));
        assert!(msg.contains("'title' must not be empty"));
    }

    #[test]
    fn test_priority_out_of_range() {
        let msg = message(validate(
            CREATE_ISSUE,
            &schema_of(CREATE_ISSUE),
            &json!({"title": "t", "teamId": "team-1", "priority": 5}),
        ));
        assert!(msg.contains("'priority' must be <= 4"));
    }

    #[test]
    fn test_wrong_type() {
        let msg = message(validate(
            LIST_ISSUES,
            &schema_of(LIST_ISSUES),
            &json!({"limit": "ten"}),
        ));
        assert_eq!(
            msg,
            "list-issues: field 'limit' must be an integer, got string"
        );

        let msg = message(validate(
            LIST_ISSUES,
            &schema_of(LIST_ISSUES),
            &json!({"limit": 2.5}),
        ));
        assert!(msg.contains("got number"));
    }

    #[test]
    fn test_limit_bounds() {
        let schema = schema_of(LIST_ISSUES);
        assert!(validate(LIST_ISSUES, &schema, &json!({"limit": 0})).is_err());
        assert!(validate(LIST_ISSUES, &schema, &json!({"limit": 251})).is_err());
        assert!(validate(LIST_ISSUES, &schema, &json!({"limit": 250})).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let msg = message(validate(
            LIST_ISSUES,
            &schema_of(LIST_ISSUES),
            &json!({"team": "team-1"}),
        ));
        assert_eq!(msg, "list-issues: unknown field 'team'");
    }

    #[test]
    fn test_enum_checked() {
        let schema = schema_of(GITHUB_UPDATE_PR);
        assert!(validate(
            GITHUB_UPDATE_PR,
            &schema,
            &json!({"pullNumber": 1, "state": "closed"})
        )
        .is_ok());
        let msg = message(validate(
            GITHUB_UPDATE_PR,
            &schema,
            &json!({"pullNumber": 1, "state": "merged"}),
        ));
        assert!(msg.contains("must be one of \"open\", \"closed\""));
    }

    #[test]
    fn test_array_item_types() {
        let msg = message(validate(
            CREATE_ISSUE,
            &schema_of(CREATE_ISSUE),
            &json!({"title": "t", "teamId": "x", "labelIds": ["ok", 3]}),
        ));
        assert!(msg.contains("'labelIds[1]' must be a string"));
    }

    #[test]
    fn test_arguments_must_be_object() {
        let msg = message(validate(
            LIST_ISSUES,
            &schema_of(LIST_ISSUES),
            &json!(["teamId"]),
        ));
        assert!(msg.contains("must be a JSON object"));
    }

    #[test]
    fn test_null_optional_field_is_ignored() {
        assert!(validate(
            LIST_ISSUES,
            &schema_of(LIST_ISSUES),
            &json!({"teamId": null})
        )
        .is_ok());
    }
}
