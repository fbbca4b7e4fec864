// JSON to typed value decoding

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::path::SEPARATOR;
use crate::data::typed_struct::TypedStruct;
use crate::data::value::TypedValue;
use crate::internal::error::{Error, Result};
use crate::schema::utils::join_path;

/// Configuration for the JSON decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Substituted for the path separator inside object keys, so that every
    /// decoded key is a valid field name
    pub path_separator_replacement: String,

    /// Decode integers that fit 32 bits as INT rather than LONG
    pub infer_integer_width: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            path_separator_replacement: "_".to_string(),
            infer_integer_width: true,
        }
    }
}

/// Decodes any JSON value.
///
/// Arrays take the merged schema of their elements, so objects with
/// different keys yield one element struct holding every key. Errors carry
/// the dot-path of the offending value.
pub fn from_json(json: &JsonValue, config: &DecodeConfig) -> Result<TypedValue> {
    decode_value("", json, config)
}

/// Decodes a JSON object into a typed struct; any other root is an error
pub fn struct_from_json(json: &JsonValue, config: &DecodeConfig) -> Result<TypedStruct> {
    match json {
        JsonValue::Object(object) => decode_object("", object, config),
        other => Err(Error::DecodeError(format!(
            "expected a JSON object at the root, found {}",
            kind(other)
        ))),
    }
}

fn decode_value(path: &str, json: &JsonValue, config: &DecodeConfig) -> Result<TypedValue> {
    match json {
        JsonValue::Null => Ok(TypedValue::null()),
        JsonValue::Bool(b) => Ok(TypedValue::boolean(*b)),
        JsonValue::Number(n) => decode_number(path, n, config),
        JsonValue::String(s) => Ok(TypedValue::string(s.as_str())),
        JsonValue::Array(items) => {
            let items = items
                .iter()
                .map(|item| decode_value(path, item, config))
                .collect::<Result<Vec<_>>>()?;
            TypedValue::array(items).map_err(|e| e.within(path))
        }
        JsonValue::Object(object) => decode_object(path, object, config).map(TypedValue::from),
    }
}

#[allow(clippy::cast_precision_loss)]
fn decode_number(path: &str, n: &serde_json::Number, config: &DecodeConfig) -> Result<TypedValue> {
    if let Some(v) = n.as_i64() {
        if config.infer_integer_width {
            if let Ok(narrow) = i32::try_from(v) {
                return Ok(TypedValue::int(narrow));
            }
        }
        return Ok(TypedValue::long(v));
    }
    if let Some(v) = n.as_u64() {
        return Ok(TypedValue::double(v as f64));
    }
    n.as_f64().map(TypedValue::double).ok_or_else(|| {
        Error::DecodeError(format!("number {n} at '{path}' is not representable"))
    })
}

fn decode_object(
    path: &str,
    object: &serde_json::Map<String, JsonValue>,
    config: &DecodeConfig,
) -> Result<TypedStruct> {
    let mut record = TypedStruct::new();
    for (key, json) in object {
        if key.is_empty() {
            return Err(Error::DecodeError(format!(
                "empty object key under '{}'",
                if path.is_empty() { "<root>" } else { path }
            )));
        }
        let name = key.replace(SEPARATOR, &config.path_separator_replacement);
        if record.has(&name) {
            return Err(Error::DuplicateField(join_path(path, &name)));
        }
        let field_path = join_path(path, &name);
        let value = decode_value(&field_path, json, config)?;
        record.put(&name, value)?;
    }
    Ok(record)
}

fn kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::schema::model::Schema;
    use crate::schema::types::Type;

    fn decode(json: JsonValue) -> TypedStruct {
        struct_from_json(&json, &DecodeConfig::default()).expect("decode")
    }

    #[test]
    fn test_primitives() {
        let record = decode(json!({
            "flag": true,
            "small": 7,
            "big": 5_000_000_000_i64,
            "huge": u64::MAX,
            "ratio": 0.5,
            "name": "x",
            "nothing": null,
        }));
        assert_eq!(record.field_names(), vec!["flag", "small", "big", "huge", "ratio", "name", "nothing"]);
        assert_eq!(record.get_bool("flag"), Ok(true));
        assert_eq!(record.get("small").map(TypedValue::type_tag), Ok(Type::Int));
        assert_eq!(record.get("big").map(TypedValue::type_tag), Ok(Type::Long));
        assert_eq!(record.get("huge").map(TypedValue::type_tag), Ok(Type::Double));
        assert_eq!(record.get_f64("ratio"), Ok(0.5));
        assert!(record.get("nothing").map(TypedValue::is_undefined).unwrap_or(false));
    }

    #[test]
    fn test_integer_width_off() {
        let config = DecodeConfig {
            infer_integer_width: false,
            ..DecodeConfig::default()
        };
        let value = from_json(&json!(3), &config).expect("decode");
        assert_eq!(value, TypedValue::long(3));
    }

    #[test]
    fn test_array_of_objects_unifies_fields() {
        let value = from_json(&json!([{"f1": "x"}, {"f2": "y"}]), &DecodeConfig::default())
            .expect("decode");
        let schema = value.schema().into_owned();
        let element = schema.as_array().and_then(|a| a.element().as_struct()).expect("struct");
        assert!(element.contains("f1") && element.contains("f2"));
    }

    #[test]
    fn test_empty_array_is_undefined() {
        let value = from_json(&json!([]), &DecodeConfig::default()).expect("decode");
        assert_eq!(value.schema().into_owned(), Schema::array(Schema::none()));
    }

    #[test]
    fn test_mixed_array_conflict_names_path() {
        let err = struct_from_json(&json!({"a": {"b": [1, "x"]}}), &DecodeConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::TypeConflict { ref path, .. } if path == "a.b"));
    }

    #[test]
    fn test_dotted_keys_are_rewritten() {
        let record = decode(json!({"a.b": 1}));
        assert_eq!(record.field_names(), vec!["a_b"]);
        let err = struct_from_json(&json!({"a.b": 1, "a_b": 2}), &DecodeConfig::default())
            .unwrap_err();
        assert_eq!(err, Error::DuplicateField("a_b".into()));
    }

    #[test]
    fn test_non_object_root() {
        let err = struct_from_json(&json!([1]), &DecodeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DecodeError(ref msg) if msg.contains("array")));
        assert!(struct_from_json(&json!({"": 1}), &DecodeConfig::default()).is_err());
    }
}
