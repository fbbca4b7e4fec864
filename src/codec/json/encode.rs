// Typed model to JSON encoding
//
// `JsonMapper` is the reference implementation of both mapper traits:
// schemas become JSON schema (draft 2020-12) fragments with every struct
// shape hoisted into `$defs`, values become plain JSON.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value as JsonValue};

use crate::data::typed_struct::TypedStruct;
use crate::data::value::{TypedValue, Value};
use crate::internal::error::Result;
use crate::schema::mapper::{
    is_droppable, is_droppable_value, normalize_schema_name, MapperConfig, SchemaMapper,
    SchemaMapperWithValue,
};
use crate::schema::model::{ArraySchema, MapSchema, Schema, StructSchema};
use crate::schema::types::Type;
use crate::schema::utils::join_path;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Maps typed schemas and values to JSON
///
/// Struct schemas are emitted once per distinct shape: a shape seen again at
/// another path resolves to the same `$defs` entry and the same shared
/// definition instance.
#[derive(Debug, Default)]
pub struct JsonMapper {
    config: MapperConfig,
    definitions: BTreeMap<String, Arc<JsonValue>>,
    by_shape: HashMap<Arc<StructSchema>, String>,
    path: Vec<String>,
}

impl JsonMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Builds a standalone JSON schema document for `schema`
    pub fn schema_document(&mut self, schema: &Schema) -> Result<JsonValue> {
        let root: JsonValue = schema.map_with(self)?;
        let mut document = Map::new();
        document.insert("$schema".to_string(), JsonValue::from(DRAFT));
        match root {
            JsonValue::Object(fields) => document.extend(fields),
            other => {
                document.insert("allOf".to_string(), JsonValue::Array(vec![other]));
            }
        }
        if !self.definitions.is_empty() {
            let defs = self
                .definitions
                .iter()
                .map(|(name, def)| (name.clone(), def.as_ref().clone()))
                .collect::<Map<_, _>>();
            document.insert("$defs".to_string(), JsonValue::Object(defs));
        }
        Ok(JsonValue::Object(document))
    }

    /// Converts a typed value into JSON
    pub fn value(&mut self, value: &TypedValue) -> Result<JsonValue> {
        value.map_with(self)
    }

    /// Returns the shared definition emitted for a struct shape, if any
    pub fn definition(&self, schema: &StructSchema) -> Option<Arc<JsonValue>> {
        let name = self.by_shape.get(schema)?;
        self.definitions.get(name).cloned()
    }

    /// Returns the `$defs` name emitted for a struct shape, if any
    pub fn definition_name(&self, schema: &StructSchema) -> Option<&str> {
        self.by_shape.get(schema).map(String::as_str)
    }

    fn current_path(&self) -> String {
        self.path
            .iter()
            .fold(String::new(), |acc, segment| join_path(&acc, segment))
    }

    /// Picks a `$defs` name not used by another shape
    fn unique_name(&self, schema: &StructSchema) -> String {
        let base = match schema.name() {
            Some(name) => normalize_schema_name(name, self.config.keep_leading_marker),
            None => self.config.schema_name(&self.current_path()),
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while self.definitions.contains_key(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        candidate
    }

    fn reference(name: &str) -> JsonValue {
        json!({ "$ref": format!("#/$defs/{name}") })
    }
}

fn nullable(mut fragment: JsonValue, optional: bool) -> JsonValue {
    if !optional {
        return fragment;
    }
    if let Some(JsonValue::String(ty)) = fragment.get("type").cloned() {
        if ty != "null" {
            fragment["type"] = json!([ty, "null"]);
        }
        return fragment;
    }
    json!({ "anyOf": [fragment, { "type": "null" }] })
}

impl SchemaMapper<JsonValue> for JsonMapper {
    fn map_simple(&mut self, ty: Type, optional: bool) -> Result<JsonValue> {
        let fragment = match ty {
            Type::Boolean => json!({ "type": "boolean" }),
            Type::Short => json!({ "type": "integer", "format": "int16" }),
            Type::Int => json!({ "type": "integer", "format": "int32" }),
            Type::Long => json!({ "type": "integer", "format": "int64" }),
            Type::Float => json!({ "type": "number", "format": "float" }),
            Type::Double => json!({ "type": "number", "format": "double" }),
            Type::String => json!({ "type": "string" }),
            Type::Bytes => json!({ "type": "string", "contentEncoding": "base64" }),
            Type::Array => json!({ "type": "array" }),
            Type::Map | Type::Struct => json!({ "type": "object" }),
            Type::Null => json!({ "type": "null" }),
        };
        Ok(nullable(fragment, optional))
    }

    fn map_array(&mut self, schema: &ArraySchema, optional: bool) -> Result<JsonValue> {
        let mut fragment = json!({ "type": "array" });
        if !schema.element().is_undefined() {
            fragment["items"] = schema.element().map_with(self)?;
        }
        Ok(nullable(fragment, optional))
    }

    fn map_map(&mut self, schema: &MapSchema, optional: bool) -> Result<JsonValue> {
        let mut fragment = json!({ "type": "object" });
        if !schema.value().is_undefined() {
            fragment["additionalProperties"] = schema.value().map_with(self)?;
        }
        Ok(nullable(fragment, optional))
    }

    fn map_struct(&mut self, schema: &Arc<StructSchema>, optional: bool) -> Result<JsonValue> {
        if let Some(name) = self.by_shape.get(schema) {
            return Ok(nullable(Self::reference(name), optional));
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in schema.fields() {
            if self.config.drop_undefined_fields && is_droppable(field.schema()) {
                tracing::trace!(field = field.name(), "dropping field without concrete type");
                continue;
            }
            self.path.push(field.name().to_string());
            let mapped = field.map_with(self);
            self.path.pop();
            properties.insert(field.name().to_string(), mapped?);
            if !field.is_optional() {
                required.push(JsonValue::from(field.name()));
            }
        }

        let mut definition = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        if !required.is_empty() {
            definition["required"] = JsonValue::Array(required);
        }
        if let Some(doc) = schema.doc() {
            definition["description"] = JsonValue::from(doc);
        }

        let name = self.unique_name(schema);
        self.definitions.insert(name.clone(), Arc::new(definition));
        self.by_shape.insert(Arc::clone(schema), name.clone());
        Ok(nullable(Self::reference(&name), optional))
    }
}

impl SchemaMapperWithValue<JsonValue> for JsonMapper {
    fn map_null_value(&mut self, _schema: &Schema) -> Result<JsonValue> {
        Ok(JsonValue::Null)
    }

    fn map_simple_value(&mut self, value: &TypedValue) -> Result<JsonValue> {
        Ok(match value.value() {
            Value::Boolean(v) => JsonValue::from(*v),
            Value::Short(v) => JsonValue::from(*v),
            Value::Int(v) => JsonValue::from(*v),
            Value::Long(v) => JsonValue::from(*v),
            Value::Float(v) => finite(f64::from(*v)),
            Value::Double(v) => finite(*v),
            Value::String(v) => JsonValue::from(v.as_str()),
            Value::Bytes(v) => JsonValue::from(STANDARD.encode(v)),
            _ => JsonValue::Null,
        })
    }

    fn map_array_value(&mut self, _schema: &ArraySchema, items: &[TypedValue]) -> Result<JsonValue> {
        items
            .iter()
            .map(|item| item.map_with(self))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array)
    }

    fn map_map_value(
        &mut self,
        _schema: &MapSchema,
        entries: &BTreeMap<String, TypedValue>,
    ) -> Result<JsonValue> {
        let mut object = Map::new();
        for (key, value) in entries {
            object.insert(key.clone(), value.map_with(self)?);
        }
        Ok(JsonValue::Object(object))
    }

    fn map_struct_value(&mut self, value: &TypedStruct) -> Result<JsonValue> {
        let mut object = Map::new();
        for field in value.iter() {
            if self.config.drop_undefined_fields && is_droppable_value(field.value()) {
                continue;
            }
            object.insert(field.name().to_string(), field.value().map_with(self)?);
        }
        Ok(JsonValue::Object(object))
    }
}

/// NaN and infinities have no JSON form and become null
fn finite(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

/// Converts a typed value into JSON with the default mapper settings
pub fn to_json(value: &TypedValue) -> Result<JsonValue> {
    JsonMapper::new().value(value)
}
