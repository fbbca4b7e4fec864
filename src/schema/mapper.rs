// Schema mapping protocol
//
// This module defines the visitor contracts a downstream representation
// implements to build its own schema (and value) from this model, plus the
// shared rules every such mapper applies: dropping fields with no concrete
// type, and deriving identifier-safe names from field paths.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::typed_struct::TypedStruct;
use crate::data::value::{TypedValue, Value};
use crate::internal::error::Result;
use crate::schema::model::{ArraySchema, Field, MapSchema, Schema, StructSchema};
use crate::schema::types::Type;

/// Configuration for schema mappers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Keep a leading non-alphanumeric marker (`_id`, `@attr`) when deriving
    /// schema names from field paths
    pub keep_leading_marker: bool,

    /// Drop fields whose schema has no concrete type
    pub drop_undefined_fields: bool,

    /// Prepended to every derived schema name
    pub schema_name_prefix: Option<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            keep_leading_marker: false,
            drop_undefined_fields: true,
            schema_name_prefix: None,
        }
    }
}

impl MapperConfig {
    /// Derives the schema name for a struct found at `path`
    pub fn schema_name(&self, path: &str) -> String {
        let name = normalize_schema_name(path, self.keep_leading_marker);
        match &self.schema_name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name,
        }
    }
}

/// Visitor producing a target representation `T` from a schema
pub trait SchemaMapper<T> {
    fn map_simple(&mut self, ty: Type, optional: bool) -> Result<T>;

    fn map_array(&mut self, schema: &ArraySchema, optional: bool) -> Result<T>;

    fn map_map(&mut self, schema: &MapSchema, optional: bool) -> Result<T>;

    /// Fields are visited by the implementation, in index order
    fn map_struct(&mut self, schema: &Arc<StructSchema>, optional: bool) -> Result<T>;
}

/// Visitor producing a target value `T` from a schema and value together
pub trait SchemaMapperWithValue<T> {
    /// A null, typed or not; `schema` is the declared schema
    fn map_null_value(&mut self, schema: &Schema) -> Result<T>;

    /// A non-null primitive
    fn map_simple_value(&mut self, value: &TypedValue) -> Result<T>;

    fn map_array_value(&mut self, schema: &ArraySchema, items: &[TypedValue]) -> Result<T>;

    fn map_map_value(
        &mut self,
        schema: &MapSchema,
        entries: &BTreeMap<String, TypedValue>,
    ) -> Result<T>;

    fn map_struct_value(&mut self, value: &TypedStruct) -> Result<T>;
}

impl Schema {
    /// Dispatches to the mapper callback for this schema's kind
    pub fn map_with<T, M>(&self, mapper: &mut M) -> Result<T>
    where
        M: SchemaMapper<T> + ?Sized,
    {
        self.map_optional(mapper, false)
    }

    fn map_optional<T, M>(&self, mapper: &mut M, optional: bool) -> Result<T>
    where
        M: SchemaMapper<T> + ?Sized,
    {
        match self {
            Schema::Simple(ty) => mapper.map_simple(*ty, optional),
            Schema::Array(array) => mapper.map_array(array, optional),
            Schema::Map(map) => mapper.map_map(map, optional),
            Schema::Struct(s) => mapper.map_struct(s, optional),
        }
    }
}

impl Field {
    /// Maps the field schema, passing on whether the field is optional
    pub fn map_with<T, M>(&self, mapper: &mut M) -> Result<T>
    where
        M: SchemaMapper<T> + ?Sized,
    {
        self.schema().map_optional(mapper, self.is_optional())
    }
}

impl TypedValue {
    /// Dispatches to the value-carrying mapper callback for this value
    pub fn map_with<T, M>(&self, mapper: &mut M) -> Result<T>
    where
        M: SchemaMapperWithValue<T> + ?Sized,
    {
        let schema = self.schema();
        match (self.value(), &*schema) {
            (Value::Null, schema) => mapper.map_null_value(schema),
            (Value::Struct(s), _) => mapper.map_struct_value(s),
            (Value::Array(items), Schema::Array(array)) => mapper.map_array_value(array, items),
            (Value::Map(entries), Schema::Map(map)) => mapper.map_map_value(map, entries),
            _ => mapper.map_simple_value(self),
        }
    }
}

/// Returns true if a field with this schema has no concrete type to map to
pub fn is_droppable(schema: &Schema) -> bool {
    schema.is_undefined()
}

/// Returns true if a field holding this value has no concrete type to map
/// to: an unknown null, or an empty array whose element type was never
/// observed. An array holding nulls still has values and is kept.
pub fn is_droppable_value(value: &TypedValue) -> bool {
    let empty = match value.value() {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    empty && value.schema().is_undefined()
}

/// Derives an identifier from a field path.
///
/// Splits on every non-alphanumeric character, upper-cases the first letter
/// of each segment and concatenates them (`user.home_address` becomes
/// `UserHomeAddress`). With `keep_leading_marker`, a non-alphanumeric first
/// character is kept in front (`_meta` becomes `_Meta`). Names that would
/// start with a digit are prefixed with `_`; an empty result becomes `Root`.
pub fn normalize_schema_name(path: &str, keep_leading_marker: bool) -> String {
    let mut name = String::with_capacity(path.len());
    if keep_leading_marker {
        if let Some(marker) = path.chars().next().filter(|c| !c.is_alphanumeric()) {
            name.push(marker);
        }
    }
    let marker_len = name.len();

    for segment in path.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }

    match name[marker_len..].chars().next() {
        None => name.push_str("Root"),
        Some(c) if c.is_ascii_digit() && marker_len == 0 => name.insert(0, '_'),
        Some(_) => {}
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders schemas as compact type strings
    struct Describe;

    impl SchemaMapper<String> for Describe {
        fn map_simple(&mut self, ty: Type, optional: bool) -> Result<String> {
            Ok(format!("{ty}{}", if optional { "?" } else { "" }))
        }

        fn map_array(&mut self, schema: &ArraySchema, _optional: bool) -> Result<String> {
            Ok(format!("[{}]", schema.element().map_with(self)?))
        }

        fn map_map(&mut self, schema: &MapSchema, _optional: bool) -> Result<String> {
            Ok(format!("{{{}}}", schema.value().map_with(self)?))
        }

        fn map_struct(&mut self, schema: &Arc<StructSchema>, _optional: bool) -> Result<String> {
            let mut parts = Vec::new();
            for field in schema.fields() {
                if is_droppable(field.schema()) {
                    continue;
                }
                parts.push(format!("{}:{}", field.name(), field.map_with(self)?));
            }
            Ok(format!("({})", parts.join(",")))
        }
    }

    /// Counts leaf values
    struct CountLeaves;

    impl SchemaMapperWithValue<usize> for CountLeaves {
        fn map_null_value(&mut self, _schema: &Schema) -> Result<usize> {
            Ok(0)
        }

        fn map_simple_value(&mut self, _value: &TypedValue) -> Result<usize> {
            Ok(1)
        }

        fn map_array_value(&mut self, _schema: &ArraySchema, items: &[TypedValue]) -> Result<usize> {
            items.iter().map(|v| v.map_with(self)).sum()
        }

        fn map_map_value(
            &mut self,
            _schema: &MapSchema,
            entries: &BTreeMap<String, TypedValue>,
        ) -> Result<usize> {
            entries.values().map(|v| v.map_with(self)).sum()
        }

        fn map_struct_value(&mut self, value: &TypedStruct) -> Result<usize> {
            value.iter().map(|f| f.value().map_with(self)).sum()
        }
    }

    #[test]
    fn test_schema_dispatch_and_drop() {
        let schema = Schema::from(
            StructSchema::new()
                .with_field("id", Schema::simple(Type::Long))
                .with_optional_field("note", Schema::simple(Type::String))
                .with_field("unknown", Schema::none())
                .with_field("empty", Schema::array(Schema::none()))
                .with_field("tags", Schema::array(Schema::simple(Type::String))),
        );
        assert_eq!(
            schema.map_with(&mut Describe),
            Ok("(id:LONG,note:STRING?,tags:[STRING])".to_string())
        );
    }

    #[test]
    fn test_value_dispatch() {
        let mut s = TypedStruct::new();
        s.put("a", 1)
            .and_then(|s| s.put("b", TypedValue::null()))
            .and_then(|s| s.put("c", TypedValue::array(vec![1.into(), 2.into()])?))
            .expect("put");
        let value = TypedValue::from(s);
        assert_eq!(value.map_with(&mut CountLeaves), Ok(3));
    }

    #[test]
    fn test_droppable_values() {
        assert!(is_droppable_value(&TypedValue::null()));
        assert!(is_droppable_value(&TypedValue::empty_array()));
        assert!(!is_droppable_value(&TypedValue::null_of(Schema::simple(Type::Int))));
        assert!(!is_droppable_value(&TypedValue::empty_array_of(Schema::simple(Type::Int))));

        let nulls = TypedValue::array(vec![TypedValue::null(), TypedValue::null()]).expect("array");
        assert!(nulls.schema().is_undefined());
        assert!(!is_droppable_value(&nulls));
    }

    #[test]
    fn test_normalize_schema_name() {
        assert_eq!(normalize_schema_name("user.home_address", false), "UserHomeAddress");
        assert_eq!(normalize_schema_name("_meta.tags", false), "MetaTags");
        assert_eq!(normalize_schema_name("_meta.tags", true), "_MetaTags");
        assert_eq!(normalize_schema_name("@id", true), "@Id");
        assert_eq!(normalize_schema_name("1st", false), "_1st");
        assert_eq!(normalize_schema_name("", false), "Root");
        assert_eq!(normalize_schema_name("..", false), "Root");
    }

    #[test]
    fn test_config_schema_name() {
        let config = MapperConfig {
            schema_name_prefix: Some("Ns".into()),
            ..MapperConfig::default()
        };
        assert_eq!(config.schema_name("order.items"), "NsOrderItems");
    }
}
