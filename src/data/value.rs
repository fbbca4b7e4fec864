// Typed values
//
// A `TypedValue` pairs a schema with a concrete value. Struct values derive
// their schema from their fields on demand; arrays and maps keep the merged
// schema of their elements, so every mutation that adds elements goes
// through a method that re-merges it.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bytes::Bytes;

use crate::data::typed_struct::TypedStruct;
use crate::internal::error::{Error, Result};
use crate::schema::merge::SchemaMerger;
use crate::schema::model::Schema;
use crate::schema::types::Type;

/// The raw value part of a typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Bytes),
    Array(Vec<TypedValue>),
    Map(BTreeMap<String, TypedValue>),
    Struct(TypedStruct),
}

/// A value bound to its schema
#[derive(Debug, Clone)]
pub struct TypedValue {
    schema: Schema,
    value: Value,
}

impl TypedValue {
    /// Null with the placeholder "unknown" schema
    pub fn null() -> Self {
        Self {
            schema: Schema::none(),
            value: Value::Null,
        }
    }

    /// Null carrying a concrete schema
    pub fn null_of(schema: Schema) -> Self {
        Self {
            schema,
            value: Value::Null,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::primitive(Type::Boolean, Value::Boolean(value))
    }

    pub fn short(value: i16) -> Self {
        Self::primitive(Type::Short, Value::Short(value))
    }

    pub fn int(value: i32) -> Self {
        Self::primitive(Type::Int, Value::Int(value))
    }

    pub fn long(value: i64) -> Self {
        Self::primitive(Type::Long, Value::Long(value))
    }

    pub fn float(value: f32) -> Self {
        Self::primitive(Type::Float, Value::Float(value))
    }

    pub fn double(value: f64) -> Self {
        Self::primitive(Type::Double, Value::Double(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive(Type::String, Value::String(value.into()))
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::primitive(Type::Bytes, Value::Bytes(value.into()))
    }

    /// Wraps a struct
    pub fn structure(value: TypedStruct) -> Self {
        Self {
            schema: Schema::simple(Type::Struct),
            value: Value::Struct(value),
        }
    }

    /// Array whose element schema is inferred from its items
    ///
    /// Items of different but reconcilable shapes (e.g. structs with
    /// different field subsets) share the merged element schema; items that
    /// cannot be reconciled fail with a type conflict.
    pub fn array(items: Vec<TypedValue>) -> Result<Self> {
        Self::array_of(Schema::none(), items)
    }

    /// Array starting from a declared element schema, widened by its items
    pub fn array_of(element: Schema, items: Vec<TypedValue>) -> Result<Self> {
        let mut merger = SchemaMerger::new();
        let mut element = element;
        for item in &items {
            element = merger.merge(&element, &item.schema())?;
        }
        Ok(Self {
            schema: Schema::array(element),
            value: Value::Array(items),
        })
    }

    /// Array without items; its element schema stays unknown until populated
    pub fn empty_array() -> Self {
        Self::empty_array_of(Schema::none())
    }

    pub fn empty_array_of(element: Schema) -> Self {
        Self {
            schema: Schema::array(element),
            value: Value::Array(Vec::new()),
        }
    }

    /// String-keyed map whose value schema is inferred from its entries
    pub fn map(entries: BTreeMap<String, TypedValue>) -> Result<Self> {
        let mut merger = SchemaMerger::new();
        let mut value_schema = Schema::none();
        for value in entries.values() {
            value_schema = merger.merge(&value_schema, &value.schema())?;
        }
        Ok(Self {
            schema: Schema::map(Schema::simple(Type::String), value_schema),
            value: Value::Map(entries),
        })
    }

    /// Builds a typed value from parts, without checking that they agree.
    pub(crate) fn from_parts(schema: Schema, value: Value) -> Self {
        Self { schema, value }
    }

    fn primitive(ty: Type, value: Value) -> Self {
        Self {
            schema: Schema::Simple(ty),
            value,
        }
    }

    /// Returns the schema of this value
    ///
    /// Struct values compute it from their current fields.
    pub fn schema(&self) -> Cow<'_, Schema> {
        match &self.value {
            Value::Struct(s) => Cow::Owned(Schema::from(s.schema())),
            _ => Cow::Borrowed(&self.schema),
        }
    }

    /// Returns the type tag of this value
    pub fn type_tag(&self) -> Type {
        match &self.value {
            Value::Struct(_) => Type::Struct,
            _ => self.schema.type_tag(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    /// Returns true if the schema has no concrete type (unknown nulls and
    /// arrays of unknown elements)
    pub fn is_undefined(&self) -> bool {
        !matches!(self.value, Value::Struct(_)) && self.schema.is_undefined()
    }

    /// Appends an item to an array value, widening its element schema.
    ///
    /// On a type conflict the array is left unchanged.
    pub fn push(&mut self, item: TypedValue) -> Result<()> {
        let Schema::Array(array) = &self.schema else {
            return Err(self.mismatch(Type::Array));
        };
        let element = SchemaMerger::new().merge(array.element(), &item.schema())?;
        if self.is_null() {
            self.value = Value::Array(Vec::new());
        }
        let actual = self.type_tag();
        match &mut self.value {
            Value::Array(items) => items.push(item),
            _ => {
                return Err(Error::TypeMismatch {
                    field: String::new(),
                    expected: Type::Array,
                    actual,
                })
            }
        }
        self.schema = Schema::array(element);
        Ok(())
    }

    /// Re-derives the element schema of non-empty arrays and maps from their
    /// contents.
    pub(crate) fn refresh_schema(&mut self) -> Result<()> {
        match &self.value {
            Value::Array(items) if !items.is_empty() => {
                let mut merger = SchemaMerger::new();
                let mut element = Schema::none();
                for item in items {
                    element = merger.merge(&element, &item.schema())?;
                }
                self.schema = Schema::array(element);
            }
            Value::Map(entries) if !entries.is_empty() => {
                let mut merger = SchemaMerger::new();
                let mut value_schema = Schema::none();
                for value in entries.values() {
                    value_schema = merger.merge(&value_schema, &value.schema())?;
                }
                self.schema = Schema::map(Schema::simple(Type::String), value_schema);
            }
            _ => {}
        }
        Ok(())
    }

    /// Splits into the items of an array, or a single item otherwise.
    pub(crate) fn into_items(self) -> Vec<TypedValue> {
        match self.value {
            Value::Array(items) => items,
            _ => vec![self],
        }
    }

    pub(crate) fn mismatch(&self, expected: Type) -> Error {
        Error::TypeMismatch {
            field: String::new(),
            expected,
            actual: self.type_tag(),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.value {
            Value::Boolean(b) => Ok(b),
            _ => Err(self.mismatch(Type::Boolean)),
        }
    }

    /// Returns the value as `i32`, accepting SHORT and INT
    pub fn as_i32(&self) -> Result<i32> {
        match self.value {
            Value::Short(v) => Ok(i32::from(v)),
            Value::Int(v) => Ok(v),
            _ => Err(self.mismatch(Type::Int)),
        }
    }

    /// Returns the value as `i64`, accepting any integral type
    pub fn as_i64(&self) -> Result<i64> {
        match self.value {
            Value::Short(v) => Ok(i64::from(v)),
            Value::Int(v) => Ok(i64::from(v)),
            Value::Long(v) => Ok(v),
            _ => Err(self.mismatch(Type::Long)),
        }
    }

    /// Returns the value as `f64`, accepting any numeric type
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Result<f64> {
        match self.value {
            Value::Float(v) => Ok(f64::from(v)),
            Value::Double(v) => Ok(v),
            Value::Short(v) => Ok(f64::from(v)),
            Value::Int(v) => Ok(f64::from(v)),
            Value::Long(v) => Ok(v as f64),
            _ => Err(self.mismatch(Type::Double)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match &self.value {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(Type::String)),
        }
    }

    pub fn as_bytes(&self) -> Result<&Bytes> {
        match &self.value {
            Value::Bytes(b) => Ok(b),
            _ => Err(self.mismatch(Type::Bytes)),
        }
    }

    pub fn as_array(&self) -> Result<&[TypedValue]> {
        match &self.value {
            Value::Array(items) => Ok(items),
            _ => Err(self.mismatch(Type::Array)),
        }
    }

    pub fn as_map(&self) -> Result<&BTreeMap<String, TypedValue>> {
        match &self.value {
            Value::Map(entries) => Ok(entries),
            _ => Err(self.mismatch(Type::Map)),
        }
    }

    pub fn as_struct(&self) -> Result<&TypedStruct> {
        match &self.value {
            Value::Struct(s) => Ok(s),
            _ => Err(self.mismatch(Type::Struct)),
        }
    }

    pub fn as_struct_mut(&mut self) -> Result<&mut TypedStruct> {
        let actual = self.type_tag();
        match &mut self.value {
            Value::Struct(s) => Ok(s),
            _ => Err(Error::TypeMismatch {
                field: String::new(),
                expected: Type::Struct,
                actual,
            }),
        }
    }

    /// Mutable access to map entries; the value schema is refreshed by the
    /// caller through [`TypedValue::refresh_schema`].
    pub(crate) fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, TypedValue>> {
        match &mut self.value {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Mutable access to array items; see [`TypedValue::as_map_mut`].
    pub(crate) fn as_array_mut(&mut self) -> Option<&mut Vec<TypedValue>> {
        match &mut self.value {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_struct(self) -> Result<TypedStruct> {
        match self.value {
            Value::Struct(s) => Ok(s),
            _ => Err(Error::TypeMismatch {
                field: String::new(),
                expected: Type::Struct,
                actual: self.schema.type_tag(),
            }),
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.schema() == other.schema()
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::boolean(value)
    }
}

impl From<i16> for TypedValue {
    fn from(value: i16) -> Self {
        TypedValue::short(value)
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        TypedValue::int(value)
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::long(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        TypedValue::float(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        TypedValue::double(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::string(value)
    }
}

impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::string(value)
    }
}

impl From<Bytes> for TypedValue {
    fn from(value: Bytes) -> Self {
        TypedValue::bytes(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::bytes(value)
    }
}

impl From<TypedStruct> for TypedValue {
    fn from(value: TypedStruct) -> Self {
        TypedValue::structure(value)
    }
}
