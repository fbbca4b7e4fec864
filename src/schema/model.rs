// Schema hierarchy for the typedata model
//
// A schema is an immutable description of shape: simple (primitive),
// array (element schema), map (key/value schemas) or struct (ordered named
// fields). Struct schemas compare structurally, independent of the order
// their fields were added in.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::schema::types::Type;

/// Describes the shape of a typed value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Primitive or null
    Simple(Type),
    /// Array of elements sharing one schema
    Array(ArraySchema),
    /// Map of string keys to values sharing one schema
    Map(MapSchema),
    /// Ordered named fields; shared so equal shapes can be one instance
    Struct(Arc<StructSchema>),
}

impl Schema {
    /// The placeholder schema for values whose type is not known yet.
    pub fn none() -> Self {
        Schema::Simple(Type::Null)
    }

    /// Creates a schema for a tag.
    ///
    /// Composite tags produce their empty shapes: an array or map of unknown
    /// elements, or a struct without fields.
    pub fn simple(ty: Type) -> Self {
        match ty {
            Type::Array => Schema::array(Schema::none()),
            Type::Map => Schema::map(Schema::simple(Type::String), Schema::none()),
            Type::Struct => Schema::from(StructSchema::new()),
            other => Schema::Simple(other),
        }
    }

    /// Creates an array schema.
    pub fn array(element: Schema) -> Self {
        Schema::Array(ArraySchema::new(element))
    }

    /// Creates a map schema.
    pub fn map(key: Schema, value: Schema) -> Self {
        Schema::Map(MapSchema::new(key, value))
    }

    /// Returns the type tag of this schema
    pub fn type_tag(&self) -> Type {
        match self {
            Schema::Simple(ty) => *ty,
            Schema::Array(_) => Type::Array,
            Schema::Map(_) => Type::Map,
            Schema::Struct(_) => Type::Struct,
        }
    }

    /// Returns true for the placeholder "unknown" schema
    pub fn is_none(&self) -> bool {
        matches!(self, Schema::Simple(Type::Null))
    }

    /// Returns true if this schema, or an array element nested in it,
    /// has no concrete type yet
    pub fn is_undefined(&self) -> bool {
        match self {
            Schema::Simple(Type::Null) => true,
            Schema::Array(array) => array.element().is_undefined(),
            _ => false,
        }
    }

    /// Returns the struct schema if this is a struct
    pub fn as_struct(&self) -> Option<&Arc<StructSchema>> {
        match self {
            Schema::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array schema if this is an array
    pub fn as_array(&self) -> Option<&ArraySchema> {
        match self {
            Schema::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the element schema for arrays, and the schema itself otherwise.
    pub fn element_or_self(&self) -> &Schema {
        match self {
            Schema::Array(a) => a.element(),
            other => other,
        }
    }

    /// Tag used when reporting conflicts: arrays report their element tag
    /// so a conflict names the concrete mismatching kinds.
    pub(crate) fn conflict_tag(&self) -> Type {
        self.element_or_self().type_tag()
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Schema::Simple(ty) => out.push_str(ty.name()),
            Schema::Array(a) => {
                out.push_str("ARRAY<");
                a.element().write_canonical(out);
                out.push('>');
            }
            Schema::Map(m) => {
                out.push_str("MAP<");
                m.key().write_canonical(out);
                out.push(',');
                m.value().write_canonical(out);
                out.push('>');
            }
            Schema::Struct(s) => s.write_canonical(out),
        }
    }
}

impl From<StructSchema> for Schema {
    fn from(schema: StructSchema) -> Self {
        Schema::Struct(Arc::new(schema))
    }
}

impl From<Type> for Schema {
    fn from(ty: Type) -> Self {
        Schema::simple(ty)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Simple(ty) => write!(f, "{ty}"),
            Schema::Array(a) => write!(f, "ARRAY<{}>", a.element()),
            Schema::Map(m) => write!(f, "MAP<{},{}>", m.key(), m.value()),
            Schema::Struct(s) => write!(f, "{s}"),
        }
    }
}

/// Schema of an array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySchema {
    element: Box<Schema>,
}

impl ArraySchema {
    /// Creates an array schema with the given element schema
    pub fn new(element: Schema) -> Self {
        Self {
            element: Box::new(element),
        }
    }

    /// Returns the element schema (the "none" schema when unknown)
    pub fn element(&self) -> &Schema {
        &self.element
    }
}

/// Schema of a map
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapSchema {
    key: Box<Schema>,
    value: Box<Schema>,
}

impl MapSchema {
    /// Creates a map schema
    pub fn new(key: Schema, value: Schema) -> Self {
        Self {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn key(&self) -> &Schema {
        &self.key
    }

    pub fn value(&self) -> &Schema {
        &self.value
    }
}

/// A named field of a struct schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    index: usize,
    schema: Schema,
    optional: bool,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the field in its struct (insertion order, contiguous)
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Schema of a struct: ordered fields with unique names
#[derive(Debug, Clone, Default)]
pub struct StructSchema {
    name: Option<String>,
    doc: Option<String>,
    fields: Vec<Field>,
}

impl StructSchema {
    /// Creates an anonymous struct schema without fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a named struct schema without fields
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builder form of [`StructSchema::put_field`] for required fields.
    pub fn with_field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.put_field(name, schema, false);
        self
    }

    /// Builder form of [`StructSchema::put_field`] for optional fields.
    pub fn with_optional_field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.put_field(name, schema, true);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if a field named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by index
    pub fn field_by_index(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Fields in index (insertion) order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields in lexical name order
    pub fn fields_by_name(&self) -> Vec<&Field> {
        let mut sorted: Vec<&Field> = self.fields.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }

    /// Adds a field at the next index, or replaces the schema of an existing
    /// field in place (its index is kept).
    pub fn put_field(&mut self, name: impl Into<String>, schema: Schema, optional: bool) {
        let name = name.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.schema = schema;
            existing.optional = optional;
            return;
        }
        let index = self.fields.len();
        self.fields.push(Field {
            name,
            index,
            schema,
            optional,
        });
    }

    /// Removes a field; the remaining fields are re-indexed contiguously.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        let position = self.fields.iter().position(|f| f.name == name)?;
        let removed = self.fields.remove(position);
        for (index, field) in self.fields.iter_mut().enumerate().skip(position) {
            field.index = index;
        }
        Some(removed)
    }

    /// Renames a field, keeping its schema and index.
    pub fn rename_field(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        if old != new && self.contains(&new) {
            return Err(Error::DuplicateField(new));
        }
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == old)
            .ok_or_else(|| Error::PathNotFound(old.to_string()))?;
        field.name = new;
        Ok(())
    }

    /// Hex-encoded blake3 digest of the structural form of this schema.
    ///
    /// Equal schemas have equal fingerprints regardless of field order.
    pub fn fingerprint(&self) -> String {
        let mut canonical = String::new();
        self.write_canonical(&mut canonical);
        hex::encode(blake3::hash(canonical.as_bytes()).as_bytes())
    }

    fn write_canonical(&self, out: &mut String) {
        out.push_str("STRUCT");
        if let Some(name) = &self.name {
            out.push('<');
            out.push_str(name);
            out.push('>');
        }
        out.push('{');
        for (i, field) in self.fields_by_name().into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.name);
            if field.optional {
                out.push('?');
            }
            out.push(':');
            field.schema.write_canonical(out);
        }
        out.push('}');
    }
}

impl PartialEq for StructSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|field| {
                other.field(&field.name).is_some_and(|o| {
                    o.optional == field.optional && o.schema == field.schema
                })
            })
    }
}

impl Eq for StructSchema {}

impl Hash for StructSchema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.fields.len().hash(state);
        for field in self.fields_by_name() {
            field.name.hash(state);
            field.optional.hash(state);
            field.schema.hash(state);
        }
    }
}

impl fmt::Display for StructSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("STRUCT")?;
        if let Some(name) = &self.name {
            write!(f, "<{name}>")?;
        }
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let marker = if field.optional { "?" } else { "" };
            write!(f, "{}{}:{}", field.name, marker, field.schema)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_struct_equality_ignores_insertion_order() {
        let a = StructSchema::new()
            .with_field("x", Schema::simple(Type::Int))
            .with_field("y", Schema::simple(Type::String));
        let b = StructSchema::new()
            .with_field("y", Schema::simple(Type::String))
            .with_field("x", Schema::simple(Type::Int));

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.field("x").map(Field::index), Some(0));
        assert_eq!(b.field("x").map(Field::index), Some(1));
    }

    #[test]
    fn test_struct_inequality() {
        let a = StructSchema::new().with_field("x", Schema::simple(Type::Int));
        let b = StructSchema::new().with_field("x", Schema::simple(Type::Long));
        let c = StructSchema::named("C").with_field("x", Schema::simple(Type::Int));
        let d = StructSchema::new().with_optional_field("x", Schema::simple(Type::Int));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_remove_reindexes() {
        let mut s = StructSchema::new()
            .with_field("a", Schema::simple(Type::Int))
            .with_field("b", Schema::simple(Type::Int))
            .with_field("c", Schema::simple(Type::Int));

        assert!(s.remove_field("a").is_some());
        s.put_field("d", Schema::simple(Type::String), false);

        let indices: Vec<usize> = s.fields().iter().map(Field::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(s.field("d").map(Field::index), Some(2));
        assert!(s.remove_field("missing").is_none());
    }

    #[test]
    fn test_put_existing_keeps_index() {
        let mut s = StructSchema::new()
            .with_field("a", Schema::simple(Type::Int))
            .with_field("b", Schema::simple(Type::Int));
        s.put_field("a", Schema::simple(Type::String), true);
        let a = s.field("a").expect("field a");
        assert_eq!(a.index(), 0);
        assert_eq!(a.schema(), &Schema::simple(Type::String));
        assert!(a.is_optional());
    }

    #[test]
    fn test_rename_field() {
        let mut s = StructSchema::new()
            .with_field("a", Schema::simple(Type::Int))
            .with_field("b", Schema::simple(Type::Int));
        s.rename_field("a", "z").expect("rename");
        assert_eq!(s.field("z").map(Field::index), Some(0));
        assert!(matches!(
            s.rename_field("z", "b"),
            Err(Error::DuplicateField(ref n)) if n == "b"
        ));
        assert!(matches!(s.rename_field("q", "r"), Err(Error::PathNotFound(_))));
    }

    #[test]
    fn test_fields_by_name_is_lexical() {
        let s = StructSchema::new()
            .with_field("b", Schema::simple(Type::Int))
            .with_field("a", Schema::simple(Type::Int));
        let names: Vec<&str> = s.fields_by_name().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        let s = StructSchema::named("User")
            .with_field("id", Schema::simple(Type::Long))
            .with_optional_field("tags", Schema::array(Schema::simple(Type::String)));
        assert_eq!(
            Schema::from(s).to_string(),
            "STRUCT<User>{id:LONG,tags?:ARRAY<STRING>}"
        );
        assert_eq!(
            Schema::simple(Type::Map).to_string(),
            "MAP<STRING,NULL>"
        );
    }

    #[test]
    fn test_undefined() {
        assert!(Schema::none().is_undefined());
        assert!(Schema::array(Schema::none()).is_undefined());
        assert!(!Schema::array(Schema::simple(Type::Int)).is_undefined());
        assert_eq!(Schema::simple(Type::Array).type_tag(), Type::Array);
    }
}
