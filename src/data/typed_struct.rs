// Typed structs
//
// An ordered, named, mutable container of typed values. Fields live in an
// arena of slots; removal leaves a tombstone and drops the slot from the
// order list, so field indices (positions in the order list) stay
// contiguous. The arena is compacted once tombstones outnumber live fields.

use std::collections::HashMap;

use crate::data::merge::combine;
use crate::data::path;
use crate::data::value::TypedValue;
use crate::internal::error::{Error, Result};
use crate::schema::model::StructSchema;
use crate::schema::types::Type;
use crate::schema::utils::join_path;

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    value: TypedValue,
}

/// A field of a typed struct, borrowed during iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedField<'a> {
    index: usize,
    name: &'a str,
    value: &'a TypedValue,
}

impl<'a> TypedField<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn value(&self) -> &'a TypedValue {
        self.value
    }
}

/// Ordered collection of named typed values with dot-path addressing
#[derive(Debug, Clone, Default)]
pub struct TypedStruct {
    name: Option<String>,
    slots: Vec<Option<Slot>>,
    order: Vec<usize>,
    lookup: HashMap<String, usize>,
}

impl TypedStruct {
    /// Creates an empty anonymous struct
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty named struct
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Shallow membership test for a single field name
    pub fn has(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Returns the value of a top-level field
    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        let slot = *self.lookup.get(name)?;
        self.slots[slot].as_ref().map(|s| &s.value)
    }

    /// Returns the value of a top-level field, mutably
    pub fn field_mut(&mut self, name: &str) -> Option<&mut TypedValue> {
        let slot = *self.lookup.get(name)?;
        self.slots[slot].as_mut().map(|s| &mut s.value)
    }

    /// Returns the index of a top-level field
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let slot = *self.lookup.get(name)?;
        self.order.iter().position(|&id| id == slot)
    }

    /// Sets a top-level field.
    ///
    /// A new name is appended at the next index; an existing name has its
    /// value replaced in place, keeping its index.
    pub fn put(&mut self, name: &str, value: impl Into<TypedValue>) -> Result<&mut Self> {
        path::validate_field_name(name)?;
        self.put_unchecked(name, value.into());
        Ok(self)
    }

    /// Like [`TypedStruct::put`], for names already known to be valid.
    pub(crate) fn put_unchecked(&mut self, name: &str, value: TypedValue) -> Option<TypedValue> {
        if let Some(existing) = self.field_mut(name) {
            return Some(std::mem::replace(existing, value));
        }
        let slot = self.slots.len();
        self.slots.push(Some(Slot {
            name: name.to_string(),
            value,
        }));
        self.order.push(slot);
        self.lookup.insert(name.to_string(), slot);
        None
    }

    /// Removes a top-level field; later fields shift down one index.
    pub fn remove(&mut self, name: &str) -> Option<TypedValue> {
        let slot = self.lookup.remove(name)?;
        self.order.retain(|&id| id != slot);
        let removed = self.slots[slot].take().map(|s| s.value);
        if self.slots.len() > 2 * self.order.len() + 8 {
            self.compact();
        }
        removed
    }

    /// Renames a top-level field, keeping its value and index.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        path::validate_field_name(new)?;
        if old == new {
            return if self.has(old) {
                Ok(())
            } else {
                Err(Error::PathNotFound(old.to_string()))
            };
        }
        if self.has(new) {
            return Err(Error::DuplicateField(new.to_string()));
        }
        let slot = self
            .lookup
            .remove(old)
            .ok_or_else(|| Error::PathNotFound(old.to_string()))?;
        if let Some(s) = self.slots[slot].as_mut() {
            s.name = new.to_string();
        }
        self.lookup.insert(new.to_string(), slot);
        Ok(())
    }

    fn compact(&mut self) {
        let mut slots = Vec::with_capacity(self.order.len());
        for (index, &id) in self.order.iter().enumerate() {
            if let Some(slot) = self.slots[id].take() {
                self.lookup.insert(slot.name.clone(), index);
                slots.push(Some(slot));
            }
        }
        self.order = (0..slots.len()).collect();
        self.slots = slots;
    }

    /// Fields in index order
    pub fn iter(&self) -> impl Iterator<Item = TypedField<'_>> + '_ {
        self.order.iter().enumerate().filter_map(move |(index, &id)| {
            self.slots[id].as_ref().map(|slot| TypedField {
                index,
                name: &slot.name,
                value: &slot.value,
            })
        })
    }

    /// Field names in index order
    pub fn field_names(&self) -> Vec<&str> {
        self.iter().map(|f| f.name).collect()
    }

    /// Consumes the struct into its fields, in index order
    pub fn into_fields(mut self) -> Vec<(String, TypedValue)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.slots[id].take().map(|s| (s.name, s.value)))
            .collect()
    }

    /// Derives the struct schema from the current fields.
    ///
    /// A field is optional when its value is null.
    pub fn schema(&self) -> StructSchema {
        let mut schema = match &self.name {
            Some(name) => StructSchema::named(name.clone()),
            None => StructSchema::new(),
        };
        for field in self.iter() {
            schema.put_field(
                field.name,
                field.value.schema().into_owned(),
                field.value.is_null(),
            );
        }
        schema
    }

    /// Looks up a value by dot-path, failing with `PathNotFound`.
    pub fn get(&self, path: &str) -> Result<&TypedValue> {
        path::split(path)?;
        self.find(path)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))
    }

    /// Looks up a value by dot-path.
    ///
    /// Returns `None` if any segment is missing or an intermediate segment
    /// is not a struct.
    pub fn find(&self, path: &str) -> Option<&TypedValue> {
        let segments = path::split(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.field(segment)?.as_struct().ok()?;
        }
        current.field(last)
    }

    /// Mutable counterpart of [`TypedStruct::find`].
    pub fn find_mut(&mut self, path: &str) -> Option<&mut TypedValue> {
        let segments = path::split(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.field_mut(segment)?.as_struct_mut().ok()?;
        }
        current.field_mut(last)
    }

    /// Returns true if a value exists at the dot-path
    pub fn exists(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Inserts a value at a dot-path.
    ///
    /// Missing intermediate structs are created. If the terminal field
    /// already holds a value, the two are combined: scalars of the same type
    /// become a 2-element array, arrays accumulate further elements and
    /// structs are merged field by field. On failure the struct is left
    /// unchanged.
    pub fn insert(&mut self, path: &str, value: impl Into<TypedValue>) -> Result<&mut Self> {
        let segments = path::split(path)?;
        let value = value.into();
        self.walk_create(&segments, "", |parent, leaf, here| {
            match parent.field_mut(leaf) {
                Some(existing) => {
                    let combined = combine(here, existing.clone(), value)?;
                    tracing::trace!(path = here, "repeated insert combined into array");
                    *existing = combined;
                }
                None => {
                    parent.put_unchecked(leaf, value);
                }
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Sets the value at a dot-path, replacing any previous value.
    ///
    /// Missing intermediate structs are created. Returns the replaced value.
    pub fn replace(
        &mut self,
        path: &str,
        value: impl Into<TypedValue>,
    ) -> Result<Option<TypedValue>> {
        let segments = path::split(path)?;
        let value = value.into();
        self.walk_create(&segments, "", |parent, leaf, _| {
            Ok(parent.put_unchecked(leaf, value))
        })
    }

    /// Descends along `segments`, creating missing intermediate structs, and
    /// hands the struct holding the last segment to `at_leaf`.
    fn walk_create<R, F>(&mut self, segments: &[&str], parent: &str, at_leaf: F) -> Result<R>
    where
        F: FnOnce(&mut TypedStruct, &str, &str) -> Result<R>,
    {
        let Some((head, rest)) = segments.split_first() else {
            return Err(Error::MalformedPath(parent.to_string()));
        };
        let here = join_path(parent, head);
        if rest.is_empty() {
            return at_leaf(self, head, &here);
        }
        if !self.has(head) {
            self.put_unchecked(head, TypedValue::from(TypedStruct::new()));
        }
        let child = self
            .field_mut(head)
            .ok_or_else(|| Error::PathNotFound(here.clone()))?;
        let actual = child.type_tag();
        let child = child
            .as_struct_mut()
            .map_err(|_| Error::conflict(&here, actual, Type::Struct))?;
        child.walk_create(rest, &here, at_leaf)
    }

    /// Removes the value at a dot-path.
    pub fn remove_path(&mut self, path: &str) -> Option<TypedValue> {
        let (parent, leaf) = path::split_leaf(path).ok()?;
        match parent {
            Some(parent) => self.find_mut(parent)?.as_struct_mut().ok()?.remove(leaf),
            None => self.remove(leaf),
        }
    }

    fn typed<T>(&self, path: &str, get: impl FnOnce(&TypedValue) -> Result<T>) -> Result<T> {
        get(self.get(path)?).map_err(|e| e.within(path))
    }

    pub fn get_bool(&self, path: &str) -> Result<bool> {
        self.typed(path, TypedValue::as_bool)
    }

    pub fn get_i32(&self, path: &str) -> Result<i32> {
        self.typed(path, TypedValue::as_i32)
    }

    pub fn get_i64(&self, path: &str) -> Result<i64> {
        self.typed(path, TypedValue::as_i64)
    }

    pub fn get_f64(&self, path: &str) -> Result<f64> {
        self.typed(path, TypedValue::as_f64)
    }

    pub fn get_str(&self, path: &str) -> Result<&str> {
        let value = self.get(path)?;
        value.as_str().map_err(|e| e.within(path))
    }

    pub fn get_struct(&self, path: &str) -> Result<&TypedStruct> {
        let value = self.get(path)?;
        value.as_struct().map_err(|e| e.within(path))
    }

    pub fn get_array(&self, path: &str) -> Result<&[TypedValue]> {
        let value = self.get(path)?;
        value.as_array().map_err(|e| e.within(path))
    }
}

impl PartialEq for TypedStruct {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::Schema;

    fn sample() -> TypedStruct {
        let mut s = TypedStruct::new();
        s.put("a", 1)
            .and_then(|s| s.put("b", "two"))
            .and_then(|s| s.put("c", true))
            .expect("put");
        s
    }

    fn indices(s: &TypedStruct) -> Vec<usize> {
        s.iter().map(|f| f.index()).collect()
    }

    #[test]
    fn test_put_appends_and_overwrites_in_place() {
        let mut s = sample();
        assert_eq!(s.field_names(), vec!["a", "b", "c"]);
        s.put("b", 2.5).expect("put");
        assert_eq!(s.field_names(), vec!["a", "b", "c"]);
        assert_eq!(s.index_of("b"), Some(1));
        assert_eq!(s.get_f64("b"), Ok(2.5));
    }

    #[test]
    fn test_put_rejects_malformed_names() {
        let mut s = TypedStruct::new();
        assert_eq!(s.put("", 1).err(), Some(Error::MalformedPath(String::new())));
        assert!(s.put("a.b", 1).is_err());
        assert!(s.is_empty());
    }

    #[test]
    fn test_remove_reindexes_contiguously() {
        let mut s = sample();
        assert_eq!(s.remove("a"), Some(TypedValue::from(1)));
        s.put("d", 4_i64).expect("put");
        assert_eq!(s.field_names(), vec!["b", "c", "d"]);
        assert_eq!(indices(&s), vec![0, 1, 2]);
        assert_eq!(s.index_of("d"), Some(2));
        assert!(s.remove("missing").is_none());
    }

    #[test]
    fn test_many_removals_compact() {
        let mut s = TypedStruct::new();
        for i in 0..40 {
            s.put(&format!("f{i}"), i).expect("put");
        }
        for i in 0..38 {
            s.remove(&format!("f{i}"));
        }
        assert_eq!(s.field_names(), vec!["f38", "f39"]);
        assert_eq!(indices(&s), vec![0, 1]);
        assert_eq!(s.get_i32("f39"), Ok(39));
        s.put("g", 1).expect("put");
        assert_eq!(s.index_of("g"), Some(2));
    }

    #[test]
    fn test_rename_keeps_index_and_value() {
        let mut s = sample();
        s.rename("b", "beta").expect("rename");
        assert_eq!(s.field_names(), vec!["a", "beta", "c"]);
        assert_eq!(s.get_str("beta"), Ok("two"));
        assert!(!s.has("b"));
        assert_eq!(s.rename("a", "c"), Err(Error::DuplicateField("c".into())));
        assert_eq!(s.rename("zz", "y"), Err(Error::PathNotFound("zz".into())));
        assert!(s.rename("a", "x.y").is_err());
    }

    #[test]
    fn test_insert_creates_intermediate_structs() {
        let mut s = TypedStruct::new();
        s.insert("user.address.city", "Paris").expect("insert");
        assert!(s.exists("user.address"));
        assert_eq!(s.get_str("user.address.city"), Ok("Paris"));
        assert!(s.get("user").map(|v| v.type_tag()) == Ok(Type::Struct));
        assert!(!s.exists("user.name"));
    }

    #[test]
    fn test_insert_accumulates_into_array() {
        let mut s = TypedStruct::new();
        s.insert("tag", "a").expect("insert");
        s.insert("tag", "b").expect("insert");
        s.insert("tag", "c").expect("insert");
        let tags: Vec<&str> = s
            .get_array("tag")
            .expect("array")
            .iter()
            .filter_map(|v| v.as_str().ok())
            .collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
        assert_eq!(
            s.get("tag").map(|v| v.schema().into_owned()),
            Ok(Schema::array(Schema::simple(Type::String)))
        );
    }

    #[test]
    fn test_insert_conflict_leaves_struct_unchanged() {
        let mut s = TypedStruct::new();
        s.insert("a.b", 1).expect("insert");
        let before = s.clone();
        let err = s.insert("a.b", "text").err().expect("conflict");
        assert_eq!(
            err,
            Error::TypeConflict {
                path: "a.b".into(),
                left: Type::Int,
                right: Type::String,
            }
        );
        assert_eq!(s, before);
    }

    #[test]
    fn test_insert_through_scalar_fails() {
        let mut s = sample();
        let err = s.insert("a.x", 1).err().expect("conflict");
        assert_eq!(
            err,
            Error::TypeConflict {
                path: "a".into(),
                left: Type::Int,
                right: Type::Struct,
            }
        );
    }

    #[test]
    fn test_find_and_get() {
        let mut s = TypedStruct::new();
        s.insert("x.y", 5_i64).expect("insert");
        assert_eq!(s.find("x.y"), Some(&TypedValue::from(5_i64)));
        assert_eq!(s.find("x.z"), None);
        assert_eq!(s.find("x.y.z"), None);
        assert_eq!(s.find(""), None);
        assert_eq!(s.get("x.z"), Err(Error::PathNotFound("x.z".into())));
        assert_eq!(s.get("x..z"), Err(Error::MalformedPath("x..z".into())));
        assert!(s.has("x"));
        assert!(!s.has("x.y"));
    }

    #[test]
    fn test_typed_getter_mismatch_names_field() {
        let s = sample();
        assert_eq!(
            s.get_i64("b"),
            Err(Error::TypeMismatch {
                field: "b".into(),
                expected: Type::Long,
                actual: Type::String,
            })
        );
    }

    #[test]
    fn test_replace_overwrites() {
        let mut s = TypedStruct::new();
        s.insert("a.b", 1).expect("insert");
        let old = s.replace("a.b", "x").expect("replace");
        assert_eq!(old, Some(TypedValue::from(1)));
        assert_eq!(s.get_str("a.b"), Ok("x"));
        assert_eq!(s.replace("a.c", 2).expect("replace"), None);
    }

    #[test]
    fn test_remove_path() {
        let mut s = TypedStruct::new();
        s.insert("a.b", 1).and_then(|s| s.insert("a.c", 2)).expect("insert");
        assert_eq!(s.remove_path("a.b"), Some(TypedValue::from(1)));
        assert_eq!(s.get_struct("a").map(TypedStruct::field_names), Ok(vec!["c"]));
        assert_eq!(s.remove_path("a.zz"), None);
        assert!(s.remove_path("a").is_some());
        assert!(s.is_empty());
    }

    #[test]
    fn test_schema_marks_null_fields_optional() {
        let mut s = TypedStruct::named("Row");
        s.put("id", 1_i64)
            .and_then(|s| s.put("note", TypedValue::null_of(Schema::simple(Type::String))))
            .expect("put");
        let expected = StructSchema::named("Row")
            .with_field("id", Schema::simple(Type::Long))
            .with_optional_field("note", Schema::simple(Type::String));
        assert_eq!(s.schema(), expected);
    }

    #[test]
    fn test_into_fields_order() {
        let mut s = sample();
        s.remove("a");
        let names: Vec<String> = s.into_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "c"]);
    }
}
