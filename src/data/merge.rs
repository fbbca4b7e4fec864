// Value merge
//
// Folds two typed structs describing the same logical record into a new
// struct. Fields present on both sides are combined additively: nested
// structs merge recursively, everything else accumulates into an array
// (left elements first, no deduplication). Paths listed in the overwrite
// set take the right-hand value instead.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::typed_struct::TypedStruct;
use crate::data::value::{TypedValue, Value};
use crate::internal::error::{Error, Result};
use crate::schema::merge::SchemaMerger;
use crate::schema::model::Schema;
use crate::schema::utils::{join_path, sub_path};

/// Set of dot-paths whose left-hand value is discarded during a value merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverwritePaths(BTreeSet<String>);

impl OverwritePaths {
    /// The empty set: every shared field is combined
    pub fn none() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>) {
        self.0.insert(path.into());
    }

    /// Returns true if `field` (relative to the current struct) is listed
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    /// The paths beneath `field`, relative to it
    pub fn narrow(&self, field: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter_map(|p| sub_path(p, field))
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for OverwritePaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Merges two structs into a new struct.
///
/// For each field of `left`: kept as-is if `right` lacks it; dropped in
/// favor of `right` if listed in `overwrite`; merged recursively if both
/// sides are structs; otherwise combined into one array. Fields only in
/// `right` (and overwritten fields) follow, in `right`'s order.
///
/// Fails with a type conflict naming the field path and both types when a
/// shared field cannot be reconciled. Inputs are never modified.
pub fn merge_values(
    left: &TypedStruct,
    right: &TypedStruct,
    overwrite: &OverwritePaths,
) -> Result<TypedStruct> {
    merge_structs("", left, right, overwrite)
}

fn merge_structs(
    path: &str,
    left: &TypedStruct,
    right: &TypedStruct,
    overwrite: &OverwritePaths,
) -> Result<TypedStruct> {
    let mut merged = match left.name().or(right.name()) {
        Some(name) => TypedStruct::named(name),
        None => TypedStruct::new(),
    };

    for field in left.iter() {
        let name = field.name();
        let Some(other) = right.field(name) else {
            merged.put_unchecked(name, field.value().clone());
            continue;
        };
        if overwrite.contains(name) {
            continue;
        }
        let field_path = join_path(path, name);
        let value = match (field.value().value(), other.value()) {
            (Value::Struct(l), Value::Struct(r)) => {
                let nested = merge_structs(&field_path, l, r, &overwrite.narrow(name))?;
                TypedValue::from(nested)
            }
            _ => combine(&field_path, field.value().clone(), other.clone())?,
        };
        merged.put_unchecked(name, value);
    }

    for field in right.iter() {
        if !merged.has(field.name()) {
            merged.put_unchecked(field.name(), field.value().clone());
        }
    }

    Ok(merged)
}

/// Combines two values observed for the same field.
///
/// Structs merge field by field. Any other pairing must be compatible under
/// schema merge (same type, or array and scalar of the same element type)
/// and yields an array of left's element(s) followed by right's. A side
/// that is itself one element of the merged array (a scalar, or an inner
/// array of a nested array) is added whole; an array of such elements is
/// spread.
pub(crate) fn combine(path: &str, left: TypedValue, right: TypedValue) -> Result<TypedValue> {
    if let (Value::Struct(l), Value::Struct(r)) = (left.value(), right.value()) {
        return merge_structs(path, l, r, &OverwritePaths::none()).map(TypedValue::from);
    }

    let (left_schema, right_schema) = (left.schema().into_owned(), right.schema().into_owned());
    let merged = SchemaMerger::new().merge_at(path, &left_schema, &right_schema)?;
    let element = merged.element_or_self().clone();
    let depth = array_depth(&element);

    let mut items = Vec::new();
    for (side, schema) in [(left, &left_schema), (right, &right_schema)] {
        let spread_undefined = matches!(side.value(), Value::Array(_))
            && schema.element_or_self().is_undefined();
        if spread_undefined {
            items.extend(side.into_items());
        } else if side.is_null() || array_depth(schema) == depth {
            items.push(side);
        } else if matches!(side.value(), Value::Array(_))
            && array_depth(schema.element_or_self()) == depth
        {
            items.extend(side.into_items());
        } else {
            return Err(Error::conflict(
                path,
                left_schema.conflict_tag(),
                right_schema.conflict_tag(),
            ));
        }
    }
    Ok(TypedValue::from_parts(Schema::array(element), Value::Array(items)))
}

/// Number of array levels wrapped around a non-array schema
fn array_depth(schema: &Schema) -> usize {
    match schema {
        Schema::Array(array) => 1 + array_depth(array.element()),
        _ => 0,
    }
}
