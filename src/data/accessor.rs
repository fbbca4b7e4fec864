// Key-based access into container values
//
// Filters address values by string keys without knowing the container
// kind up front. Each container kind has a handler implementing
// `PropertyAccessor`; handlers are looked up by type tag in a registry that
// is built once on first use and read-only afterwards.

use std::sync::LazyLock;

use crate::data::path;
use crate::data::typed_struct::TypedStruct;
use crate::data::value::TypedValue;
use crate::internal::error::{Error, Result};
use crate::schema::merge::SchemaMerger;
use crate::schema::model::Schema;
use crate::schema::types::Type;
use crate::schema::utils::join_path;

/// Gettable/settable-by-key capability of one container kind
pub trait PropertyAccessor: Send + Sync {
    /// The type tag this handler serves
    fn kind(&self) -> Type;

    /// Reads the value stored under `key`
    fn read<'a>(&self, target: &'a TypedValue, key: &str) -> Option<&'a TypedValue>;

    /// Reads the value stored under `key`, mutably
    fn read_mut<'a>(&self, target: &'a mut TypedValue, key: &str) -> Option<&'a mut TypedValue>;

    /// Stores `value` under `key`, replacing any previous value
    fn write(&self, target: &mut TypedValue, key: &str, value: TypedValue) -> Result<()>;
}

/// Struct fields by name
struct StructAccessor;

impl PropertyAccessor for StructAccessor {
    fn kind(&self) -> Type {
        Type::Struct
    }

    fn read<'a>(&self, target: &'a TypedValue, key: &str) -> Option<&'a TypedValue> {
        target.as_struct().ok()?.field(key)
    }

    fn read_mut<'a>(&self, target: &'a mut TypedValue, key: &str) -> Option<&'a mut TypedValue> {
        target.as_struct_mut().ok()?.field_mut(key)
    }

    fn write(&self, target: &mut TypedValue, key: &str, value: TypedValue) -> Result<()> {
        target.as_struct_mut()?.put(key, value)?;
        Ok(())
    }
}

/// Map entries by key
struct MapAccessor;

impl PropertyAccessor for MapAccessor {
    fn kind(&self) -> Type {
        Type::Map
    }

    fn read<'a>(&self, target: &'a TypedValue, key: &str) -> Option<&'a TypedValue> {
        target.as_map().ok()?.get(key)
    }

    fn read_mut<'a>(&self, target: &'a mut TypedValue, key: &str) -> Option<&'a mut TypedValue> {
        target.as_map_mut()?.get_mut(key)
    }

    fn write(&self, target: &mut TypedValue, key: &str, value: TypedValue) -> Result<()> {
        let declared = match &*target.schema() {
            Schema::Map(map) => map.value().clone(),
            _ => return Err(Error::MalformedPath(key.to_string())),
        };
        check_compatible(key, &declared, &value)?;
        let entries = target
            .as_map_mut()
            .ok_or_else(|| Error::MalformedPath(key.to_string()))?;
        entries.insert(key.to_string(), value);
        target.refresh_schema()
    }
}

/// Entries and items must stay within the container's declared element
/// schema; the check runs against the schema before the write, so replacing
/// the only entry cannot silently retype the container
fn check_compatible(key: &str, declared: &Schema, value: &TypedValue) -> Result<()> {
    SchemaMerger::new().merge_at(key, declared, &value.schema())?;
    Ok(())
}

/// Array items by decimal index; writing at the length appends
struct ArrayAccessor;

fn parse_index(key: &str) -> Option<usize> {
    if key.bytes().all(|b| b.is_ascii_digit()) {
        key.parse().ok()
    } else {
        None
    }
}

impl PropertyAccessor for ArrayAccessor {
    fn kind(&self) -> Type {
        Type::Array
    }

    fn read<'a>(&self, target: &'a TypedValue, key: &str) -> Option<&'a TypedValue> {
        target.as_array().ok()?.get(parse_index(key)?)
    }

    fn read_mut<'a>(&self, target: &'a mut TypedValue, key: &str) -> Option<&'a mut TypedValue> {
        let index = parse_index(key)?;
        target.as_array_mut()?.get_mut(index)
    }

    fn write(&self, target: &mut TypedValue, key: &str, value: TypedValue) -> Result<()> {
        let index = parse_index(key).ok_or_else(|| Error::MalformedPath(key.to_string()))?;
        let declared = match &*target.schema() {
            Schema::Array(array) => array.element().clone(),
            _ => return Err(Error::MalformedPath(key.to_string())),
        };
        if index <= target.as_array()?.len() {
            check_compatible(key, &declared, &value)?;
        }
        let items = target
            .as_array_mut()
            .ok_or_else(|| Error::MalformedPath(key.to_string()))?;
        match index {
            i if i < items.len() => items[i] = value,
            i if i == items.len() => items.push(value),
            _ => return Err(Error::PathNotFound(key.to_string())),
        }
        target.refresh_schema()
    }
}

/// Ordered list of accessor handlers, chosen by runtime type tag
pub struct AccessorRegistry {
    handlers: Vec<Box<dyn PropertyAccessor>>,
}

impl AccessorRegistry {
    /// Registry with the struct, map and array handlers
    pub fn builtin() -> Self {
        Self {
            handlers: vec![
                Box::new(StructAccessor),
                Box::new(MapAccessor),
                Box::new(ArrayAccessor),
            ],
        }
    }

    /// Returns the handler for `kind`
    pub fn get(&self, kind: Type) -> Option<&dyn PropertyAccessor> {
        self.handlers
            .iter()
            .find(|h| h.kind() == kind)
            .map(|h| h.as_ref())
    }

    /// Reads the value at a dot-path through structs, maps and arrays.
    pub fn read_path<'a>(&self, root: &'a TypedValue, path: &str) -> Option<&'a TypedValue> {
        let mut current = root;
        for key in path::split(path).ok()? {
            current = self.get(current.type_tag())?.read(current, key)?;
        }
        Some(current)
    }

    /// Writes `value` at a dot-path through structs, maps and arrays.
    ///
    /// Every intermediate container must exist. The write is applied to a
    /// copy that replaces `root` only on success, so a failed write leaves
    /// `root` untouched.
    pub fn write_path(&self, root: &mut TypedValue, path: &str, value: TypedValue) -> Result<()> {
        let segments = path::split(path)?;
        let mut copy = root.clone();
        self.write_segments(&mut copy, &segments, "", value)?;
        *root = copy;
        Ok(())
    }

    fn write_segments(
        &self,
        target: &mut TypedValue,
        segments: &[&str],
        parent: &str,
        value: TypedValue,
    ) -> Result<()> {
        let Some((key, rest)) = segments.split_first() else {
            return Err(Error::MalformedPath(parent.to_string()));
        };
        let here = join_path(parent, key);
        let handler = self
            .get(target.type_tag())
            .ok_or_else(|| Error::conflict(parent, target.type_tag(), Type::Struct))?;
        if rest.is_empty() {
            return handler.write(target, key, value).map_err(|e| match e {
                Error::PathNotFound(_) => Error::PathNotFound(here.clone()),
                other => other.within(parent),
            });
        }
        let child = handler
            .read_mut(target, key)
            .ok_or_else(|| Error::PathNotFound(here.clone()))?;
        self.write_segments(child, rest, &here, value)?;
        target.refresh_schema()
    }
}

/// Process-wide accessor registry, frozen after first use
pub static ACCESSORS: LazyLock<AccessorRegistry> = LazyLock::new(AccessorRegistry::builtin);

/// Reads the value at a dot-path using the global registry
pub fn read_path<'a>(root: &'a TypedValue, path: &str) -> Option<&'a TypedValue> {
    ACCESSORS.read_path(root, path)
}

/// Writes the value at a dot-path using the global registry
pub fn write_path(root: &mut TypedValue, path: &str, value: TypedValue) -> Result<()> {
    ACCESSORS.write_path(root, path, value)
}

impl TypedStruct {
    /// Reads through nested structs, maps and arrays (`"items.0.name"`)
    pub fn read_path(&self, path: &str) -> Option<&TypedValue> {
        let (head, rest) = match path.split_once(path::SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.field(head)?;
        match rest {
            Some(rest) => read_path(value, rest),
            None => Some(value),
        }
    }
}
