// Schema-only merge
//
// Unifies two schemas describing the same logical record observed at
// different times. Struct schemas that end up structurally identical are
// canonicalized through a `SchemaInterner`, so the same shape appearing at
// several paths is one shared `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::internal::error::{Error, Result};
use crate::schema::model::{Schema, StructSchema};
use crate::schema::utils::join_path;

/// Canonicalization table for struct schemas
///
/// Keyed by structural hash and equality: interning two equal struct
/// schemas returns the same shared instance.
#[derive(Debug, Default)]
pub struct SchemaInterner {
    canonical: HashSet<Arc<StructSchema>>,
}

impl SchemaInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical instance for `schema`, registering it if new
    pub fn intern(&mut self, schema: Arc<StructSchema>) -> Arc<StructSchema> {
        if let Some(existing) = self.canonical.get(&*schema) {
            tracing::trace!(fingerprint = %existing.fingerprint(), "struct schema interned");
            return Arc::clone(existing);
        }
        self.canonical.insert(Arc::clone(&schema));
        schema
    }

    /// Interns every struct schema nested in `schema`, bottom-up
    pub fn intern_schema(&mut self, schema: &Schema) -> Schema {
        match schema {
            Schema::Simple(_) => schema.clone(),
            Schema::Array(array) => Schema::array(self.intern_schema(array.element())),
            Schema::Map(map) => Schema::map(
                self.intern_schema(map.key()),
                self.intern_schema(map.value()),
            ),
            Schema::Struct(s) => {
                let mut rebuilt = rebuild_header(s, None);
                for field in s.fields() {
                    let nested = self.intern_schema(field.schema());
                    rebuilt.put_field(field.name(), nested, field.is_optional());
                }
                Schema::Struct(self.intern(Arc::new(rebuilt)))
            }
        }
    }

    /// Number of distinct struct shapes registered
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

/// Schema merge engine
///
/// Holds the interner across calls so that folding many schemas keeps
/// reusing the same canonical struct instances.
#[derive(Debug, Default)]
pub struct SchemaMerger {
    interner: SchemaInterner,
}

impl SchemaMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a merger sharing an existing canonicalization table
    pub fn with_interner(interner: SchemaInterner) -> Self {
        Self { interner }
    }

    pub fn interner(&self) -> &SchemaInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut SchemaInterner {
        &mut self.interner
    }

    pub fn into_interner(self) -> SchemaInterner {
        self.interner
    }

    /// Merges two schemas into a unified schema
    ///
    /// Fails with a type conflict naming the field path and both tags when
    /// the shapes cannot be reconciled. Neither input is modified.
    pub fn merge(&mut self, left: &Schema, right: &Schema) -> Result<Schema> {
        self.merge_at("", left, right)
    }

    /// Like [`SchemaMerger::merge`], reporting conflicts beneath `path`
    pub fn merge_at(&mut self, path: &str, left: &Schema, right: &Schema) -> Result<Schema> {
        match (left, right) {
            (l, r) if r.is_none() => Ok(self.interner.intern_schema(l)),
            (l, r) if l.is_none() => Ok(self.interner.intern_schema(r)),
            (Schema::Struct(l), Schema::Struct(r)) => self.merge_struct(path, l, r),
            (Schema::Array(l), Schema::Array(r)) => {
                let element = self.merge_at(path, l.element(), r.element())?;
                Ok(Schema::array(element))
            }
            (Schema::Array(l), r) => {
                let element = self.merge_at(path, l.element(), r)?;
                Ok(Schema::array(element))
            }
            (l, Schema::Array(r)) => {
                let element = self.merge_at(path, l, r.element())?;
                Ok(Schema::array(element))
            }
            (Schema::Map(l), Schema::Map(r)) => {
                let key = self.merge_at(path, l.key(), r.key())?;
                let value = self.merge_at(path, l.value(), r.value())?;
                Ok(Schema::map(key, value))
            }
            (Schema::Simple(l), Schema::Simple(r)) if l == r => Ok(left.clone()),
            (l, r) => Err(Error::conflict(path, l.conflict_tag(), r.conflict_tag())),
        }
    }

    fn merge_struct(
        &mut self,
        path: &str,
        left: &Arc<StructSchema>,
        right: &Arc<StructSchema>,
    ) -> Result<Schema> {
        let mut merged = rebuild_header(left, Some(right));

        for field in left.fields() {
            match right.field(field.name()) {
                Some(other) => {
                    let field_path = join_path(path, field.name());
                    let schema = self.merge_at(&field_path, field.schema(), other.schema())?;
                    merged.put_field(
                        field.name(),
                        schema,
                        field.is_optional() || other.is_optional(),
                    );
                }
                None => {
                    let schema = self.interner.intern_schema(field.schema());
                    merged.put_field(field.name(), schema, field.is_optional());
                }
            }
        }

        for field in right.fields().iter().filter(|f| !left.contains(f.name())) {
            let schema = self.interner.intern_schema(field.schema());
            merged.put_field(field.name(), schema, field.is_optional());
        }

        Ok(Schema::Struct(self.interner.intern(Arc::new(merged))))
    }
}

/// Copies name and doc of `primary` (falling back to `secondary`) into a new
/// struct schema without fields.
fn rebuild_header(primary: &StructSchema, secondary: Option<&StructSchema>) -> StructSchema {
    let name = primary
        .name()
        .or_else(|| secondary.and_then(StructSchema::name));
    let doc = primary.doc().or_else(|| secondary.and_then(StructSchema::doc));
    let mut rebuilt = match name {
        Some(name) => StructSchema::named(name),
        None => StructSchema::new(),
    };
    if let Some(doc) = doc {
        rebuilt = rebuilt.with_doc(doc);
    }
    rebuilt
}

/// Merges two schemas with a fresh canonicalization table.
pub fn merge_schema(left: &Schema, right: &Schema) -> Result<Schema> {
    SchemaMerger::new().merge(left, right)
}
