// typedata library entry point
//
// A self-describing, semi-structured value model: every value carries its
// schema, schemas can be inferred from samples and merged structurally, and
// typed structs can be folded into one another with additive semantics.

pub mod codec;
pub mod data;
pub mod internal;
pub mod schema;

pub use crate::data::{merge_values, parse, OverwritePaths, TypedStruct, TypedValue, Value};
pub use crate::internal::error::{Error, Result};
pub use crate::schema::{
    merge_schema, ArraySchema, Field, MapSchema, Schema, SchemaInference, SchemaMerger,
    StructSchema, Type,
};
