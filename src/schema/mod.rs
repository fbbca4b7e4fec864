// Schema module for the typedata model
//
// This module provides the shape side of the model:
//
// 1. Type tags shared by schemas and values
// 2. The schema hierarchy (simple, array, map, struct)
// 3. Schema merge with canonical struct interning
// 4. Schema inference from sample values
// 5. The mapper protocol for downstream representations

// Re-export public types and functions
pub use self::inference::{infer_element_schema, InferenceConfig, SchemaInference};
pub use self::mapper::{
    normalize_schema_name, MapperConfig, SchemaMapper, SchemaMapperWithValue,
};
pub use self::merge::{merge_schema, SchemaInterner, SchemaMerger};
pub use self::model::{ArraySchema, Field, MapSchema, Schema, StructSchema};
pub use self::types::Type;

// Sub-modules
pub mod inference;
pub mod mapper;
pub mod merge;
pub mod model;
pub mod types;

// Internal module for shared utilities
pub(crate) mod utils;
