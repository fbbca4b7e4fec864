// Typed data module
//
// This module provides the runtime value model:
//
// 1. Typed values carrying their own schema
// 2. Typed structs with ordered, indexed, path-addressable fields
// 3. Value merge with overwrite paths
// 4. Text parsing and coercion between types
// 5. Key-based accessors for filters

// Re-export public types and functions
pub use self::accessor::{read_path, write_path, AccessorRegistry, PropertyAccessor, ACCESSORS};
pub use self::merge::{merge_values, OverwritePaths};
pub use self::parse::parse;
pub use self::typed_struct::{TypedField, TypedStruct};
pub use self::value::{TypedValue, Value};

// Sub-modules
pub mod accessor;
pub mod convert;
pub mod merge;
pub mod parse;
pub mod path;
pub mod typed_struct;
pub mod value;
