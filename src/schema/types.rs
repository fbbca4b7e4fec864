// Type tags for the typedata model
//
// Every schema and every typed value carries exactly one of these tags.
// Composite tags (array, map, struct) additionally carry nested schemas,
// which live in `schema::model`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the closed set of kinds a value or schema can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Type {
    /// Boolean type
    Boolean,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit floating point (IEEE 754)
    Float,
    /// 64-bit floating point (IEEE 754)
    Double,
    /// UTF-8 encoded string
    String,
    /// Binary data
    Bytes,
    /// Ordered sequence sharing one element schema
    Array,
    /// String-keyed map
    Map,
    /// Ordered named fields
    Struct,
    /// Null, or a value whose type is not known yet
    Null,
}

impl Type {
    /// All tags, in declaration order.
    pub const ALL: [Type; 12] = [
        Type::Boolean,
        Type::Short,
        Type::Int,
        Type::Long,
        Type::Float,
        Type::Double,
        Type::String,
        Type::Bytes,
        Type::Array,
        Type::Map,
        Type::Struct,
        Type::Null,
    ];

    /// Returns the upper-case name of the tag (e.g. "LONG")
    pub fn name(&self) -> &'static str {
        match self {
            Type::Boolean => "BOOLEAN",
            Type::Short => "SHORT",
            Type::Int => "INT",
            Type::Long => "LONG",
            Type::Float => "FLOAT",
            Type::Double => "DOUBLE",
            Type::String => "STRING",
            Type::Bytes => "BYTES",
            Type::Array => "ARRAY",
            Type::Map => "MAP",
            Type::Struct => "STRUCT",
            Type::Null => "NULL",
        }
    }

    /// Returns true if this type is neither composite nor null
    pub fn is_primitive(&self) -> bool {
        !self.is_composite() && *self != Type::Null
    }

    /// Returns true if this type is a numeric type
    pub fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// Returns true if this type is an integer type
    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Short | Type::Int | Type::Long)
    }

    /// Returns true if this type is a floating point type
    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    /// Returns true if this type is a composite type (array, map, struct)
    pub fn is_composite(&self) -> bool {
        matches!(self, Type::Array | Type::Map | Type::Struct)
    }

    /// Rank of a numeric type along the widening chain.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            Type::Short => Some(0),
            Type::Int => Some(1),
            Type::Long => Some(2),
            Type::Float => Some(3),
            Type::Double => Some(4),
            _ => None,
        }
    }

    /// Returns true if every value of this type is representable in `target`
    /// without loss of range.
    ///
    /// Integral types widen to wider integral types and to DOUBLE; FLOAT
    /// widens to DOUBLE. Every primitive widens to STRING.
    pub fn widens_to(&self, target: Type) -> bool {
        if *self == target {
            return true;
        }
        match (self.numeric_rank(), target.numeric_rank()) {
            (Some(from), Some(to)) => {
                if self.is_integral() && target == Type::Float {
                    // f32 cannot hold every INT/LONG
                    *self == Type::Short
                } else {
                    from < to
                }
            }
            _ => target == Type::String && self.is_primitive(),
        }
    }

    /// Returns true if a conversion from this type to `target` may succeed
    /// for some value (not necessarily all).
    pub fn can_coerce_to(&self, target: Type) -> bool {
        if *self == target || *self == Type::Null {
            return true;
        }
        match (*self, target) {
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (a, Type::String) => a.is_primitive(),
            (Type::String, b) => b.is_primitive(),
            (Type::Bytes, Type::String) | (Type::String, Type::Bytes) => true,
            (Type::Boolean, b) | (b, Type::Boolean) => b.is_integral(),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
