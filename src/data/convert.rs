// Coercion between type tags
//
// Numeric conversions are range checked so that values are never silently
// truncated; text converts through the same literal rules as `parse`.

use bytes::Bytes;

use crate::data::value::{TypedValue, Value};
use crate::internal::error::{Error, Result};
use crate::schema::model::Schema;
use crate::schema::types::Type;

impl TypedValue {
    /// Converts this value to `target`.
    ///
    /// Nulls convert to a null of the target type. Widening (see
    /// `Type::widens_to`) skips the range checks; narrowing succeeds only
    /// when the value fits. Strings parse
    /// into numbers and booleans, primitives render to strings, and bytes
    /// convert to and from UTF-8 strings.
    #[allow(clippy::cast_possible_truncation)]
    pub fn convert(&self, target: Type) -> Result<TypedValue> {
        if self.type_tag() == target {
            return Ok(self.clone());
        }
        if self.is_null() {
            return Ok(TypedValue::null_of(Schema::simple(target)));
        }
        if !self.type_tag().can_coerce_to(target) {
            return Err(self.unsupported(target));
        }
        let widening = self.type_tag().widens_to(target);
        match target {
            Type::String => self.render().map(TypedValue::string),
            Type::Bytes => Ok(TypedValue::bytes(Bytes::from(self.as_str()?.to_string()))),
            Type::Boolean => self.to_boolean().map(TypedValue::boolean),
            Type::Double => self.to_f64().map(TypedValue::double),
            Type::Float => {
                let v = self.to_f64()?;
                if !widening && v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(out_of_range(v, target));
                }
                Ok(TypedValue::float(v as f32))
            }
            Type::Long => self.to_i64().map(TypedValue::long),
            Type::Int if widening => self.as_i32().map(TypedValue::int),
            Type::Int => {
                let v = self.to_i64()?;
                i32::try_from(v)
                    .map(TypedValue::int)
                    .map_err(|_| out_of_range(v, target))
            }
            Type::Short => {
                let v = self.to_i64()?;
                i16::try_from(v)
                    .map(TypedValue::short)
                    .map_err(|_| out_of_range(v, target))
            }
            _ => Err(self.unsupported(target)),
        }
    }

    fn unsupported(&self, target: Type) -> Error {
        Error::ConversionError(format!(
            "cannot convert {} to {}",
            self.type_tag(),
            target
        ))
    }

    /// Text form of a primitive value
    fn render(&self) -> Result<String> {
        match self.value() {
            Value::Boolean(v) => Ok(v.to_string()),
            Value::Short(v) => Ok(v.to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Long(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Double(v) => Ok(v.to_string()),
            Value::String(v) => Ok(v.clone()),
            Value::Bytes(v) => String::from_utf8(v.to_vec())
                .map_err(|e| Error::ConversionError(format!("bytes are not UTF-8: {e}"))),
            _ => Err(self.unsupported(Type::String)),
        }
    }

    fn to_boolean(&self) -> Result<bool> {
        match self.value() {
            Value::Boolean(v) => Ok(*v),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            Value::Short(_) | Value::Int(_) | Value::Long(_) => match self.as_i64()? {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(out_of_range(other, Type::Boolean)),
            },
            _ => Err(self.unsupported(Type::Boolean)),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn to_i64(&self) -> Result<i64> {
        match self.value() {
            Value::Boolean(v) => Ok(i64::from(*v)),
            Value::Short(_) | Value::Int(_) | Value::Long(_) => self.as_i64(),
            Value::Float(_) | Value::Double(_) => {
                let v = self.as_f64()?;
                let in_range = v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64;
                if in_range {
                    Ok(v as i64)
                } else {
                    Err(out_of_range(v, Type::Long))
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| Error::ConversionError(format!("'{s}' is not an integer: {e}"))),
            _ => Err(self.unsupported(Type::Long)),
        }
    }

    fn to_f64(&self) -> Result<f64> {
        match self.value() {
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| Error::ConversionError(format!("'{s}' is not a number: {e}"))),
            _ => self.as_f64().map_err(|_| self.unsupported(Type::Double)),
        }
    }
}

fn out_of_range(value: impl std::fmt::Display, target: Type) -> Error {
    Error::ConversionError(format!("value {value} is out of range for {target}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_widening() {
        assert_eq!(TypedValue::short(3).convert(Type::Long), Ok(TypedValue::long(3)));
        assert_eq!(TypedValue::int(3).convert(Type::Double), Ok(TypedValue::double(3.0)));
        assert_eq!(TypedValue::float(1.5).convert(Type::Double), Ok(TypedValue::double(1.5)));
    }

    #[test]
    fn test_widening_never_fails() {
        let samples = [
            TypedValue::boolean(true),
            TypedValue::short(i16::MIN),
            TypedValue::int(i32::MAX),
            TypedValue::long(i64::MIN),
            TypedValue::float(f32::MAX),
            TypedValue::double(f64::MIN_POSITIVE),
            TypedValue::from("text"),
            TypedValue::bytes(b"ascii".to_vec()),
        ];
        for sample in &samples {
            for target in Type::ALL {
                if sample.type_tag().widens_to(target) {
                    let converted = sample.convert(target).expect("widening");
                    assert_eq!(converted.type_tag(), target);
                }
            }
        }
        assert_eq!(TypedValue::short(-7).convert(Type::Float), Ok(TypedValue::float(-7.0)));
    }

    #[test]
    fn test_numeric_narrowing_is_checked() {
        assert_eq!(TypedValue::long(12).convert(Type::Short), Ok(TypedValue::short(12)));
        assert!(TypedValue::long(70_000).convert(Type::Short).is_err());
        assert!(TypedValue::long(i64::MAX).convert(Type::Int).is_err());
        assert_eq!(TypedValue::double(4.0).convert(Type::Int), Ok(TypedValue::int(4)));
        assert!(TypedValue::double(4.5).convert(Type::Int).is_err());
        assert!(TypedValue::double(1e300).convert(Type::Float).is_err());
    }

    #[test]
    fn test_string_conversions() {
        assert_eq!(TypedValue::from("12").convert(Type::Int), Ok(TypedValue::int(12)));
        assert_eq!(TypedValue::from("TRUE").convert(Type::Boolean), Ok(TypedValue::boolean(true)));
        assert_eq!(TypedValue::from("2.5").convert(Type::Double), Ok(TypedValue::double(2.5)));
        assert!(TypedValue::from("abc").convert(Type::Long).is_err());
        assert_eq!(TypedValue::long(-4).convert(Type::String), Ok(TypedValue::from("-4")));
        assert_eq!(TypedValue::boolean(false).convert(Type::String), Ok(TypedValue::from("false")));
    }

    #[test]
    fn test_bytes_and_strings() {
        let bytes = TypedValue::from("hé").convert(Type::Bytes).expect("bytes");
        assert_eq!(bytes.as_bytes().map(|b| b.to_vec()), Ok("hé".as_bytes().to_vec()));
        assert_eq!(bytes.convert(Type::String), Ok(TypedValue::from("hé")));
        let invalid = TypedValue::bytes(vec![0xff_u8, 0xfe]);
        assert!(invalid.convert(Type::String).is_err());
    }

    #[test]
    fn test_booleans_and_integers() {
        assert_eq!(TypedValue::boolean(true).convert(Type::Int), Ok(TypedValue::int(1)));
        assert_eq!(TypedValue::int(0).convert(Type::Boolean), Ok(TypedValue::boolean(false)));
        assert!(TypedValue::int(2).convert(Type::Boolean).is_err());
    }

    #[test]
    fn test_null_and_unsupported() {
        let null = TypedValue::null().convert(Type::Long).expect("null");
        assert!(null.is_null());
        assert_eq!(null.type_tag(), Type::Long);
        assert!(matches!(
            TypedValue::from(crate::data::typed_struct::TypedStruct::new()).convert(Type::String),
            Err(Error::ConversionError(_))
        ));
    }
}
