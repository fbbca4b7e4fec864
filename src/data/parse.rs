// Type inference from text
//
// Format readers that only see text (delimited files, XML content) hand
// their tokens to `parse`, which picks the narrowest type the literal fits.

use crate::data::value::TypedValue;

impl TypedValue {
    /// Parses a string into the narrowest fitting typed value.
    ///
    /// Tries, in order: a boolean literal (`true`/`false`, any case), an
    /// integer literal (INT if it fits 32 bits, else LONG), a finite
    /// floating literal (DOUBLE). Anything else, including integer literals
    /// too large for 64 bits, is kept verbatim as a STRING.
    pub fn parse(text: &str) -> TypedValue {
        parse(text)
    }
}

/// See [`TypedValue::parse`].
pub fn parse(text: &str) -> TypedValue {
    if text.eq_ignore_ascii_case("true") {
        return TypedValue::boolean(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return TypedValue::boolean(false);
    }
    if is_integer_literal(text) {
        return match text.parse::<i64>() {
            Ok(v) => match i32::try_from(v) {
                Ok(narrow) => TypedValue::int(narrow),
                Err(_) => TypedValue::long(v),
            },
            Err(_) => TypedValue::string(text),
        };
    }
    if is_float_literal(text) {
        if let Ok(v) = text.parse::<f64>() {
            if v.is_finite() {
                return TypedValue::double(v);
            }
        }
    }
    TypedValue::string(text)
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Rejects the named specials (`inf`, `NaN`) that `f64::from_str` accepts.
fn is_float_literal(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}
