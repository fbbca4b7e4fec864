// Dot-path handling for nested field addressing

use crate::internal::error::{Error, Result};

/// Separator between the segments of a field path.
pub const SEPARATOR: char = '.';

/// Checks that `name` can be used as a field name: non-empty and free of
/// the path separator.
pub fn validate_field_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(Error::MalformedPath(name.to_string()));
    }
    Ok(())
}

/// Splits a dot-path into its segments.
///
/// Fails on an empty path and on empty segments (`"a..b"`, `".a"`, `"a."`).
pub fn split(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::MalformedPath(path.to_string()));
    }
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::MalformedPath(path.to_string()));
    }
    Ok(segments)
}

/// Splits a path into its parent path (if any) and its leaf segment.
pub fn split_leaf(path: &str) -> Result<(Option<&str>, &str)> {
    split(path)?;
    Ok(match path.rsplit_once(SEPARATOR) {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, path),
    })
}
