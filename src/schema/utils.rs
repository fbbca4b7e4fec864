// Utility functions for the schema module
//
// This module provides shared utility functions used by other schema submodules.

/// Joins a parent dot-path and a child segment.
///
/// An empty parent denotes the root, so the child is returned unchanged.
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

/// Returns the sub-path of `path` beneath `field`, if `path` lies under it
///
/// `sub_path("a.b.c", "a")` is `Some("b.c")`; `sub_path("ab", "a")` is `None`.
pub(crate) fn sub_path<'a>(path: &'a str, field: &str) -> Option<&'a str> {
    path.strip_prefix(field)?
        .strip_prefix('.')
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a", "b"), "a.b");
        assert_eq!(join_path("a", ""), "a");
    }

    #[test]
    fn test_sub_path() {
        assert_eq!(sub_path("a.b.c", "a"), Some("b.c"));
        assert_eq!(sub_path("a.b", "a.b"), None);
        assert_eq!(sub_path("ab.c", "a"), None);
        assert_eq!(sub_path("a.", "a"), None);
    }
}
