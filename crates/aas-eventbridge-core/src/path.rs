//! Element path normalization.
//!
//! An idShortPath locates a (possibly nested) submodel element, e.g.
//! `TechnicalData/MaxTemperature` or `TechnicalData.MaxTemperature`.
//! Paths coming from REST routes frequently carry leading or trailing
//! separators, so every comparison and every stored key uses the
//! normalized form.

/// Separator stripped from both ends of a path.
pub const PATH_SEPARATOR: char = '/';

/// Normalize an element path by stripping leading and trailing separators.
///
/// Separators inside the path are preserved, so nesting survives.
///
/// # Examples
///
/// ```
/// use aas_eventbridge_core::normalize_path;
///
/// assert_eq!(normalize_path("/x/y/"), "x/y");
/// assert_eq!(normalize_path("x/y"), "x/y");
/// assert_eq!(normalize_path("//Collection.Sub//"), "Collection.Sub");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches(PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_ends() {
        assert_eq!(normalize_path("/temperature/"), "temperature");
        assert_eq!(normalize_path("///a/b"), "a/b");
    }

    #[test]
    fn keeps_inner_separators() {
        assert_eq!(normalize_path("Collection/Sub/Leaf"), "Collection/Sub/Leaf");
    }

    #[test]
    fn separator_only_is_empty() {
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path(""), "");
    }
}
