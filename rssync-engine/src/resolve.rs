//! Root-relative reference resolution.
//!
//! Descriptors name data sources and other items relative to the run's root
//! folder so the same descriptor can be deployed under different roots.

use rssync_core::DEFAULT_ROOT;

/// Anchor `reference` (which begins with `/`) at `run_root`.
///
/// Under the catalog root the reference is already absolute and is returned
/// as is; otherwise the two are concatenated without inserting a separator.
pub fn resolve(reference: &str, run_root: &str) -> String {
    if run_root == DEFAULT_ROOT {
        reference.to_string()
    } else {
        format!("{run_root}{reference}")
    }
}

/// Last path segment of a catalog path, used as a default link name.
pub fn leaf_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/ds1", "/root", "/root/ds1")]
    #[case("/ds1", "/", "/ds1")]
    #[case("/Shared/Sales", "/Finance/Prod", "/Finance/Prod/Shared/Sales")]
    fn resolves_against_root(#[case] reference: &str, #[case] root: &str, #[case] expected: &str) {
        assert_eq!(resolve(reference, root), expected);
    }

    #[test]
    fn resolved_reference_begins_with_root() {
        for root in ["/", "/a", "/a/b"] {
            assert!(resolve("/x", root).starts_with(root));
        }
    }

    #[rstest]
    #[case("/Shared/Sales", "Sales")]
    #[case("/Sales", "Sales")]
    #[case("Sales", "Sales")]
    #[case("/a/b/", "b")]
    fn leaf_name_is_last_segment(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(leaf_name(path), expected);
    }
}
