//! Override file list handling.

use std::collections::HashSet;
use tracing::warn;

/// Name of the base file, never loaded again as an override.
pub const BASE_FILE: &str = "base";

/// Name of the optional environment mapping file.
pub const ENV_MAPPING_FILE: &str = "env_mapping";

/// Parse a comma-separated override list.
///
/// Items are trimmed; empty items and the base file name are dropped, and
/// duplicates keep only their first occurrence.
pub fn parse_override_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for name in raw.split(',').map(str::trim) {
        if name.is_empty() {
            continue;
        }
        if name == BASE_FILE {
            warn!(name, "Ignoring base file in override list");
            continue;
        }
        if !seen.insert(name) {
            warn!(name, "Ignoring duplicate override file");
            continue;
        }
        names.push(name.to_string());
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_name() {
        assert_eq!(parse_override_list("override_a"), vec!["override_a"]);
    }

    #[test]
    fn test_order_preserved() {
        assert_eq!(
            parse_override_list("override_b,override_a"),
            vec!["override_b", "override_a"]
        );
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(
            parse_override_list("override_b, override_d.yml ,  dev"),
            vec!["override_b", "override_d.yml", "dev"]
        );
    }

    #[test]
    fn test_empty_items_dropped() {
        assert_eq!(parse_override_list(",a,, ,b,"), vec!["a", "b"]);
        assert!(parse_override_list("").is_empty());
        assert!(parse_override_list(" , ").is_empty());
    }

    #[test]
    fn test_base_dropped() {
        assert_eq!(parse_override_list("base,dev, base"), vec!["dev"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(parse_override_list("a,b,a,c,b"), vec!["a", "b", "c"]);
    }
}
