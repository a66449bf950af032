//! Path grammar for flat column headers.
//!
//! A flat key is a sequence of segments joined by [`COLUMN_SEPARATOR`]. A
//! purely numeric segment is a 1-based index into the repeated group named by
//! the preceding segment; two consecutive named segments denote descent into a
//! nested mapping. Pattern definitions use [`HOP_SEPARATOR`] between relation
//! hops instead.

/// Separator between levels inside a flat column header
pub const COLUMN_SEPARATOR: &str = "|";

/// Separator between relation hops in a pattern field path
pub const HOP_SEPARATOR: &str = "/";

/// Suffix marking a header as an upsert identifier key
pub const IDENTIFIER_SUFFIX: &str = "####Identifier";

/// Headers starting with this marker are ignored on import
pub const COMMENT_PREFIX: &str = "#";

/// Reserved key carrying the internal database id of a matched record
pub const DB_ID_KEY: &str = ".id";

/// Reserved key carrying an external (cross-system) record identifier
pub const XML_ID_KEY: &str = "id";

/// Whether a path segment is a 1-based repeat index
#[must_use]
pub fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Split a flat column header into its path segments
#[must_use]
pub fn split_key(key: &str) -> Vec<&str> {
    key.split(COLUMN_SEPARATOR).collect()
}

/// Strip the identifier suffix, returning the bare field name if present
#[must_use]
pub fn strip_identifier_suffix(key: &str) -> Option<&str> {
    key.strip_suffix(IDENTIFIER_SUFFIX)
}

/// Whether a header names a commented-out column
#[must_use]
pub fn is_comment(key: &str) -> bool {
    key.starts_with(COMMENT_PREFIX)
}

/// Whether a key is one of the reserved identifier columns (`id` / `.id`)
#[must_use]
pub fn is_reserved_id(key: &str) -> bool {
    key == DB_ID_KEY || key == XML_ID_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_segments() {
        assert!(is_index_segment("1"));
        assert!(is_index_segment("42"));
        assert!(!is_index_segment(""));
        assert!(!is_index_segment("1a"));
        assert!(!is_index_segment("name"));
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("line_ids|1|product_code"), vec![
            "line_ids",
            "1",
            "product_code"
        ]);
        assert_eq!(split_key("name"), vec!["name"]);
    }

    #[test]
    fn test_identifier_suffix() {
        let header = format!("vat{IDENTIFIER_SUFFIX}");
        assert_eq!(strip_identifier_suffix(&header), Some("vat"));
        assert_eq!(strip_identifier_suffix("vat"), None);
    }

    #[test]
    fn test_comment_and_reserved() {
        assert!(is_comment("# note"));
        assert!(!is_comment("name"));
        assert!(is_reserved_id(".id"));
        assert!(is_reserved_id("id"));
        assert!(!is_reserved_id("ids"));
    }
}
