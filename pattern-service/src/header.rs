//! Header generation and export-side flattening.
//!
//! The generated headers are the exact inverse of the path grammar: any
//! header produced here parses, through the transcoder, back to the tree
//! position it denotes.

use serde_json::Value;

use pattern_core::prelude::*;
use pattern_core::tree::TreeValue;

/// Generate the ordered flat column headers of a pattern.
///
/// `use_label` renders human labels instead of technical names where the
/// pattern provides them.
///
/// # Errors
///
/// Returns [`PatternError::InvalidPattern`] when the pattern fails its
/// structural validation.
pub fn headers(pattern: &ExportPattern, use_label: bool) -> Result<Vec<String>> {
    pattern.validate()?;
    let mut out = Vec::new();
    for field in &pattern.fields {
        expand_field(field, use_label, &mut out)?;
    }
    Ok(out)
}

pub(crate) fn expand_field(
    field: &PatternField,
    use_label: bool,
    out: &mut Vec<String>,
) -> Result<()> {
    let hops = field.hops();
    match field.kind {
        RelationKind::Scalar => {
            let mut header = hop_name(field, &hops, 0, use_label).to_string();
            if field.is_key {
                header.push_str(path::IDENTIFIER_SUFFIX);
            }
            out.push(header);
        }
        RelationKind::Many2one => {
            out.push(join_hops(field, &hops, hops.len(), use_label));
        }
        RelationKind::One2many | RelationKind::Many2many => {
            if let Some(sub) = &field.sub_pattern {
                let base = join_hops(field, &hops, hops.len(), use_label);
                let sub_headers = headers(sub, use_label)?;
                for index in 1..=field.number_occurrence {
                    for sub_header in &sub_headers {
                        out.push(format!(
                            "{base}{sep}{index}{sep}{sub_header}",
                            sep = path::COLUMN_SEPARATOR
                        ));
                    }
                }
            } else {
                let base = join_hops(field, &hops, hops.len() - 1, use_label);
                let target = hop_name(field, &hops, hops.len() - 1, use_label);
                for index in 1..=field.number_occurrence {
                    out.push(format!(
                        "{base}{sep}{index}{sep}{target}",
                        sep = path::COLUMN_SEPARATOR
                    ));
                }
            }
        }
    }
    Ok(())
}

fn hop_name<'a>(
    field: &'a PatternField,
    hops: &[&'a str],
    index: usize,
    use_label: bool,
) -> &'a str {
    if use_label {
        if let Some(label) = field.labels.get(index) {
            return label;
        }
    }
    hops.get(index).copied().unwrap_or_default()
}

fn join_hops(field: &PatternField, hops: &[&str], count: usize, use_label: bool) -> String {
    (0..count)
        .map(|i| hop_name(field, hops, i, use_label))
        .collect::<Vec<_>>()
        .join(path::COLUMN_SEPARATOR)
}

/// Read the scalar value a header denotes inside a record tree.
///
/// Identifier suffixes on header segments are ignored when descending, so
/// export rendering works from trees keyed by bare field names. Returns
/// `None` when the position is absent or not a leaf.
#[must_use]
pub fn value_at<'a>(tree: &'a Mapping, header: &str) -> Option<&'a Value> {
    let mut cursor: Option<&TreeValue> = None;
    for segment in path::split_key(header) {
        cursor = if path::is_index_segment(segment) {
            let index: usize = segment.parse().ok()?;
            match cursor? {
                TreeValue::Sequence(items) => items.get(index.checked_sub(1)?),
                _ => None,
            }
        } else {
            let name = path::strip_identifier_suffix(segment).unwrap_or(segment);
            let mapping = match cursor {
                None => tree,
                Some(TreeValue::Mapping(mapping)) => mapping,
                Some(_) => return None,
            };
            mapping.get(name)
        };
        cursor?;
    }
    cursor?.as_scalar()
}
