//! Flat row to nested tree transcoding.
//!
//! Headers are sorted lexicographically before the tree walk. The sort is
//! load-bearing: it guarantees lower repeat indices are materialized before
//! higher ones and keeps parent paths in a stable order relative to their
//! children, so transcoding is deterministic regardless of the input key
//! iteration order.

use serde_json::Value;

use pattern_core::prelude::*;
use pattern_core::tree::TreeValue;

use crate::resolver::{IdentifierResolver, RecordSearch};

/// Build the nested tree encoded by one flat row.
///
/// Keys named `id`/`.id` with a null value (explicit "no identifier"
/// markers) and commented-out columns are dropped first.
///
/// # Errors
///
/// Returns [`PatternError::Index`] when a repeat index skips ahead of the
/// group (only append-like monotonic growth is supported) and
/// [`PatternError::Structure`] when a path conflicts with the structure
/// built so far.
pub fn build_tree(row: &FlatRow) -> Result<Mapping> {
    let mut items: Vec<(&str, &Value)> = row
        .iter()
        .filter(|(key, value)| !(path::is_reserved_id(key) && value.is_null()))
        .filter(|(key, _)| !path::is_comment(key))
        .map(|(key, value)| (key.as_str(), value))
        .collect();
    items.sort_by(|a, b| a.0.cmp(b.0));

    let mut root = Mapping::new();
    for (key, value) in items {
        insert_path(&mut root, key, value)?;
    }
    Ok(root)
}

fn insert_path(root: &mut Mapping, key: &str, value: &Value) -> Result<()> {
    let segments = path::split_key(key);
    let mut current = &mut *root;
    let mut previous: Option<&str> = None;

    for &segment in &segments {
        match previous {
            None => {}
            Some(group) if path::is_index_segment(segment) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| PatternError::structure(key.to_string()))?;
                let entry = current
                    .entry(group.to_string())
                    .or_insert_with(|| TreeValue::Sequence(Vec::new()));
                let TreeValue::Sequence(group_items) = entry else {
                    return Err(PatternError::structure(key.to_string()));
                };
                // Indices are 1-based; at most one new slot is appended, so
                // anything beyond len + 1 is out of order.
                let next_allowed = group_items.len() + 1;
                if index == 0 || index > next_allowed {
                    return Err(PatternError::index(group, index, next_allowed));
                }
                if group_items.len() < index {
                    group_items.push(TreeValue::empty_mapping());
                }
                let item = group_items
                    .get_mut(index - 1)
                    .ok_or_else(|| PatternError::index(group, index, next_allowed))?;
                current = item
                    .as_mapping_mut()
                    .ok_or_else(|| PatternError::structure(key.to_string()))?;
            }
            Some(parent) if !path::is_index_segment(parent) => {
                let entry = current
                    .entry(parent.to_string())
                    .or_insert_with(TreeValue::empty_mapping);
                let TreeValue::Mapping(mapping) = entry else {
                    return Err(PatternError::structure(key.to_string()));
                };
                current = mapping;
            }
            // Previous segment was an index: the walk already descended
            // into the group item.
            Some(_) => {}
        }
        previous = Some(segment);
    }

    if let Some(last) = segments.last() {
        current.insert((*last).to_string(), TreeValue::Scalar(value.clone()));
    }
    Ok(())
}

/// Row transcoder: builds the tree and resolves identifier keys against the
/// persistence collaborator.
pub struct Transcoder<'a> {
    model: &'a str,
    resolver: IdentifierResolver<'a>,
}

impl<'a> Transcoder<'a> {
    /// New transcoder for rows of `model`
    #[must_use]
    pub fn new(
        model: &'a str,
        registry: &'a SchemaRegistry,
        search: &'a dyn RecordSearch,
    ) -> Self {
        Self {
            model,
            resolver: IdentifierResolver::new(registry, search),
        }
    }

    /// Convert one flat row into a resolved nested record.
    ///
    /// # Errors
    ///
    /// Propagates tree-building errors plus resolver failures (duplicate
    /// identifier matches, unknown identifiers, search errors).
    pub fn transcode(&self, row: &FlatRow) -> Result<Mapping> {
        let mut tree = build_tree(row)?;
        self.resolver
            .resolve(self.model, &mut tree, &Predicate::True, false)?;
        Ok(tree)
    }
}
