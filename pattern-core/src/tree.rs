//! Tagged value tree built from flat rows.
//!
//! One [`Mapping`] is built per imported row, mutated in place by the
//! identifier resolver, handed to the persistence layer and discarded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One source row: flat column header mapped to a scalar cell value.
///
/// Key order is irrelevant; the transcoder sorts headers lexicographically
/// before building the tree.
pub type FlatRow = IndexMap<String, Value>;

/// A nested record under construction
pub type Mapping = IndexMap<String, TreeValue>;

/// A node in the nested tree built from a flat row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeValue {
    /// A repeated group (one2many/many2many items)
    Sequence(Vec<TreeValue>),
    /// A nested record (many2one or repeated-group item)
    Mapping(Mapping),
    /// A leaf cell value
    Scalar(Value),
}

impl TreeValue {
    /// Empty mapping node
    #[must_use]
    pub fn empty_mapping() -> Self {
        Self::Mapping(Mapping::new())
    }

    /// Whether any leaf below this node carries content.
    ///
    /// Scalar emptiness follows truthiness: null, blank strings, `false` and
    /// zero are empty. Short-circuits on the first non-empty descendant.
    #[must_use]
    pub fn has_content(&self) -> bool {
        match self {
            Self::Scalar(value) => scalar_has_content(value),
            Self::Mapping(mapping) => mapping.values().any(Self::has_content),
            Self::Sequence(items) => items.iter().any(Self::has_content),
        }
    }

    /// Borrow the scalar value if this node is a leaf
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the mapping if this node is a nested record
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Mutably borrow the mapping if this node is a nested record
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}

impl From<Value> for TreeValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

/// Truthiness of a raw cell value
#[must_use]
pub fn scalar_has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
