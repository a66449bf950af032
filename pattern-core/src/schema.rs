//! Static field typing for the identifier resolver.
//!
//! The resolver needs to know, per model, which tree keys are one2many
//! relations, which model their items belong to and which inverse field
//! points back at the parent. This registry is built once ahead of
//! processing instead of interrogating a live model registry per row.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::spec::RelationKind;

/// Typing information for one field of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Relation kind
    pub kind: RelationKind,

    /// Model of the related records, for relational kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comodel: Option<String>,

    /// Inverse field on the co-model pointing back at the parent
    /// (one2many only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

impl FieldDef {
    /// Plain scalar field
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            kind: RelationKind::Scalar,
            comodel: None,
            inverse: None,
        }
    }

    /// Many2one relation to `comodel`
    #[must_use]
    pub fn many2one(comodel: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::Many2one,
            comodel: Some(comodel.into()),
            inverse: None,
        }
    }

    /// One2many relation to `comodel`, linked back through `inverse`
    #[must_use]
    pub fn one2many(comodel: impl Into<String>, inverse: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::One2many,
            comodel: Some(comodel.into()),
            inverse: Some(inverse.into()),
        }
    }

    /// Many2many relation to `comodel`
    #[must_use]
    pub fn many2many(comodel: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::Many2many,
            comodel: Some(comodel.into()),
            inverse: None,
        }
    }
}

/// Field typing for one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Field definitions keyed by field name
    pub fields: IndexMap<String, FieldDef>,
}

impl ModelSchema {
    /// New empty model schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field definition
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }
}

/// Field typing for every model reachable from a pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    models: IndexMap<String, ModelSchema>,
}

impl SchemaRegistry {
    /// New empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model schema
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>, schema: ModelSchema) -> Self {
        self.models.insert(model.into(), schema);
        self
    }

    /// Look up a model schema
    #[must_use]
    pub fn model(&self, model: &str) -> Option<&ModelSchema> {
        self.models.get(model)
    }

    /// Look up one field of one model
    #[must_use]
    pub fn field(&self, model: &str, name: &str) -> Option<&FieldDef> {
        self.models.get(model).and_then(|m| m.fields.get(name))
    }
}
