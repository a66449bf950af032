//! # Pattern Core
//!
//! Core types for pattern-based tabular import/export.
//!
//! A "pattern" describes how flat spreadsheet columns with path-like headers
//! (`partner_id|name`, `line_ids|1|product_code`) map onto nested records,
//! including one2many/many2many repeated groups and identifier-based upsert
//! matching. This crate provides the building blocks shared by the import and
//! export engines:
//!
//! - the path grammar (separators, identifier marker, reserved keys)
//! - the tagged value tree built from a flat row
//! - the predicate algebra handed to the persistence collaborator
//! - pattern definitions with their validation rules
//! - the static field-typing registry
//! - error handling and import configuration

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types for pattern import/export operations
pub mod error;

/// Path grammar: separators, markers and segment helpers
pub mod path;

/// Tagged value tree built from flat rows
pub mod tree;

/// Search predicates handed to the persistence collaborator
pub mod predicate;

/// Pattern definitions and their validation rules
pub mod spec;

/// Static field typing for the identifier resolver
pub mod schema;

/// Import configuration
pub mod config;

pub use config::ImportConfig;
pub use error::{PatternError, Result};
pub use predicate::Predicate;
pub use schema::{FieldDef, ModelSchema, SchemaRegistry};
pub use spec::{ExportFormat, ExportPattern, PatternField, RelationKind, TabFilter};
pub use tree::{FlatRow, Mapping, TreeValue};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ImportConfig;
    pub use crate::error::{PatternError, Result};
    pub use crate::path;
    pub use crate::predicate::Predicate;
    pub use crate::schema::{FieldDef, ModelSchema, SchemaRegistry};
    pub use crate::spec::{ExportFormat, ExportPattern, PatternField, RelationKind, TabFilter};
    pub use crate::tree::{FlatRow, Mapping, TreeValue};
}
