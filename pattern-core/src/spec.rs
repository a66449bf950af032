//! Pattern definitions: which fields are exported, how repeated relations
//! expand into column groups, and which field acts as the upsert key.

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, Result};
use crate::path::HOP_SEPARATOR;
use crate::predicate::Predicate;

/// Relation kind of a pattern field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Plain scalar field
    Scalar,
    /// Singular related record, rendered as nested columns
    Many2one,
    /// One-to-many relation, rendered as repeated column groups
    One2many,
    /// Many-to-many relation, rendered as repeated column groups
    Many2many,
}

impl RelationKind {
    /// Whether the relation expands into repeated column groups
    #[must_use]
    pub fn is_repeated(self) -> bool {
        matches!(self, Self::One2many | Self::Many2many)
    }
}

/// Output format of an export pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Excel workbook with lookup tabs and dropdown validators
    #[default]
    Xlsx,
    /// Plain CSV
    Csv,
}

/// Restriction of the records permitted in a relational column.
///
/// Filtered many2one/many2many fields get a dedicated lookup sheet in the
/// generated workbook plus a list validator on their columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabFilter {
    /// Display name of the filter, part of the lookup sheet name
    pub name: String,
    /// Predicate selecting the permitted records
    pub domain: Predicate,
}

/// One exported field within a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternField {
    /// Slash-separated hop path, e.g. `partner_id/country_id/code`
    pub path: String,

    /// Relation kind of the traversed relation (or `Scalar`)
    pub kind: RelationKind,

    /// Whether this field identifies existing records for upsert matching
    #[serde(default)]
    pub is_key: bool,

    /// Number of column groups generated for a repeated relation
    #[serde(default = "default_occurrence")]
    pub number_occurrence: usize,

    /// Sub-pattern describing the columns of each one2many item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_pattern: Option<Box<ExportPattern>>,

    /// Co-model of the relation, required for lookup tabs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comodel: Option<String>,

    /// Human labels per hop, used instead of technical names on request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Lookup-tab restriction for relational columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_filter: Option<TabFilter>,
}

fn default_occurrence() -> usize {
    1
}

impl PatternField {
    /// New field with default settings
    #[must_use]
    pub fn new(path: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_key: false,
            number_occurrence: 1,
            sub_pattern: None,
            comodel: None,
            labels: Vec::new(),
            tab_filter: None,
        }
    }

    /// Mark this field as the upsert key
    #[must_use]
    pub fn with_key(mut self) -> Self {
        self.is_key = true;
        self
    }

    /// Set the repeat count for a repeated relation
    #[must_use]
    pub fn with_occurrence(mut self, number_occurrence: usize) -> Self {
        self.number_occurrence = number_occurrence;
        self
    }

    /// Attach the sub-pattern describing one2many items
    #[must_use]
    pub fn with_sub_pattern(mut self, sub_pattern: ExportPattern) -> Self {
        self.sub_pattern = Some(Box::new(sub_pattern));
        self
    }

    /// Set the relation co-model
    #[must_use]
    pub fn with_comodel(mut self, comodel: impl Into<String>) -> Self {
        self.comodel = Some(comodel.into());
        self
    }

    /// Set per-hop human labels
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Restrict the permitted records of a relational column
    #[must_use]
    pub fn with_tab_filter(mut self, filter: TabFilter) -> Self {
        self.tab_filter = Some(filter);
        self
    }

    /// The relation hops of this field's path
    #[must_use]
    pub fn hops(&self) -> Vec<&str> {
        self.path.split(HOP_SEPARATOR).collect()
    }
}

/// An ordered export/import field specification for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPattern {
    /// Pattern name, also the main worksheet name
    pub name: String,

    /// Target model the rows are imported into / exported from
    pub model: String,

    /// Ordered exported fields
    pub fields: Vec<PatternField>,

    /// Output format
    #[serde(default)]
    pub export_format: ExportFormat,
}

impl ExportPattern {
    /// New empty pattern
    #[must_use]
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            fields: Vec::new(),
            export_format: ExportFormat::default(),
        }
    }

    /// Append a field
    #[must_use]
    pub fn with_field(mut self, field: PatternField) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, export_format: ExportFormat) -> Self {
        self.export_format = export_format;
        self
    }

    /// Check the structural constraints of this pattern and all sub-patterns.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidPattern`] when more than one field is
    /// flagged as key, a repeated relation has an occurrence count below 1 or
    /// lacks its target field / sub-pattern, or a many2one path has no
    /// sub-field hop.
    pub fn validate(&self) -> Result<()> {
        let key_count = self.fields.iter().filter(|f| f.is_key).count();
        if key_count > 1 {
            return Err(PatternError::invalid_pattern(format!(
                "pattern '{}' has {key_count} fields considered as key (1 max)",
                self.name
            )));
        }

        for field in &self.fields {
            let hops = field.hops();
            match field.kind {
                RelationKind::Scalar => {}
                RelationKind::Many2one => {
                    if hops.len() < 2 {
                        return Err(PatternError::invalid_pattern(format!(
                            "many2one field '{}' needs a sub-field hop",
                            field.path
                        )));
                    }
                }
                RelationKind::One2many | RelationKind::Many2many => {
                    if field.number_occurrence < 1 {
                        return Err(PatternError::invalid_pattern(format!(
                            "number of occurrence for field '{}' should be \
                             greater or equal to 1",
                            field.path
                        )));
                    }
                    if field.kind == RelationKind::One2many && field.sub_pattern.is_none() {
                        return Err(PatternError::invalid_pattern(format!(
                            "one2many field '{}' requires a sub-pattern",
                            field.path
                        )));
                    }
                    if field.kind == RelationKind::Many2many && field.sub_pattern.is_some() {
                        return Err(PatternError::invalid_pattern(format!(
                            "many2many field '{}' cannot carry a sub-pattern",
                            field.path
                        )));
                    }
                    if field.sub_pattern.is_none() && hops.len() < 2 {
                        return Err(PatternError::invalid_pattern(format!(
                            "repeated field '{}' needs a target sub-field",
                            field.path
                        )));
                    }
                }
            }
            if let Some(sub) = &field.sub_pattern {
                sub.validate()?;
            }
        }
        Ok(())
    }
}
