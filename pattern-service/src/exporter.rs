//! Export engine: flattens record trees into rows and prepares the lookup
//! tabs backing the dropdown validators of filtered relational columns.

use serde_json::Value;

use pattern_core::prelude::*;

use crate::header;

/// Maximum worksheet name length imposed by the spreadsheet format
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Read seam supplying the permitted records of a filtered relation
pub trait LookupSource {
    /// Display values of the records of `model` matching `domain`, one per
    /// lookup row.
    ///
    /// # Errors
    ///
    /// Implementations report backend failures as [`PatternError::Search`].
    fn display_values(&self, model: &str, domain: &Predicate) -> Result<Vec<String>>;
}

/// Contents of one lookup tab plus the main-sheet columns it validates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabData {
    /// Sheet name, `Model (filter)`
    pub name: String,
    /// Header cells of the lookup sheet
    pub headers: Vec<String>,
    /// Lookup rows, one cell list per permitted record
    pub rows: Vec<Vec<String>>,
    /// 0-based main-sheet columns the validator applies to
    pub columns: Vec<usize>,
}

/// Renders one pattern into headers, rows and lookup tabs
pub struct Exporter<'a> {
    pattern: &'a ExportPattern,
}

impl<'a> Exporter<'a> {
    /// New exporter; validates the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidPattern`] for malformed patterns.
    pub fn new(pattern: &'a ExportPattern) -> Result<Self> {
        pattern.validate()?;
        Ok(Self { pattern })
    }

    /// The pattern being exported
    #[must_use]
    pub fn pattern(&self) -> &ExportPattern {
        self.pattern
    }

    /// Ordered column headers.
    ///
    /// # Errors
    ///
    /// Propagates pattern validation failures from sub-patterns.
    pub fn headers(&self, use_label: bool) -> Result<Vec<String>> {
        header::headers(self.pattern, use_label)
    }

    /// Flatten record trees into row-major cell values, one row per record,
    /// one cell per technical header. Missing positions render as null.
    ///
    /// # Errors
    ///
    /// Propagates header generation failures.
    pub fn render_rows(&self, records: &[Mapping]) -> Result<Vec<Vec<Value>>> {
        let headers = self.headers(false)?;
        Ok(records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| header::value_at(record, h).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect())
    }

    /// Build the lookup tabs of the filtered relational fields.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::SheetName`] when a tab name exceeds the
    /// 31-character worksheet limit, [`PatternError::InvalidPattern`] when a
    /// filtered field lacks its co-model, and propagates lookup failures.
    pub fn tab_data(&self, lookups: &dyn LookupSource) -> Result<Vec<TabData>> {
        let mut tabs = Vec::new();
        let mut offset = 0usize;

        for field in &self.pattern.fields {
            let mut field_headers = Vec::new();
            header::expand_field(field, false, &mut field_headers)?;
            let width = field_headers.len();

            if matches!(field.kind, RelationKind::Many2one | RelationKind::Many2many) {
                if let Some(filter) = &field.tab_filter {
                    let comodel = field.comodel.as_deref().ok_or_else(|| {
                        PatternError::invalid_pattern(format!(
                            "filtered field '{}' has no co-model",
                            field.path
                        ))
                    })?;
                    let name = format!("{comodel} ({})", filter.name);
                    if name.chars().count() > MAX_SHEET_NAME_LEN {
                        return Err(PatternError::sheet_name(name));
                    }
                    let target = field.hops().last().copied().unwrap_or_default();
                    let values = lookups.display_values(comodel, &filter.domain)?;
                    tabs.push(TabData {
                        name,
                        headers: vec![target.to_string()],
                        rows: values.into_iter().map(|v| vec![v]).collect(),
                        columns: (offset..offset + width).collect(),
                    });
                }
            }
            offset += width;
        }
        Ok(tabs)
    }
}
