//! Spreadsheet rendering and parsing.
//!
//! The writer produces a workbook with one main sheet named after the
//! pattern plus one lookup tab per filtered relational field; the validated
//! main-sheet columns get a dropdown list sourced from the tab's first
//! column. The reader turns the first sheet of a workbook back into flat
//! rows keyed by the header line.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{DataValidation, Format, Formula, Workbook, Worksheet};
use serde_json::{Value, json};

use pattern_core::prelude::*;

use crate::exporter::{Exporter, LookupSource, MAX_SHEET_NAME_LEN, TabData};

/// Render a pattern export as a complete xlsx workbook.
///
/// # Errors
///
/// Returns [`PatternError::SheetName`] when the pattern name or a tab name
/// exceeds the 31-character worksheet limit, and [`PatternError::Render`]
/// for workbook assembly failures.
pub fn write_workbook(
    pattern: &ExportPattern,
    records: &[Mapping],
    lookups: &dyn LookupSource,
) -> Result<Vec<u8>> {
    let exporter = Exporter::new(pattern)?;
    let headers = exporter.headers(false)?;
    let rows = exporter.render_rows(records)?;
    let tabs = exporter.tab_data(lookups)?;

    if pattern.name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(PatternError::sheet_name(pattern.name.clone()));
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let main = workbook
        .add_worksheet()
        .set_name(&pattern.name)
        .map_err(|e| PatternError::render(e.to_string()))?;
    for (col, header) in headers.iter().enumerate() {
        main.write_string_with_format(0, column(col)?, header, &header_format)
            .map_err(|e| PatternError::render(e.to_string()))?;
    }
    for (row, cells) in rows.iter().enumerate() {
        let row = row_number(row + 1)?;
        for (col, value) in cells.iter().enumerate() {
            write_cell(main, row, column(col)?, value)?;
        }
    }

    for tab in &tabs {
        write_tab(&mut workbook, tab, &header_format)?;
    }

    // Re-borrow the main sheet to attach the dropdowns.
    let main = workbook
        .worksheet_from_index(0)
        .map_err(|e| PatternError::render(e.to_string()))?;
    // Empty exports still validate the first data row, so a rendered
    // template carries working dropdowns.
    let last_data_row = row_number(records.len().max(1))?;
    for tab in &tabs {
        let source = format!(
            "{}!$A$2:$A${}",
            quote_sheet_name(&tab.name),
            1 + tab.rows.len().max(1)
        );
        let validation = DataValidation::new().allow_list_formula(Formula::new(source));
        for &col in &tab.columns {
            let col = column(col)?;
            main.add_data_validation(1, col, last_data_row, col, &validation)
                .map_err(|e| PatternError::render(e.to_string()))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| PatternError::render(format!("failed to save workbook: {e}")))
}

fn write_tab(workbook: &mut Workbook, tab: &TabData, header_format: &Format) -> Result<()> {
    let sheet = workbook
        .add_worksheet()
        .set_name(&tab.name)
        .map_err(|e| PatternError::render(e.to_string()))?;
    for (col, header) in tab.headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, column(col)?, header, header_format)
            .map_err(|e| PatternError::render(e.to_string()))?;
    }
    for (row, cells) in tab.rows.iter().enumerate() {
        let row = row_number(row + 1)?;
        for (col, cell) in cells.iter().enumerate() {
            sheet
                .write_string(row, column(col)?, cell)
                .map_err(|e| PatternError::render(e.to_string()))?;
        }
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => return Ok(()),
        Value::Bool(b) => sheet.write_boolean(row, col, *b),
        Value::Number(n) => sheet.write_number(row, col, n.as_f64().unwrap_or_default()),
        Value::String(s) => sheet.write_string(row, col, s),
        other => sheet.write_string(row, col, other.to_string()),
    }
    .map_err(|e| PatternError::render(e.to_string()))?;
    Ok(())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| PatternError::render("column index out of range"))
}

fn row_number(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| PatternError::render("row index out of range"))
}

fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Parse the first sheet of an xlsx workbook into flat rows.
///
/// The first sheet row supplies the keys; trailing sheet rows become one
/// [`FlatRow`] each, in order.
///
/// # Errors
///
/// Returns [`PatternError::Parse`] when the workbook cannot be read or a
/// cell holds a spreadsheet error value.
pub fn read_rows(data: &[u8]) -> Result<Vec<FlatRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| PatternError::parse(format!("failed to open workbook: {e}")))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(PatternError::parse("workbook has no sheets"));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| PatternError::parse(format!("failed to read sheet '{sheet}': {e}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

    let mut out = Vec::new();
    for row in rows {
        let mut flat = FlatRow::new();
        for (col, cell) in row.iter().enumerate() {
            if let Some(header) = headers.get(col) {
                flat.insert(header.clone(), cell_to_value(cell)?);
            }
        }
        out.push(flat);
    }
    Ok(out)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

fn cell_to_value(cell: &Data) -> Result<Value> {
    let value = match cell {
        Data::Empty => Value::Null,
        Data::String(s) => json!(s),
        Data::Int(i) => json!(i),
        Data::Float(f) => json!(f),
        Data::Bool(b) => json!(b),
        Data::DateTime(dt) => json!(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => json!(s),
        Data::Error(e) => {
            return Err(PatternError::parse(format!("cell holds an error: {e:?}")));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedLookup(Vec<String>);

    impl LookupSource for FixedLookup {
        fn display_values(&self, _model: &str, _domain: &Predicate) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn record(value: Value) -> Mapping {
        match serde_json::from_value::<pattern_core::tree::TreeValue>(value).expect("valid tree") {
            pattern_core::tree::TreeValue::Mapping(mapping) => mapping,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_workbook_round_trip() {
        let pattern = ExportPattern::new("Partners", "res.partner")
            .with_field(PatternField::new("name", RelationKind::Scalar).with_key())
            .with_field(PatternField::new("credit", RelationKind::Scalar))
            .with_field(
                PatternField::new("country_id/code", RelationKind::Many2one)
                    .with_comodel("res.country")
                    .with_tab_filter(TabFilter {
                        name: "All".to_string(),
                        domain: Predicate::True,
                    }),
            );
        let records = vec![record(json!({
            "name": "Acme",
            "credit": 1500,
            "country_id": {"code": "FR"},
        }))];
        let lookups = FixedLookup(vec!["FR".to_string(), "BE".to_string()]);

        let bytes = write_workbook(&pattern, &records, &lookups).expect("writes");
        let rows = read_rows(&bytes).expect("reads back");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get(&format!("name{}", path::IDENTIFIER_SUFFIX)),
            Some(&json!("Acme"))
        );
        assert_eq!(rows[0].get("credit"), Some(&json!(1500.0)));
        assert_eq!(rows[0].get("country_id|code"), Some(&json!("FR")));
    }

    #[test]
    fn test_pattern_name_overflow_is_rejected() {
        let pattern = ExportPattern::new(
            "A pattern name that is clearly far too long",
            "res.partner",
        )
        .with_field(PatternField::new("name", RelationKind::Scalar));
        let err = write_workbook(&pattern, &[], &FixedLookup(Vec::new())).unwrap_err();
        assert!(matches!(err, PatternError::SheetName { .. }));
    }

    #[test]
    fn test_empty_export_still_writes_headers() {
        let pattern = ExportPattern::new("Partners", "res.partner")
            .with_field(PatternField::new("name", RelationKind::Scalar));
        let bytes = write_workbook(&pattern, &[], &FixedLookup(Vec::new())).expect("writes");
        let rows = read_rows(&bytes).expect("reads back");
        assert!(rows.is_empty());
    }
}
