//! CSV rendering and parsing, the single-sheet fallback format.
//!
//! CSV carries no lookup tabs or validators; the writer emits the header
//! line plus stringified cells, the reader maps empty cells to null and
//! everything else to strings (the transcoder treats scalars uniformly).

use ::csv::{ReaderBuilder, WriterBuilder};
use serde_json::Value;

use pattern_core::prelude::*;

use crate::exporter::Exporter;

/// Render a pattern export as CSV bytes.
///
/// # Errors
///
/// Returns [`PatternError::Render`] when serialization fails and propagates
/// pattern validation failures.
pub fn write_records(pattern: &ExportPattern, records: &[Mapping]) -> Result<Vec<u8>> {
    let exporter = Exporter::new(pattern)?;
    let headers = exporter.headers(false)?;
    let rows = exporter.render_rows(records)?;

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| PatternError::render(e.to_string()))?;
    for row in &rows {
        writer
            .write_record(row.iter().map(value_to_field))
            .map_err(|e| PatternError::render(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| PatternError::render(e.to_string()))
}

fn value_to_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse CSV bytes into flat rows keyed by the header line.
///
/// # Errors
///
/// Returns [`PatternError::Parse`] for malformed CSV input.
pub fn read_rows(data: &[u8]) -> Result<Vec<FlatRow>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PatternError::parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PatternError::parse(e.to_string()))?;
        let mut flat = FlatRow::new();
        for (col, cell) in record.iter().enumerate() {
            if let Some(header) = headers.get(col) {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                flat.insert(header.clone(), value);
            }
        }
        out.push(flat);
    }
    Ok(out)
}
