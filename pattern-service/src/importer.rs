//! Streaming import engine.
//!
//! Rows are processed one by one; every `flush_step` rows the loader is
//! flushed and, under partial commit, a checkpoint (SAVEPOINT-equivalent)
//! is set so a later row's failure only rolls back to that point. Row-level
//! conversion failures are collected with row-range metadata instead of
//! aborting the batch, unless partial commit is disabled.

use serde::{Deserialize, Serialize};

use pattern_core::prelude::*;
use pattern_core::tree::scalar_has_content;

use crate::resolver::RecordSearch;
use crate::transcoder::Transcoder;

/// Source row range a message refers to (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    /// First row
    pub from: usize,
    /// Last row
    pub to: usize,
}

impl RowRange {
    /// Range covering a single row
    #[must_use]
    pub fn single(row: usize) -> Self {
        Self { from: row, to: row }
    }
}

/// Severity of a collected row message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// Recoverable oddity, the row was still imported
    Warning,
    /// The row was not imported
    Error,
}

/// One entry of the structured import log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMessage {
    /// Rows the message refers to
    pub rows: RowRange,
    /// Severity
    pub level: MessageLevel,
    /// Human-readable description
    pub message: String,
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// Rows successfully handed to the loader
    pub imported: usize,
    /// Rows skipped because every cell was empty
    pub skipped: usize,
    /// Collected row-level messages
    pub messages: Vec<RowMessage>,
}

impl ImportResult {
    /// Whether no row-level error was collected
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.messages
            .iter()
            .all(|m| m.level != MessageLevel::Error)
    }
}

/// Write seam into the persistence layer
pub trait RecordLoader {
    /// Hand one converted record over for creation/update.
    ///
    /// # Errors
    ///
    /// Implementations report per-record failures; the engine collects them
    /// per row under partial commit.
    fn load(&mut self, model: &str, record: Mapping, rows: &RowRange) -> Result<()>;

    /// Flush buffered records to the backend.
    ///
    /// # Errors
    ///
    /// A flush failure fails the batch.
    fn flush(&mut self) -> Result<()>;

    /// Mark a resumable rollback point.
    ///
    /// # Errors
    ///
    /// A checkpoint failure fails the batch.
    fn checkpoint(&mut self) -> Result<()>;
}

/// Streaming row importer for one pattern
pub struct Importer<'a> {
    pattern: &'a ExportPattern,
    transcoder: Transcoder<'a>,
    config: ImportConfig,
}

impl<'a> Importer<'a> {
    /// New importer; validates the pattern and the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidPattern`] for malformed patterns or a
    /// zero flush step.
    pub fn new(
        pattern: &'a ExportPattern,
        registry: &'a SchemaRegistry,
        search: &'a dyn RecordSearch,
        config: ImportConfig,
    ) -> Result<Self> {
        pattern.validate()?;
        config.validate()?;
        Ok(Self {
            pattern,
            transcoder: Transcoder::new(&pattern.model, registry, search),
            config,
        })
    }

    /// Run the import over an iterator of flat rows.
    ///
    /// # Errors
    ///
    /// With partial commit enabled, row-level failures are collected into
    /// the result and only batch-level failures (flush/checkpoint) abort.
    /// With partial commit disabled, the first row failure aborts the run.
    pub fn run<I>(&self, rows: I, loader: &mut dyn RecordLoader) -> Result<ImportResult>
    where
        I: IntoIterator<Item = FlatRow>,
    {
        let mut result = ImportResult::default();
        let mut processed = 0usize;

        for (idx, mut row) in rows.into_iter().enumerate() {
            processed = idx + 1;
            row.retain(|key, _| !path::is_comment(key));
            if row.values().all(|value| !scalar_has_content(value)) {
                result.skipped += 1;
                continue;
            }

            let range = RowRange::single(idx + 1);
            let outcome = self
                .transcoder
                .transcode(&row)
                .and_then(|record| loader.load(&self.pattern.model, record, &range));
            match outcome {
                Ok(()) => result.imported += 1,
                Err(err) if self.config.partial_commit => {
                    tracing::warn!(row = idx + 1, error = %err, "row import failed");
                    result.messages.push(RowMessage {
                        rows: range,
                        level: MessageLevel::Error,
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }

            if processed % self.config.flush_step == 0 {
                loader.flush()?;
                tracing::info!(imported = processed, "progress status: records imported");
                if self.config.partial_commit {
                    loader.checkpoint()?;
                }
            }
        }

        // Force a final flush so logging and commits cover the tail rows.
        loader.flush()?;
        tracing::info!(
            total = processed,
            imported = result.imported,
            "progress status: total records imported"
        );
        if self.config.partial_commit {
            loader.checkpoint()?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RecordSearch;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    struct NoSearch;

    impl RecordSearch for NoSearch {
        fn search(&self, _model: &str, _domain: &Predicate) -> Result<Vec<i64>> {
            Ok(Vec::new())
        }

        fn external_id(&self, _xid: &str) -> Result<Option<i64>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MemoryLoader {
        records: Vec<(Mapping, RowRange)>,
        flushes: usize,
        checkpoints: usize,
        fail_on_row: Option<usize>,
    }

    impl RecordLoader for MemoryLoader {
        fn load(&mut self, _model: &str, record: Mapping, rows: &RowRange) -> Result<()> {
            if self.fail_on_row == Some(rows.from) {
                return Err(PatternError::parse("boom"));
            }
            self.records.push((record, *rows));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }

        fn checkpoint(&mut self) -> Result<()> {
            self.checkpoints += 1;
            Ok(())
        }
    }

    fn pattern() -> ExportPattern {
        ExportPattern::new("Partners", "res.partner")
            .with_field(PatternField::new("name", RelationKind::Scalar))
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with_model(
            "res.partner",
            ModelSchema::new().with_field("name", FieldDef::scalar()),
        )
    }

    fn row(pairs: &[(&str, Value)]) -> FlatRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn run_rows(
        rows: Vec<FlatRow>,
        config: ImportConfig,
        loader: &mut MemoryLoader,
    ) -> Result<ImportResult> {
        let pattern = pattern();
        let registry = registry();
        let search = NoSearch;
        let importer = Importer::new(&pattern, &registry, &search, config)?;
        importer.run(rows, loader)
    }

    #[test]
    fn test_flush_and_checkpoint_cadence() {
        let rows: Vec<FlatRow> = (1..=5)
            .map(|i| row(&[("name", json!(format!("P{i}")))]))
            .collect();
        let mut loader = MemoryLoader::default();
        let config = ImportConfig {
            partial_commit: true,
            flush_step: 2,
        };
        let result = run_rows(rows, config, &mut loader).expect("runs");

        assert_eq!(result.imported, 5);
        // Flushes after rows 2 and 4, plus the final one.
        assert_eq!(loader.flushes, 3);
        assert_eq!(loader.checkpoints, 3);
    }

    #[test]
    fn test_empty_rows_skipped_and_comments_stripped() {
        let rows = vec![
            row(&[("name", json!("")), ("# note", json!("text"))]),
            row(&[("name", json!("Acme"))]),
        ];
        let mut loader = MemoryLoader::default();
        let result = run_rows(rows, ImportConfig::default(), &mut loader).expect("runs");

        assert_eq!(result.skipped, 1);
        assert_eq!(result.imported, 1);
        assert_eq!(loader.records.len(), 1);
        assert_eq!(loader.records[0].1, RowRange::single(2));
    }

    #[test]
    fn test_partial_commit_collects_row_errors() {
        let rows = vec![
            row(&[("name", json!("A"))]),
            row(&[("name", json!("B"))]),
            row(&[("name", json!("C"))]),
        ];
        let mut loader = MemoryLoader {
            fail_on_row: Some(2),
            ..MemoryLoader::default()
        };
        let result = run_rows(rows, ImportConfig::default(), &mut loader).expect("runs");

        assert_eq!(result.imported, 2);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].rows, RowRange::single(2));
        assert_eq!(result.messages[0].level, MessageLevel::Error);
        assert!(!result.is_success());
    }

    #[test]
    fn test_without_partial_commit_first_failure_aborts() {
        let rows = vec![
            row(&[("name", json!("A"))]),
            row(&[("name", json!("B"))]),
        ];
        let mut loader = MemoryLoader {
            fail_on_row: Some(1),
            ..MemoryLoader::default()
        };
        let config = ImportConfig {
            partial_commit: false,
            flush_step: 10,
        };
        let err = run_rows(rows, config, &mut loader).unwrap_err();
        assert!(matches!(err, PatternError::Parse(_)));
        assert!(loader.records.is_empty());
        assert_eq!(loader.checkpoints, 0);
    }
}
