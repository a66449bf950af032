//! # Pattern Service
//!
//! Import/export engines for pattern-based tabular data interchange.
//!
//! Flat spreadsheet rows with path-like headers are transcoded into nested
//! record trees, matched against existing records through identifier keys,
//! and streamed into a persistence collaborator with periodic checkpoints.
//! The export direction generates the column headers a pattern describes,
//! flattens record trees into rows and renders them as Excel workbooks
//! (with lookup tabs and dropdown validators) or CSV files.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pattern_core::prelude::*;
//! use pattern_service::{Importer, RecordLoader, RecordSearch};
//!
//! let importer = Importer::new(&pattern, &registry, &search, ImportConfig::default())?;
//! let result = importer.run(rows, &mut loader)?;
//! assert!(result.is_success());
//! ```
//!
//! The persistence layer, job scheduler and notification channel are
//! external collaborators expressed as traits ([`RecordSearch`],
//! [`RecordLoader`], [`LookupSource`], [`job::Notifier`]).

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Flat row to nested tree transcoding
pub mod transcoder;

/// Identifier-based record resolution
pub mod resolver;

/// Header generation and export-side flattening
pub mod header;

/// Streaming import engine
pub mod importer;

/// Export engine: rows and lookup tabs
pub mod exporter;

/// Excel workbook rendering and parsing
pub mod xlsx;

/// CSV rendering and parsing
pub mod csv;

/// Async export-job facade
pub mod job;

pub use exporter::{Exporter, LookupSource, TabData};
pub use header::{headers, value_at};
pub use importer::{ImportResult, Importer, MessageLevel, RecordLoader, RowMessage, RowRange};
pub use resolver::{IdentifierResolver, RecordSearch};
pub use transcoder::{Transcoder, build_tree};
