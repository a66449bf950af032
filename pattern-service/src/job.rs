//! Background export jobs and user notification.
//!
//! Export generation runs off the request path; the outcome is pushed to
//! the requesting user as a sticky notification carrying either a download
//! link to the artifact or a link to the failed job record.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use pattern_core::prelude::*;

use crate::exporter::LookupSource;
use crate::{csv, xlsx};

/// Terminal state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// The artifact was generated
    Success,
    /// Generation failed
    Fail,
}

/// Generated export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name, pattern name plus a UTC timestamp
    pub filename: String,
    /// File bytes
    pub content: Vec<u8>,
}

/// Result of one export job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Terminal state
    pub status: JobStatus,
    /// Artifact, on success
    pub artifact: Option<ExportArtifact>,
    /// Failure description, on failure
    pub error: Option<String>,
}

/// Push channel toward the requesting user
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a sticky success notification
    async fn notify_success(&self, message: &str);

    /// Deliver a sticky failure notification
    async fn notify_failure(&self, message: &str);
}

/// Builds the links embedded in job notifications
#[derive(Debug, Clone)]
pub struct JobLinks {
    base_url: String,
}

impl JobLinks {
    /// Links rooted at the instance base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Form view of the job record
    #[must_use]
    pub fn view_url(&self, job_id: i64) -> String {
        format!(
            "{}/web#id={job_id}&model=patterned.import.export&view_type=form",
            self.base_url
        )
    }

    /// Direct download of the job artifact
    #[must_use]
    pub fn download_url(&self, job_id: i64, filename: &str) -> String {
        format!(
            "{}/web/content/?model=patterned.import.export&id={job_id}&field=datas&download=true&filename={filename}",
            self.base_url
        )
    }
}

/// Runs export generation and reports the outcome to a notifier
pub struct ExportJob<'a> {
    links: JobLinks,
    notifier: &'a dyn Notifier,
}

impl<'a> ExportJob<'a> {
    /// New job runner
    #[must_use]
    pub fn new(links: JobLinks, notifier: &'a dyn Notifier) -> Self {
        Self { links, notifier }
    }

    /// Generate the export of `records` under `pattern` and notify the user.
    ///
    /// Generation failures do not propagate; they are folded into the
    /// outcome and reported through the failure notification.
    pub async fn run<L: LookupSource>(
        &self,
        job_id: i64,
        pattern: &ExportPattern,
        records: &[Mapping],
        lookups: &L,
    ) -> ExportOutcome {
        match generate(pattern, records, lookups) {
            Ok(content) => {
                let filename = artifact_filename(pattern);
                let url = self.links.download_url(job_id, &filename);
                tracing::info!(job = job_id, filename = %filename, "export job finished");
                self.notifier
                    .notify_success(&format!(
                        "Export job has finished. You can access it here: {url}"
                    ))
                    .await;
                ExportOutcome {
                    status: JobStatus::Success,
                    artifact: Some(ExportArtifact { filename, content }),
                    error: None,
                }
            }
            Err(err) => {
                let url = self.links.view_url(job_id);
                tracing::error!(job = job_id, error = %err, "export job failed");
                self.notifier
                    .notify_failure(&format!(
                        "Export job has failed. You can access it here: {url}"
                    ))
                    .await;
                ExportOutcome {
                    status: JobStatus::Fail,
                    artifact: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

fn generate(
    pattern: &ExportPattern,
    records: &[Mapping],
    lookups: &dyn LookupSource,
) -> Result<Vec<u8>> {
    match pattern.export_format {
        ExportFormat::Xlsx => xlsx::write_workbook(pattern, records, lookups),
        ExportFormat::Csv => csv::write_records(pattern, records),
    }
}

fn artifact_filename(pattern: &ExportPattern) -> String {
    let stem: String = pattern
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let extension = match pattern.export_format {
        ExportFormat::Xlsx => "xlsx",
        ExportFormat::Csv => "csv",
    };
    format!(
        "{stem}_{}.{extension}",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}
