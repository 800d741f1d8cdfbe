//! Output formatter trait for CLI results.

use anyhow::Result;
use archivist_core::ArchiveResult;
use archivist_core::BuildReport;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the result of building an archive
    fn format_build_report(&self, report: &BuildReport) -> Result<()>;

    /// Format size and checksums of an existing archive
    fn format_checksum(&self, archive: &Path, result: &ArchiveResult) -> Result<()>;

    /// Format error message
    fn format_error(&self, operation: &str, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
