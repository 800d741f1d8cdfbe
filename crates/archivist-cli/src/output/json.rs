//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use archivist_core::ArchiveResult;
use archivist_core::BuildReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

#[derive(Serialize)]
struct Digests<'a> {
    size: u64,
    md5: &'a str,
    sha256: &'a str,
}

impl<'a> From<&'a ArchiveResult> for Digests<'a> {
    fn from(result: &'a ArchiveResult) -> Self {
        Self {
            size: result.size,
            md5: &result.md5,
            sha256: &result.sha256,
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_build_report(&self, report: &BuildReport) -> Result<()> {
        #[derive(Serialize)]
        struct Warning {
            item: String,
            error: String,
        }

        #[derive(Serialize)]
        struct CreateOutput<'a> {
            path: String,
            format: &'static str,
            entries_written: usize,
            entries_excluded: usize,
            #[serde(flatten)]
            digests: Digests<'a>,
            warnings: Vec<Warning>,
        }

        let data = CreateOutput {
            path: report.path.display().to_string(),
            format: report.format.name(),
            entries_written: report.entries_written,
            entries_excluded: report.entries_excluded,
            digests: Digests::from(&report.result),
            warnings: report
                .warnings
                .iter()
                .map(|w| Warning {
                    item: w.item.clone(),
                    error: w.error.to_string(),
                })
                .collect(),
        };

        Self::output(&JsonOutput::success("create", data))
    }

    fn format_checksum(&self, archive: &Path, result: &ArchiveResult) -> Result<()> {
        #[derive(Serialize)]
        struct ChecksumOutput<'a> {
            path: String,
            #[serde(flatten)]
            digests: Digests<'a>,
        }

        let data = ChecksumOutput {
            path: archive.display().to_string(),
            digests: Digests::from(result),
        };

        Self::output(&JsonOutput::success("checksum", data))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        // stdout carries exactly one JSON document per run
        if let Ok(json) = serde_json::to_string(&JsonOutput::success("warning", WarningData { message })) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let result = ArchiveResult {
            sha256: "ab".repeat(32),
            md5: "cd".repeat(16),
            size: 42,
        };
        let json = serde_json::to_value(JsonOutput::success("checksum", Digests::from(&result))).unwrap();

        assert_eq!(json["operation"], "checksum");
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["size"], 42);
        assert_eq!(json["data"]["md5"], "cd".repeat(16));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::to_value(JsonOutput::<()>::error("create", "boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }
}
