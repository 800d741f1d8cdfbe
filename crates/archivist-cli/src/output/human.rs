//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use archivist_core::ArchiveResult;
use archivist_core::BuildReport;
use console::Term;
use console::style;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
    err_term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
            err_term: Term::stderr(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn write_digests(&self, result: &ArchiveResult) {
        let size = if self.verbose {
            format!("{} ({} bytes)", Self::format_size(result.size), result.size)
        } else {
            Self::format_size(result.size)
        };
        let _ = self.term.write_line(&format!("  Size:     {size}"));
        let _ = self.term.write_line(&format!("  MD5:      {}", result.md5));
        let _ = self.term.write_line(&format!("  SHA-256:  {}", result.sha256));
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_build_report(&self, report: &BuildReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Archive created: {}",
                style("✓").green().bold(),
                report.path.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("Archive created: {}", report.path.display()));
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!("  Format:   {}", report.format));
        let _ = self.term.write_line(&format!(
            "  Entries:  {}",
            Self::format_number(report.entries_written)
        ));
        if report.entries_excluded > 0 {
            let _ = self.term.write_line(&format!(
                "  Excluded: {}",
                Self::format_number(report.entries_excluded)
            ));
        }
        self.write_digests(&report.result);

        if !report.warnings.is_empty() {
            let _ = self.term.write_line("");
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{}", style("Skipped:").yellow().bold()));
            } else {
                let _ = self.term.write_line("Skipped:");
            }
            for warning in &report.warnings {
                let _ = self
                    .term
                    .write_line(&format!("  - {}: {}", warning.item, warning.error));
            }
        }

        Ok(())
    }

    fn format_checksum(&self, archive: &Path, result: &ArchiveResult) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line(&format!("{}", archive.display()));
        self.write_digests(result);
        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("WARNING: {message}"));
        }
    }
}
