//! Checksum command implementation.

use crate::cli::ChecksumArgs;
use crate::error::convert_archive_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use archivist_core::plan::refresh;

pub fn execute(args: &ChecksumArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let result = refresh(&args.archive).map_err(|e| convert_archive_error(e, &args.archive))?;

    let Some(result) = result else {
        bail!(
            "Archive not found: {}\n\
             HINT: It may have been deleted since it was built.",
            args.archive.display()
        );
    };

    formatter.format_checksum(&args.archive, &result)
}
