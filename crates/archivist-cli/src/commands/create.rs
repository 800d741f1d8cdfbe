//! Create command implementation.

use crate::cli::CreateArgs;
use crate::error::convert_archive_error;
use crate::manifest::Manifest;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use archivist_core::ArchivePlan;
use archivist_core::plan::ContentBlock;

pub fn execute(args: &CreateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let plan = build_plan(args)?;

    tracing::debug!(
        output = %plan.name.display(),
        format = %plan.format,
        files = plan.files.len(),
        dirs = plan.dirs.len(),
        contents = plan.contents.len(),
        "building archive"
    );

    let report = plan
        .build()
        .map_err(|e| convert_archive_error(e, &plan.name))?;

    if !report.warnings.is_empty() {
        formatter.format_warning(&format!(
            "{} item(s) could not be archived; the archive is partial",
            report.warnings.len()
        ));
    }

    formatter.format_build_report(&report)
}

/// Merges the optional manifest with command-line flags.
///
/// Flags override the manifest's scalar fields and extend its lists.
fn build_plan(args: &CreateArgs) -> Result<ArchivePlan> {
    let mut plan = match &args.manifest {
        Some(path) => Manifest::load(path)?.into_plan(),
        None => Manifest::default().into_plan(),
    };

    if let Some(output) = &args.output {
        plan.name.clone_from(output);
    }
    if let Some(archive_type) = &args.archive_type {
        plan.format.clone_from(archive_type);
    }
    if args.out_mode.is_some() {
        plan.out_mode.clone_from(&args.out_mode);
    }
    plan.resolve_symlinks |= args.resolve_symlinks;

    plan.exclude_list.extend(args.exclude.iter().cloned());
    plan.files.extend(args.files.iter().cloned());
    plan.dirs.extend(args.dirs.iter().cloned());
    plan.contents.extend(
        args.contents
            .iter()
            .map(|(dest, data)| ContentBlock::new(data.clone(), dest.clone())),
    );

    if plan.name.as_os_str().is_empty() {
        bail!("No output path given\nHINT: Pass OUTPUT or set `name` in the manifest.");
    }
    if plan.format.is_empty() {
        bail!("No archive format given\nHINT: Pass --type zip|tar.gz or set `type` in the manifest.");
    }

    Ok(plan)
}
