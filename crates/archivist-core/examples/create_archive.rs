//! Example: Building archives with archivist-core
//!
//! Run with: `cargo run --example create_archive`

use archivist_core::ArchivePlan;
use archivist_core::ArchiveResult;
use archivist_core::ArchiveSettings;
use archivist_core::create_writer;
use archivist_core::plan::ContentBlock;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = std::env::temp_dir().join("archivist-example");
    std::fs::create_dir_all(workdir.join("site/css"))?;
    std::fs::write(workdir.join("site/index.html"), "<h1>Hello</h1>")?;
    std::fs::write(workdir.join("site/css/main.css"), "h1 { color: teal }")?;
    std::fs::write(workdir.join("site/.env"), "TOKEN=secret")?;

    // Example 1: driving a writer directly
    println!("Example 1: writer API");
    let output = workdir.join("site.tar.gz");
    let mut writer = create_writer("tar.gz").ok_or("tar.gz is always supported")?;
    let settings = ArchiveSettings::default().with_exclude_list(vec![workdir.join("site/.env")]);

    writer.open(&output, settings)?;
    let report = writer.add_dir(&workdir.join("site"), "site")?;
    writer.add_content(b"built by example\n", "site/BUILD")?;
    writer.close()?;

    let result = ArchiveResult::compute(&output)?;
    println!(
        "  {} files, {} excluded, {} bytes, sha256 {}",
        report.files_added, report.files_excluded, result.size, result.sha256
    );

    // Example 2: a declarative plan
    println!("\nExample 2: plan API");
    let report = ArchivePlan::new(workdir.join("site.zip"), "zip")
        .with_out_mode("644")
        .with_dir(workdir.join("site"))
        .with_exclude(workdir.join("site/.env"))
        .with_content(ContentBlock::from_bytes(b"1.0.0\n", "VERSION"))
        .build()?;
    println!(
        "  {} entries written to {}",
        report.entries_written,
        report.path.display()
    );
    for warning in &report.warnings {
        println!("  skipped {}: {}", warning.item, warning.error);
    }

    std::fs::remove_dir_all(Path::new(&workdir))?;
    println!("\nExamples completed successfully!");
    Ok(())
}
