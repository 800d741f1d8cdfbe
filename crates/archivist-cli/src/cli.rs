//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "archivist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a new archive
    Create(CreateArgs),
    /// Print size and checksums of an existing archive
    Checksum(ChecksumArgs),
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Output archive file path (may come from --manifest)
    #[arg(value_name = "OUTPUT", required_unless_present = "manifest")]
    pub output: Option<PathBuf>,

    /// Archive format: zip or tar.gz (may come from --manifest)
    #[arg(short = 't', long = "type", value_name = "FORMAT")]
    pub archive_type: Option<String>,

    /// Octal permission bits of the output file, e.g. 644
    #[arg(short = 'm', long, value_name = "MODE")]
    pub out_mode: Option<String>,

    /// Archive symlink targets instead of the links
    #[arg(long)]
    pub resolve_symlinks: bool,

    /// Path that must never be archived (can be repeated)
    #[arg(long = "exclude", short = 'x', value_name = "PATH")]
    pub exclude: Vec<PathBuf>,

    /// File to add (can be repeated)
    #[arg(long = "file", short = 'f', value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Directory to add recursively (can be repeated)
    #[arg(long = "dir", short = 'd', value_name = "PATH")]
    pub dirs: Vec<PathBuf>,

    /// In-memory entry as DEST=BASE64 (can be repeated)
    #[arg(long = "content", short = 'c', value_name = "DEST=BASE64", value_parser = parse_content)]
    pub contents: Vec<(String, String)>,

    /// TOML manifest describing the archive; flags extend it
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ChecksumArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

/// Parse `DEST=BASE64` into its two halves
fn parse_content(s: &str) -> Result<(String, String), String> {
    let (dest, data) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DEST=BASE64, got '{s}'"))?;
    if dest.is_empty() {
        return Err("content destination is empty".to_string());
    }
    Ok((dest.to_string(), data.to_string()))
}
