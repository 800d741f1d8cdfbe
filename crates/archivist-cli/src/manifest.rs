//! TOML archive manifests.
//!
//! A manifest describes one archive with the same fields as the `create`
//! flags:
//!
//! ```toml
//! name = "dist/site.zip"
//! type = "zip"
//! out_mode = "644"
//! resolve_symlinks = true
//! exclude_list = ["public/.env"]
//!
//! [[file]]
//! path = "README.md"
//!
//! [[dir]]
//! path = "public"
//!
//! [[content]]
//! src = "djEuMi4wCg=="
//! file_path = "VERSION"
//! ```
//!
//! Relative paths are resolved against the current directory, like paths
//! given on the command line.

use anyhow::Context;
use anyhow::Result;
use archivist_core::ArchivePlan;
use archivist_core::plan::ContentBlock;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: Option<PathBuf>,
    #[serde(rename = "type")]
    pub archive_type: Option<String>,
    pub out_mode: Option<String>,
    #[serde(default)]
    pub resolve_symlinks: bool,
    #[serde(default)]
    pub exclude_list: Vec<PathBuf>,
    #[serde(default, rename = "file")]
    pub files: Vec<PathEntry>,
    #[serde(default, rename = "dir")]
    pub dirs: Vec<PathEntry>,
    #[serde(default, rename = "content")]
    pub contents: Vec<ContentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathEntry {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentEntry {
    pub src: String,
    pub file_path: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid manifest '{}'", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Converts into a plan; missing name or type become empty values that
    /// the caller must fill in.
    pub fn into_plan(self) -> ArchivePlan {
        let mut plan = ArchivePlan::new(
            self.name.unwrap_or_default(),
            self.archive_type.unwrap_or_default(),
        )
        .with_resolve_symlinks(self.resolve_symlinks);

        plan.out_mode = self.out_mode;
        plan.exclude_list = self.exclude_list;
        plan.files = self.files.into_iter().map(|f| f.path).collect();
        plan.dirs = self.dirs.into_iter().map(|d| d.path).collect();
        plan.contents = self
            .contents
            .into_iter()
            .map(|c| ContentBlock::new(c.src, c.file_path))
            .collect();
        plan
    }
}
