//! Template backed by a directory on disk.

use super::fs::{copy_dir, load_dir};
use super::PassTemplate;
use crate::bundle::FileSet;
use crate::Result;
use std::path::{Path, PathBuf};

/// Reads template content from a directory, including `*.lproj`
/// subdirectories. Every file keeps its full relative path.
#[derive(Debug, Clone)]
pub struct FolderTemplate {
    dir: PathBuf,
}

impl FolderTemplate {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PassTemplate for FolderTemplate {
    fn provision(&self, dir: &Path) -> Result<()> {
        copy_dir(&self.dir, dir)
    }

    fn all_files(&self) -> Result<FileSet> {
        load_dir(&self.dir)
    }
}
