//! ZIP packaging of a finished bundle.
//!
//! Entries are written in path order with a fixed timestamp and fixed
//! permissions and without directory entries, so the same file set always
//! packages to the same bytes.
//!
//! For the reverse operation, see the [`extract`](super::extract) module.

use crate::bundle::FileSet;
use crate::template::fs::load_dir;
use crate::Result;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// ZIP compression level for `.pkpass` creation.
///
/// # Examples
///
/// ```
/// use passkit::CompressionLevel;
///
/// let fast = CompressionLevel::NONE;
/// let balanced = CompressionLevel::DEFAULT;
/// let small = CompressionLevel::MAX;
///
/// // Custom levels are clamped to 0-9
/// let custom = CompressionLevel::new(3);
/// assert_eq!(custom.level(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// Stored entries (level 0).
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Deflate level 6.
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Deflate level 9.
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9.
    ///
    /// Values greater than 9 are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    /// Returns the compression level value (0-9).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn file_options(self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default()
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        if self.0 == 0 {
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.0)))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Package `files` into an in-memory ZIP archive, one entry per path.
///
/// # Errors
///
/// Returns [`crate::Error::Zip`] if an entry cannot be written. No partial
/// archive is returned.
pub fn write_archive(files: &FileSet, compression_level: CompressionLevel) -> Result<Vec<u8>> {
    let options = compression_level.file_options();
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (path, data) in files {
        zip.start_file(path.as_str(), options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Package every regular file below `dir` through [`write_archive`].
pub fn archive_directory(
    dir: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<Vec<u8>> {
    let files = load_dir(dir)?;
    write_archive(&files, compression_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn sample_files() -> FileSet {
        let mut files = FileSet::new();
        files.insert("pass.json".into(), b"{}".to_vec());
        files.insert("icon.png".into(), vec![7; 512]);
        files.insert("en.lproj/pass.strings".into(), b"\"k\" = \"v\";".to_vec());
        files
    }

    fn entry_names(archive: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(archive)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_one_entry_per_file_without_directories() {
        let archive = write_archive(&sample_files(), CompressionLevel::DEFAULT).unwrap();

        let mut names = entry_names(&archive);
        names.sort();
        assert_eq!(names, ["en.lproj/pass.strings", "icon.png", "pass.json"]);
    }

    #[test]
    fn test_contents_survive_every_level() {
        for level in [CompressionLevel::NONE, CompressionLevel::DEFAULT, CompressionLevel::MAX] {
            let archive = write_archive(&sample_files(), level).unwrap();
            let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();

            let mut entry = zip.by_name("icon.png").unwrap();
            let expected = if level == CompressionLevel::NONE {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            assert_eq!(entry.compression(), expected);

            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            assert_eq!(data, vec![7; 512]);
        }
    }

    #[test]
    fn test_packaging_is_deterministic() {
        let first = write_archive(&sample_files(), CompressionLevel::DEFAULT).unwrap();
        let second = write_archive(&sample_files(), CompressionLevel::DEFAULT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_archive_directory_matches_write_archive() {
        let temp_dir = TempDir::new().unwrap();
        for (path, data) in sample_files() {
            let target = temp_dir.path().join(&path);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, data).unwrap();
        }

        let from_dir = archive_directory(temp_dir.path(), CompressionLevel::DEFAULT).unwrap();
        let from_memory = write_archive(&sample_files(), CompressionLevel::DEFAULT).unwrap();
        assert_eq!(from_dir, from_memory);
    }

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::NONE.level(), 0);
        assert_eq!(CompressionLevel::DEFAULT.level(), 6);
        assert_eq!(CompressionLevel::MAX.level(), 9);
        assert_eq!(CompressionLevel::new(15).level(), 9);
        assert_eq!(CompressionLevel::from(5).level(), 5);
        assert_eq!(CompressionLevel::default(), CompressionLevel::DEFAULT);
    }
}
