//! Directory helpers shared by the templates and the staging signer.

use crate::bundle::{is_ignored, normalize_path, FileSet};
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

fn ensure_dir(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("Template directory not found: {}: {}", path.display(), e),
        ))
    })?;

    if !metadata.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Not a directory: {}", path.display()),
        )));
    }
    Ok(())
}

/// Walk `dir` and yield every regular file with its bundle path.
///
/// Symlinks and `.DS_Store` files are skipped.
fn walk_files(dir: &Path) -> impl Iterator<Item = Result<(String, walkdir::DirEntry)>> + '_ {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(Error::Io(io::Error::other(format!(
                        "Failed to walk directory: {}",
                        e
                    )))))
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let relative = entry.path().strip_prefix(dir).ok()?;
            match normalize_path(relative) {
                Ok(path) if is_ignored(&path) => None,
                Ok(path) => Some(Ok((path, entry))),
                Err(e) => Some(Err(e)),
            }
        })
}

/// Load every regular file below `dir` keyed by forward-slash relative path.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<FileSet> {
    let dir = dir.as_ref();
    ensure_dir(dir)?;

    let mut files = FileSet::new();
    for item in walk_files(dir) {
        let (path, entry) = item?;
        files.insert(path, fs::read(entry.path())?);
    }
    Ok(files)
}

/// Copy every regular file below `src` into `dst`, creating directories as
/// needed. Symlinks and `.DS_Store` files are skipped.
pub fn copy_dir(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    ensure_dir(src)?;

    fs::create_dir_all(dst)?;
    for item in walk_files(src) {
        let (path, entry) = item?;
        let target = dst.join(&path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), target)?;
    }
    Ok(())
}

/// Write a file set below `dst`, creating directories as needed.
pub fn write_files(files: &FileSet, dst: impl AsRef<Path>) -> Result<()> {
    let dst = dst.as_ref();
    fs::create_dir_all(dst)?;

    for (path, data) in files {
        let target = dst.join(normalize_path(path)?);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, data)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::DS_STORE;
    use tempfile::TempDir;

    fn create_template(dir: &Path) {
        fs::create_dir_all(dir.join("en.lproj")).unwrap();
        fs::write(dir.join("icon.png"), b"icon").unwrap();
        fs::write(dir.join("en.lproj/pass.strings"), b"strings").unwrap();
        fs::write(dir.join(DS_STORE), b"finder").unwrap();
    }

    #[test]
    fn test_load_dir() {
        let temp_dir = TempDir::new().unwrap();
        create_template(temp_dir.path());

        let files = load_dir(temp_dir.path()).unwrap();

        assert_eq!(
            files.keys().collect::<Vec<_>>(),
            ["en.lproj/pass.strings", "icon.png"]
        );
        assert_eq!(files["icon.png"], b"icon");
    }

    #[test]
    #[cfg(unix)]
    fn test_load_dir_skips_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        create_template(temp_dir.path());
        std::os::unix::fs::symlink("icon.png", temp_dir.path().join("link.png")).unwrap();

        let files = load_dir(temp_dir.path()).unwrap();
        assert!(!files.contains_key("link.png"));
    }

    #[test]
    fn test_load_dir_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_dir(temp_dir.path().join("missing")).is_err());

        let file = temp_dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(load_dir(&file).is_err());
    }

    #[test]
    fn test_copy_dir() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        create_template(src.path());

        copy_dir(src.path(), dst.path().join("stage")).unwrap();

        assert_eq!(load_dir(dst.path().join("stage")).unwrap(), load_dir(src.path()).unwrap());
        assert!(!dst.path().join("stage").join(DS_STORE).exists());
    }

    #[test]
    fn test_write_files() {
        let dst = TempDir::new().unwrap();
        let mut files = FileSet::new();
        files.insert("de.lproj/logo.png".into(), b"logo".to_vec());

        write_files(&files, dst.path()).unwrap();
        assert_eq!(load_dir(dst.path()).unwrap(), files);

        let mut escaping = FileSet::new();
        escaping.insert("../logo.png".into(), b"logo".to_vec());
        assert!(matches!(write_files(&escaping, dst.path()), Err(Error::InvalidPath(_))));
    }
}
