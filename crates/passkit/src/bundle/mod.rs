//! Bundle contents and the integrity manifest.
//!
//! A bundle is a flat [`FileSet`]: relative path to file contents. Paths
//! always use forward slashes so that manifest keys and archive entry names
//! agree on every platform.
//!
//! # Reserved names
//!
//! | Name | Producer |
//! |------|----------|
//! | `pass.json` | serialized [`crate::Pass`] |
//! | `personalization.json` | serialized [`crate::Personalization`] |
//! | `manifest.json` | [`ManifestBuilder`] |
//! | `signature` | [`crate::ManifestSigner`] |
//!
//! # Examples
//!
//! ```
//! use passkit::bundle::{FileSet, ManifestBuilder};
//!
//! let mut files = FileSet::new();
//! files.insert("icon.png".into(), vec![0x89, 0x50, 0x4e, 0x47]);
//! let manifest = ManifestBuilder::from_files(&files).build()?;
//! assert!(manifest.starts_with(b"{\"icon.png\":"));
//! # Ok::<(), passkit::Error>(())
//! ```

pub mod manifest;

pub use manifest::ManifestBuilder;

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Bundle members keyed by forward-slash relative path.
pub type FileSet = BTreeMap<String, Vec<u8>>;

pub const PASS_FILE: &str = "pass.json";
pub const PERSONALIZATION_FILE: &str = "personalization.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "signature";

/// Finder metadata, never part of a bundle.
pub const DS_STORE: &str = ".DS_Store";

/// Names the pipeline writes itself and never takes from a template.
pub const GENERATED_FILES: [&str; 2] = [MANIFEST_FILE, SIGNATURE_FILE];

/// Converts a relative path into its bundle key.
///
/// `.` components are dropped; absolute paths and `..` are rejected with
/// [`Error::InvalidPath`].
pub fn normalize_path(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let invalid = || Error::InvalidPath(path.display().to_string());

    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid())
            }
        }
    }

    if parts.is_empty() {
        return Err(invalid());
    }
    Ok(parts.join("/"))
}

/// Returns `true` for template content that is never shipped, at any depth.
pub fn is_ignored(path: &str) -> bool {
    path.rsplit('/').next() == Some(DS_STORE)
}

/// Removes entries matched by [`is_ignored`].
pub fn drop_ignored(files: &mut FileSet) {
    files.retain(|path, _| {
        let ignored = is_ignored(path);
        if ignored {
            debug!(file = %path, "Skipping template metadata file");
        }
        !ignored
    });
}

/// Removes template-supplied `manifest.json` and `signature` entries.
pub fn drop_generated(files: &mut FileSet) {
    for name in GENERATED_FILES {
        if files.remove(name).is_some() {
            warn!(file = name, "Ignoring template-supplied file, it is generated while signing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("icon.png").unwrap(), "icon.png");
        assert_eq!(normalize_path("./en.lproj/pass.strings").unwrap(), "en.lproj/pass.strings");
        assert_eq!(normalize_path(Path::new("a").join("b").join("c.png")).unwrap(), "a/b/c.png");
    }

    #[test]
    fn test_normalize_path_rejects_escapes() {
        assert!(matches!(normalize_path("../secret"), Err(Error::InvalidPath(_))));
        assert!(matches!(normalize_path("a/../../b"), Err(Error::InvalidPath(_))));
        assert!(matches!(normalize_path("/etc/passwd"), Err(Error::InvalidPath(_))));
        assert!(matches!(normalize_path(""), Err(Error::InvalidPath(_))));
        assert!(matches!(normalize_path("."), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_drop_ignored() {
        let mut files = FileSet::new();
        files.insert(DS_STORE.into(), Vec::new());
        files.insert("en.lproj/.DS_Store".into(), Vec::new());
        files.insert("icon.png".into(), b"png".to_vec());
        files.insert("notes.DS_Store".into(), b"kept".to_vec());

        drop_ignored(&mut files);

        assert_eq!(files.keys().collect::<Vec<_>>(), ["icon.png", "notes.DS_Store"]);
    }

    #[test]
    fn test_drop_generated() {
        let mut files = FileSet::new();
        files.insert(MANIFEST_FILE.into(), b"{}".to_vec());
        files.insert(SIGNATURE_FILE.into(), b"sig".to_vec());
        files.insert("icon.png".into(), b"png".to_vec());

        drop_generated(&mut files);

        assert_eq!(files.keys().collect::<Vec<_>>(), ["icon.png"]);
    }
}
