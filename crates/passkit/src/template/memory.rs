//! Template assembled in memory.

use super::fs::{load_dir, write_files};
use super::{localized_path, PassTemplate};
use crate::bundle::{normalize_path, FileSet};
use crate::{Error, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe in-memory template.
///
/// Files can be added from many threads at once; every access is serialized
/// through one mutex.
///
/// ```
/// use passkit::{InMemoryTemplate, PassTemplate};
///
/// let template = InMemoryTemplate::new();
/// template.add_file("icon.png", b"icon".to_vec())?;
/// template.add_localized_file("logo.png", "de", b"logo".to_vec())?;
///
/// let files = template.all_files()?;
/// assert!(files.contains_key("de.lproj/logo.png"));
/// # Ok::<(), passkit::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTemplate {
    files: Mutex<FileSet>,
}

/// Ceiling for a single remote download.
#[cfg(feature = "remote")]
pub const DOWNLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

impl InMemoryTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, FileSet> {
        // A panic while holding the lock cannot leave the map half-written.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add or replace a file at `name`.
    ///
    /// A path that is both a file and a directory of the template, such as
    /// `a` next to `a/b`, is rejected with [`Error::InvalidPath`].
    pub fn add_file(&self, name: &str, data: Vec<u8>) -> Result<()> {
        let path = normalize_path(name)?;
        insert(&mut self.files(), path, data)
    }

    /// Add or replace a file inside the `.lproj` directory of `locale`.
    pub fn add_localized_file(&self, name: &str, locale: &str, data: Vec<u8>) -> Result<()> {
        self.add_file(&localized_path(name, locale), data)
    }

    /// Add every file below `dir`, keeping relative paths.
    pub fn add_all_files(&self, dir: impl AsRef<Path>) -> Result<()> {
        let loaded = load_dir(dir)?;
        let mut files = self.files();
        for (path, data) in loaded {
            insert(&mut files, path, data)?;
        }
        Ok(())
    }

    /// Download `url` and store it at `name`.
    #[cfg(feature = "remote")]
    pub fn add_file_from_url(&self, name: &str, url: &str) -> Result<()> {
        let data = download(url)?;
        self.add_file(name, data)
    }

    /// Download `url` and store it inside the `.lproj` directory of `locale`.
    #[cfg(feature = "remote")]
    pub fn add_localized_file_from_url(&self, name: &str, locale: &str, url: &str) -> Result<()> {
        let data = download(url)?;
        self.add_localized_file(name, locale, data)
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }
}

fn insert(files: &mut FileSet, path: String, data: Vec<u8>) -> Result<()> {
    if let Some(other) = clashing_path(files, &path) {
        return Err(Error::InvalidPath(format!(
            "{path} clashes with {other}, a path can't be both file and directory"
        )));
    }
    files.insert(path, data);
    Ok(())
}

/// An existing entry that is a parent directory of `path` or lives below it.
fn clashing_path(files: &FileSet, path: &str) -> Option<String> {
    let ancestor = path
        .match_indices('/')
        .map(|(end, _)| &path[..end])
        .find(|parent| files.contains_key(*parent));
    if let Some(parent) = ancestor {
        return Some(parent.to_string());
    }

    let prefix = format!("{path}/");
    files
        .range(prefix.clone()..)
        .next()
        .filter(|(key, _)| key.starts_with(&prefix))
        .map(|(key, _)| key.clone())
}

#[cfg(feature = "remote")]
fn download(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    let data = response.bytes()?;
    tracing::debug!(url, bytes = data.len(), "Downloaded template file");
    Ok(data.to_vec())
}

impl PassTemplate for InMemoryTemplate {
    fn provision(&self, dir: &Path) -> Result<()> {
        let files = self.files().clone();
        write_files(&files, dir)
    }

    fn all_files(&self) -> Result<FileSet> {
        Ok(self.files().clone())
    }
}
