//! `manifest.json` generation.
//!
//! The manifest maps every shipped bundle member (except the manifest and the
//! signature) to the lowercase hex SHA-1 of its contents. Keys are emitted in
//! sorted order, so identical bundles produce identical manifest bytes.

use super::{FileSet, GENERATED_FILES};
use crate::{Error, Result};
use rayon::prelude::*;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Builder for `manifest.json`.
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    /// Bundle path to hex SHA-1
    files: BTreeMap<String, String>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes every member of `files`, skipping `manifest.json` and `signature`.
    pub fn from_files(files: &FileSet) -> Self {
        let files = files
            .par_iter()
            .filter(|(path, _)| !GENERATED_FILES.contains(&path.as_str()))
            .map(|(path, data)| (path.clone(), Self::hash_data(data)))
            .collect();

        Self { files }
    }

    /// Lowercase hex SHA-1 of `data`.
    pub fn hash_data(data: &[u8]) -> String {
        format!("{:x}", Sha1::digest(data))
    }

    /// Add or replace a single entry.
    pub fn add_file(&mut self, path: impl Into<String>, data: &[u8]) {
        self.files.insert(path.into(), Self::hash_data(data));
    }

    /// Serialize the manifest.
    pub fn build(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.files)?)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(path, hash)| (path.as_str(), hash.as_str()))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Checks that `manifest` lists exactly the members of `files` with
    /// matching digests.
    pub fn verify(files: &FileSet, manifest: &[u8]) -> Result<()> {
        let expected: BTreeMap<String, String> = serde_json::from_slice(manifest)?;
        let actual = Self::from_files(files).files;

        for (path, hash) in &expected {
            match actual.get(path) {
                None => {
                    return Err(Error::ManifestMismatch(format!(
                        "{path} is listed in the manifest but missing from the bundle"
                    )))
                }
                Some(actual_hash) if actual_hash != hash => {
                    return Err(Error::ManifestMismatch(format!("{path} has a different digest")))
                }
                Some(_) => {}
            }
        }

        if let Some(path) = actual.keys().find(|path| !expected.contains_key(*path)) {
            return Err(Error::ManifestMismatch(format!(
                "{path} is not covered by the manifest"
            )));
        }

        Ok(())
    }
}
