//! Staging-directory realization of [`PassSigner`].

use super::{archive_directory, document_files, CompressionLevel, PassSigner};
use crate::bundle::{ManifestBuilder, GENERATED_FILES, MANIFEST_FILE, SIGNATURE_FILE};
use crate::crypto::ManifestSigner;
use crate::pass::{Pass, Personalization};
use crate::template::fs::load_dir;
use crate::template::PassTemplate;
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Builds archives by staging the bundle in a temporary directory.
///
/// The staging directory is removed on every exit path. A failure to remove
/// it is logged and otherwise ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSigner {
    compression_level: CompressionLevel,
}

impl FileSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ZIP compression level (0-9) for the output archive.
    pub fn compression_level(mut self, level: impl Into<CompressionLevel>) -> Self {
        self.compression_level = level.into();
        self
    }

    fn build_in(
        &self,
        stage: &Path,
        documents: Vec<(&'static str, Vec<u8>)>,
        template: &dyn PassTemplate,
        signer: &dyn ManifestSigner,
    ) -> Result<Vec<u8>> {
        template.provision(stage)?;

        for name in GENERATED_FILES {
            let path = stage.join(name);
            if path.exists() {
                warn!(file = name, "Ignoring template-supplied file, it is generated while signing");
                fs::remove_file(path)?;
            }
        }
        for (name, data) in documents {
            fs::write(stage.join(name), data)?;
        }

        let files = load_dir(stage)?;
        debug!(files = files.len(), stage = %stage.display(), "Staged bundle files");

        let manifest = ManifestBuilder::from_files(&files).build()?;
        let signature = signer.sign_manifest(&manifest)?;
        fs::write(stage.join(MANIFEST_FILE), &manifest)?;
        fs::write(stage.join(SIGNATURE_FILE), &signature)?;

        archive_directory(stage, self.compression_level)
    }
}

impl PassSigner for FileSigner {
    fn create_signed_personalized_archive(
        &self,
        pass: &Pass,
        personalization: Option<&Personalization>,
        template: &dyn PassTemplate,
        signer: &dyn ManifestSigner,
    ) -> Result<Vec<u8>> {
        let documents = document_files(pass, personalization)?;

        let temp_dir = TempDir::new().map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to create staging directory: {}",
                e
            )))
        })?;

        let result = self.build_in(temp_dir.path(), documents, template, signer);

        let stage = temp_dir.path().to_path_buf();
        if let Err(e) = temp_dir.close() {
            debug!(stage = %stage.display(), error = %e, "Failed to remove staging directory");
        }

        let archive = result?;
        info!(
            serial = %pass.serial_number,
            bytes = archive.len(),
            "Built pkpass archive"
        );
        Ok(archive)
    }
}
