//! In-memory realization of [`PassSigner`].

use super::{document_files, write_archive, CompressionLevel, PassSigner};
use crate::bundle::{drop_generated, drop_ignored, ManifestBuilder, MANIFEST_FILE, SIGNATURE_FILE};
use crate::crypto::ManifestSigner;
use crate::pass::{Pass, Personalization};
use crate::template::PassTemplate;
use crate::Result;
use tracing::{debug, info};

/// Builds archives without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySigner {
    compression_level: CompressionLevel,
}

impl MemorySigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ZIP compression level (0-9) for the output archive.
    pub fn compression_level(mut self, level: impl Into<CompressionLevel>) -> Self {
        self.compression_level = level.into();
        self
    }
}

impl PassSigner for MemorySigner {
    fn create_signed_personalized_archive(
        &self,
        pass: &Pass,
        personalization: Option<&Personalization>,
        template: &dyn PassTemplate,
        signer: &dyn ManifestSigner,
    ) -> Result<Vec<u8>> {
        let documents = document_files(pass, personalization)?;

        let mut files = template.all_files()?;
        drop_ignored(&mut files);
        drop_generated(&mut files);
        for (name, data) in documents {
            files.insert(name.to_string(), data);
        }
        debug!(files = files.len(), "Collected bundle files");

        let manifest = ManifestBuilder::from_files(&files).build()?;
        let signature = signer.sign_manifest(&manifest)?;
        files.insert(MANIFEST_FILE.to_string(), manifest);
        files.insert(SIGNATURE_FILE.to_string(), signature);

        let archive = write_archive(&files, self.compression_level)?;
        info!(
            serial = %pass.serial_number,
            entries = files.len(),
            bytes = archive.len(),
            "Built pkpass archive"
        );
        Ok(archive)
    }
}
