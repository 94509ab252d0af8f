//! `.pkpass` assembly: validation, manifest, signature and packaging.
//!
//! [`PassSigner`] has two realizations that produce the same archive for the
//! same input:
//!
//! - [`MemorySigner`] works on byte buffers only
//! - [`FileSigner`] stages the bundle in a temporary directory and packages
//!   the directory
//!
//! Both validate the documents before touching the template, the manifest or
//! the signer, so an invalid pass never causes any hashing or signing.
//!
//! # Examples
//!
//! ```no_run
//! use passkit::{FolderTemplate, MemorySigner, Pass, PassSigner, SigningCredentials};
//! use passkit::pass::{Field, PassStyle};
//! use secrecy::SecretString;
//!
//! let credentials = SigningCredentials::from_files(
//!     "pass.p12",
//!     &SecretString::new("password".into()),
//!     "wwdr.cer",
//! )?;
//!
//! let mut pass = Pass::new("serial-1", "pass.com.example", "TEAM123456", "Example", "Coupon");
//! let mut style = PassStyle::coupon();
//! style.fields_mut().add_primary_field(Field::new("offer", "20% off"));
//! pass.set_style(style);
//!
//! let template = FolderTemplate::new("templates/coupon");
//! let pkpass = MemorySigner::new()
//!     .compression_level(9)
//!     .create_signed_archive(&pass, &template, &credentials)?;
//! std::fs::write("coupon.pkpass", pkpass)?;
//! # Ok::<(), passkit::Error>(())
//! ```

pub mod archive;
pub mod extract;
pub mod memory;
pub mod staged;

pub use archive::{archive_directory, write_archive, CompressionLevel};
pub use extract::{read_archive, validate_pkpass, verify_archive};
pub use memory::MemorySigner;
pub use staged::FileSigner;

use crate::bundle::{PASS_FILE, PERSONALIZATION_FILE};
use crate::crypto::ManifestSigner;
use crate::pass::{Pass, Personalization, Validate};
use crate::template::PassTemplate;
use crate::{Error, Result};
use tracing::debug;

/// Builds signed `.pkpass` archives.
pub trait PassSigner {
    /// Build a signed archive for `pass` with the content of `template`.
    fn create_signed_archive(
        &self,
        pass: &Pass,
        template: &dyn PassTemplate,
        signer: &dyn ManifestSigner,
    ) -> Result<Vec<u8>> {
        self.create_signed_personalized_archive(pass, None, template, signer)
    }

    /// Build a signed archive that also ships `personalization.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with every violation of the pass and the
    /// personalization document. Other errors come from the template, the
    /// signer or the archive writer unchanged.
    fn create_signed_personalized_archive(
        &self,
        pass: &Pass,
        personalization: Option<&Personalization>,
        template: &dyn PassTemplate,
        signer: &dyn ManifestSigner,
    ) -> Result<Vec<u8>>;
}

/// Validate both documents and serialize them under their reserved names.
pub(crate) fn document_files(
    pass: &Pass,
    personalization: Option<&Personalization>,
) -> Result<Vec<(&'static str, Vec<u8>)>> {
    let mut errors = pass.validation_errors();
    if let Some(personalization) = personalization {
        errors.extend(personalization.validation_errors());
    }
    if !errors.is_empty() {
        debug!(violations = errors.len(), "Pass failed validation");
        return Err(Error::Validation(errors));
    }

    let mut documents = vec![(PASS_FILE, pass.to_json()?)];
    if let Some(personalization) = personalization {
        documents.push((PERSONALIZATION_FILE, personalization.to_json()?));
    }
    Ok(documents)
}
