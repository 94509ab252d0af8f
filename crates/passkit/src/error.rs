//! Error types for passkit operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure case of
//! the pass pipeline: document validation, credential loading, manifest
//! signing, template I/O and archive packaging.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for passkit operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Match on variants to handle specific failure cases.
///
/// # Examples
///
/// ```no_run
/// use passkit::{Error, MemorySigner, PassSigner, FolderTemplate, Pass, SigningCredentials};
/// use secrecy::SecretString;
///
/// let credentials = SigningCredentials::from_files(
///     "pass.p12",
///     &SecretString::new("password".into()),
///     "wwdr.cer",
/// )?;
/// let template = FolderTemplate::new("templates/coupon");
/// let pass = Pass::new("serial-1", "pass.com.example", "TEAM123456", "Example", "A pass");
///
/// match MemorySigner::new().create_signed_archive(&pass, &template, &credentials) {
///     Ok(bytes) => println!("{} bytes", bytes.len()),
///     Err(Error::Validation(violations)) => {
///         for violation in violations {
///             eprintln!("invalid pass: {violation}");
///         }
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok::<(), passkit::Error>(())
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Occurs when reading template content, staging files or reading
    /// credential files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The pass or personalization document failed validation.
    ///
    /// Carries every violation found, not only the first one.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Invalid or malformed certificate or key store.
    ///
    /// The PKCS#12 container or trust anchor could not be parsed, or the
    /// private key does not belong to the signing certificate.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// A signing or trust-anchor certificate is outside its validity window.
    #[error("Certificate has expired or is not yet valid: {0}")]
    CertificateExpired(String),

    /// Incorrect passphrase for the PKCS#12 key store.
    #[error("Invalid password for PKCS#12 key store")]
    InvalidPassword,

    /// Signing was requested without manifest content.
    #[error("Manifest has to be present for signing")]
    MissingManifest,

    /// Signature generation or verification failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Low-level OpenSSL failure.
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP archive operation failed.
    ///
    /// Occurs while packaging or reading a `.pkpass`. See [`crate::pkpass`].
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A bundle member path is absolute or escapes the bundle root.
    #[error("Invalid bundle path: {0}")]
    InvalidPath(String),

    /// A color could not be parsed from its hex notation.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Archive contents do not match the shipped manifest.
    #[error("Manifest mismatch: {0}")]
    ManifestMismatch(String),

    /// Remote template content could not be downloaded.
    #[cfg(feature = "remote")]
    #[error("Download failed: {0}")]
    Download(#[from] reqwest::Error),
}
