//! Signing credentials and detached CMS signatures over the manifest.

pub mod cms;
pub mod credentials;

pub use credentials::SigningCredentials;
pub use openssl::x509::X509;

use crate::{Error, Result};

/// Produces the detached signature stored as `signature` in the bundle.
pub trait ManifestSigner {
    /// Sign the exact manifest bytes that will be shipped.
    fn sign_manifest(&self, manifest: &[u8]) -> Result<Vec<u8>>;
}

/// Parse a PEM or DER certificate.
pub fn load_certificate(data: &[u8]) -> Result<X509> {
    X509::from_pem(data)
        .or_else(|_| X509::from_der(data))
        .map_err(|e| Error::Certificate(format!("Failed to load certificate: {}", e)))
}
