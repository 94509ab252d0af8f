//! Detached CMS (PKCS#7) signatures over `manifest.json`.
//!
//! The signature embeds the signing certificate, the PKCS#12 chain and the
//! trust anchor so that devices can build the path to the root. OpenSSL
//! attaches the `signingTime` signed attribute.

use super::SigningCredentials;
use crate::{Error, Result};
use openssl::cms::{CMSOptions, CmsContentInfo};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509};
use tracing::debug;

/// Sign `manifest` with a detached, binary CMS signature.
///
/// # Errors
///
/// Returns [`Error::MissingManifest`] for an empty manifest and
/// [`Error::Signing`] if OpenSSL refuses to build the signature.
pub fn sign_manifest(manifest: &[u8], credentials: &SigningCredentials) -> Result<Vec<u8>> {
    if manifest.is_empty() {
        return Err(Error::MissingManifest);
    }

    let mut certs = Stack::<X509>::new()?;
    for cert in credentials.chain() {
        certs.push(cert.clone())?;
    }
    certs.push(credentials.trust_anchor().to_owned())?;

    let cms = CmsContentInfo::sign(
        Some(credentials.certificate()),
        Some(credentials.private_key()),
        Some(&certs),
        Some(manifest),
        CMSOptions::DETACHED | CMSOptions::BINARY,
    )
    .map_err(|e| Error::Signing(format!("Failed to build CMS signature: {}", e)))?;

    let der = cms.to_der()?;
    debug!(manifest = manifest.len(), signature = der.len(), "Signed manifest");
    Ok(der)
}

/// Verify a detached signature over `manifest` against `trust_anchor`.
///
/// The anchor does not need to be self-signed; an intermediate such as the
/// WWDR certificate is accepted as the end of the chain.
pub fn verify_manifest_signature(
    signature: &[u8],
    manifest: &[u8],
    trust_anchor: &X509Ref,
) -> Result<()> {
    let mut cms = CmsContentInfo::from_der(signature)
        .map_err(|e| Error::Signing(format!("Invalid CMS signature: {}", e)))?;

    let mut store = X509StoreBuilder::new()?;
    store.add_cert(trust_anchor.to_owned())?;
    store.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
    let store = store.build();

    cms.verify(
        None,
        Some(&store),
        Some(manifest),
        None,
        CMSOptions::BINARY,
    )
    .map_err(|e| Error::Signing(format!("Signature verification failed: {}", e)))
}
