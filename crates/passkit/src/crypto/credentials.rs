//! PKCS#12 signing identity plus the trust-anchor certificate.

use super::{cms, load_certificate, ManifestSigner};
use crate::{Error, Result};
use openssl::asn1::Asn1Time;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509VerifyResult, X509};
use secrecy::{ExposeSecret, SecretString};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Everything needed to sign a manifest.
///
/// Certificates are checked once on construction. The credentials are
/// immutable afterwards and are never serialized.
pub struct SigningCredentials {
    certificate: X509,
    private_key: PKey<Private>,
    /// Extra certificates shipped in the PKCS#12
    chain: Vec<X509>,
    trust_anchor: X509,
}

impl SigningCredentials {
    /// Load a PKCS#12 key store and a PEM or DER trust anchor from memory.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPassword`] if the passphrase does not open the key store
    /// - [`Error::Certificate`] if either input cannot be parsed or the
    ///   private key does not belong to the certificate
    /// - [`Error::CertificateExpired`] if a certificate is outside its validity window
    pub fn from_pkcs12(
        pkcs12_der: &[u8],
        password: &SecretString,
        trust_anchor: &[u8],
    ) -> Result<Self> {
        let pkcs12 = Pkcs12::from_der(pkcs12_der)
            .map_err(|e| Error::Certificate(format!("Invalid PKCS#12: {}", e)))?;

        let parsed = pkcs12.parse2(password.expose_secret()).map_err(|e| {
            let wrong_password = e
                .errors()
                .iter()
                .any(|err| err.reason() == Some("mac verify failure"));
            if wrong_password {
                Error::InvalidPassword
            } else {
                Error::Certificate(format!("Failed to parse PKCS#12: {}", e))
            }
        })?;

        let certificate = parsed
            .cert
            .ok_or_else(|| Error::Certificate("No certificate in PKCS#12".into()))?;
        let private_key = parsed
            .pkey
            .ok_or_else(|| Error::Certificate("No private key in PKCS#12".into()))?;
        let chain: Vec<X509> = parsed
            .ca
            .map(|stack| stack.into_iter().collect())
            .unwrap_or_default();

        let trust_anchor = load_certificate(trust_anchor)?;

        Self::validate_key_pair(&certificate, &private_key)?;
        Self::check_validity(&certificate, "signing certificate")?;
        Self::check_validity(&trust_anchor, "trust anchor")?;

        let known_issuer = std::iter::once(&trust_anchor)
            .chain(&chain)
            .any(|ca| ca.issued(&certificate) == X509VerifyResult::OK);
        if !known_issuer {
            warn!(
                subject = %describe(&certificate),
                "Signing certificate is not issued by the trust anchor"
            );
        }

        debug!(
            subject = %describe(&certificate),
            chain = chain.len(),
            "Loaded signing credentials"
        );

        Ok(Self {
            certificate,
            private_key,
            chain,
            trust_anchor,
        })
    }

    /// Load the key store and trust anchor from files.
    pub fn from_files(
        pkcs12_path: impl AsRef<Path>,
        password: &SecretString,
        trust_anchor_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let pkcs12 = fs::read(pkcs12_path)?;
        let trust_anchor = fs::read(trust_anchor_path)?;
        Self::from_pkcs12(&pkcs12, password, &trust_anchor)
    }

    pub fn certificate(&self) -> &X509Ref {
        &self.certificate
    }

    pub(crate) fn private_key(&self) -> &PKeyRef<Private> {
        &self.private_key
    }

    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    pub fn trust_anchor(&self) -> &X509Ref {
        &self.trust_anchor
    }

    /// Team identifier from the certificate subject's OU.
    pub fn team_id(&self) -> Option<String> {
        self.certificate
            .subject_name()
            .entries_by_nid(Nid::ORGANIZATIONALUNITNAME)
            .find_map(|entry| entry.data().as_utf8().ok().map(|data| data.to_string()))
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(cert: &X509Ref, private_key: &PKeyRef<Private>) -> Result<()> {
        let cert_public_key = cert.public_key().map_err(|e| {
            Error::Certificate(format!(
                "Failed to extract public key from certificate: {}",
                e
            ))
        })?;

        if !private_key.public_eq(&cert_public_key) {
            return Err(Error::Certificate(
                "Private key does not match certificate public key".into(),
            ));
        }

        Ok(())
    }

    fn check_validity(cert: &X509Ref, what: &str) -> Result<()> {
        let now = Asn1Time::days_from_now(0)?;

        if cert.not_after().compare(&now)? == Ordering::Less {
            return Err(Error::CertificateExpired(format!(
                "{what} expired at {}",
                cert.not_after()
            )));
        }
        if cert.not_before().compare(&now)? == Ordering::Greater {
            return Err(Error::CertificateExpired(format!(
                "{what} is not valid before {}",
                cert.not_before()
            )));
        }

        Ok(())
    }
}

impl ManifestSigner for SigningCredentials {
    fn sign_manifest(&self, manifest: &[u8]) -> Result<Vec<u8>> {
        cms::sign_manifest(manifest, self)
    }
}

impl fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("certificate", &describe(&self.certificate))
            .field("chain", &self.chain.len())
            .field("trust_anchor", &describe(&self.trust_anchor))
            .finish_non_exhaustive()
    }
}

fn describe(cert: &X509Ref) -> String {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .find_map(|entry| entry.data().as_utf8().ok().map(|data| data.to_string()))
        .unwrap_or_else(|| "<no common name>".to_string())
}
