//! Reading and verifying `.pkpass` archives.

use crate::bundle::{normalize_path, FileSet, ManifestBuilder, MANIFEST_FILE, PASS_FILE, SIGNATURE_FILE};
use crate::crypto::cms::verify_manifest_signature;
use crate::{Error, Result};
use openssl::x509::X509Ref;
use std::io::{self, Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Upper bound for preallocating an entry buffer from its declared size.
const MAX_PREALLOC: u64 = 1 << 20;

/// Check the ZIP magic bytes (`PK`).
pub fn validate_pkpass(data: &[u8]) -> Result<()> {
    if !data.starts_with(b"PK") {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "Not a valid ZIP/pkpass file",
        )));
    }
    Ok(())
}

/// Buffer size to reserve for an entry whose header declares `declared` bytes.
///
/// The header of an untrusted archive can claim any size; the buffer still
/// grows past the hint while reading.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Read every file entry of an archive into a [`FileSet`].
///
/// Directory entries are skipped. Entry names that are absolute or escape
/// the bundle root are rejected with [`Error::InvalidPath`].
pub fn read_archive(data: &[u8]) -> Result<FileSet> {
    validate_pkpass(data)?;

    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut files = FileSet::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let path = normalize_path(entry.name())?;
        let mut contents = Vec::with_capacity(capacity_hint(entry.size()));
        entry.read_to_end(&mut contents)?;
        files.insert(path, contents);
    }

    Ok(files)
}

/// Read an archive and check it the way a device would.
///
/// The manifest must cover exactly the shipped files and the signature must
/// verify over the shipped manifest bytes against `trust_anchor`.
pub fn verify_archive(data: &[u8], trust_anchor: &X509Ref) -> Result<FileSet> {
    let files = read_archive(data)?;

    if !files.contains_key(PASS_FILE) {
        return Err(Error::ManifestMismatch(format!("archive has no {PASS_FILE}")));
    }
    let manifest = files
        .get(MANIFEST_FILE)
        .ok_or_else(|| Error::ManifestMismatch(format!("archive has no {MANIFEST_FILE}")))?;
    let signature = files
        .get(SIGNATURE_FILE)
        .ok_or_else(|| Error::Signing(format!("archive has no {SIGNATURE_FILE}")))?;

    ManifestBuilder::verify(&files, manifest)?;
    verify_manifest_signature(signature, manifest, trust_anchor)?;

    debug!(files = files.len(), "Verified pkpass archive");
    Ok(files)
}
