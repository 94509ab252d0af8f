//! End-to-end tests of the signing pipeline with a throwaway PKI.
//!
//! Every test generates its own CA, a leaf certificate issued by it and a
//! PKCS#12 key store, then builds real signed archives from a template
//! folder on disk.

use chrono::{TimeZone, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use passkit::bundle::{FileSet, ManifestBuilder};
use passkit::crypto::cms::verify_manifest_signature;
use passkit::pass::{
    Barcode, BarcodeFormat, Field, PassStyle, PersonalizationField, RelevantDate, TransitType,
};
use passkit::{
    read_archive, verify_archive, Error, FileSigner, FolderTemplate, ManifestSigner,
    MemorySigner, Pass, PassSigner, Personalization, SigningCredentials,
};
use secrecy::SecretString;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

const DAY: i64 = 24 * 60 * 60;
const PASSWORD: &str = "p12-password";

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn certificate(
    common_name: &str,
    serial: u32,
    key: &PKey<Private>,
    issuer: Option<(&X509, &PKey<Private>)>,
    valid_days: (i64, i64),
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    name.append_entry_by_text("OU", "TEAM123456").unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();

    let now = Utc::now().timestamp();
    builder
        .set_not_before(&Asn1Time::from_unix(now + valid_days.0 * DAY).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::from_unix(now + valid_days.1 * DAY).unwrap())
        .unwrap();

    match issuer {
        Some((ca_cert, ca_key)) => {
            builder.set_issuer_name(ca_cert.subject_name()).unwrap();
            builder.sign(ca_key, MessageDigest::sha256()).unwrap();
        }
        None => {
            builder.set_issuer_name(&name).unwrap();
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder.sign(key, MessageDigest::sha256()).unwrap();
        }
    }
    builder.build()
}

struct Pki {
    ca_cert: X509,
    p12: Vec<u8>,
}

impl Pki {
    fn generate(leaf_validity: (i64, i64)) -> Self {
        let ca_key = ec_key();
        let ca_cert = certificate("Test WWDR", 1, &ca_key, None, (-1, 365));
        let leaf_key = ec_key();
        let leaf_cert = certificate(
            "Pass Type ID: pass.com.example.coupon",
            2,
            &leaf_key,
            Some((&ca_cert, &ca_key)),
            leaf_validity,
        );
        let p12 = Pkcs12::builder()
            .name("pass")
            .pkey(&leaf_key)
            .cert(&leaf_cert)
            .build2(PASSWORD)
            .unwrap()
            .to_der()
            .unwrap();

        Self { ca_cert, p12 }
    }

    fn credentials(&self) -> passkit::Result<SigningCredentials> {
        SigningCredentials::from_pkcs12(
            &self.p12,
            &SecretString::new(PASSWORD.to_string()),
            &self.ca_cert.to_pem().unwrap(),
        )
    }
}

fn create_template(dir: &Path) {
    fs::create_dir_all(dir.join("en.lproj")).unwrap();
    fs::create_dir_all(dir.join("de.lproj")).unwrap();
    fs::write(dir.join("icon.png"), b"icon").unwrap();
    fs::write(dir.join("icon@2x.png"), b"icon retina").unwrap();
    fs::write(dir.join("en.lproj/logo.png"), b"logo en").unwrap();
    fs::write(dir.join("de.lproj/logo.png"), b"logo de").unwrap();
    fs::write(dir.join("de.lproj/pass.strings"), "\"offer\" = \"Angebot\";").unwrap();
}

fn boarding_pass() -> Pass {
    let mut pass = Pass::new(
        "A1B2C3",
        "pass.com.example.coupon",
        "TEAM123456",
        "Example Air",
        "Boarding pass",
    );
    pass.grouping_identifier = Some("flight-42".into());
    pass.barcodes.push(Barcode::new(
        BarcodeFormat::Qr,
        "M1DOE/JOHN",
        "iso-8859-1",
        "A1B2C3",
    ));
    pass.set_relevant_dates(vec![RelevantDate::at(
        Utc.with_ymd_and_hms(2025, 6, 19, 8, 0, 0).unwrap(),
    )]);
    pass.set_background_color_hex("#1d3c6e").unwrap();

    let mut style = PassStyle::boarding_pass(TransitType::Air);
    let fields = style.fields_mut();
    fields.add_primary_field(Field::new("origin", "SFO").label("San Francisco"));
    fields.add_primary_field(Field::new("destination", "JFK").label("New York"));
    fields.add_auxiliary_field(Field::new("seat", "12A").label("Seat"));
    pass.set_style(style);
    pass
}

fn entry_names(archive: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn without_signature(mut files: FileSet) -> FileSet {
    files.remove("signature");
    files
}

#[test]
fn test_memory_and_staged_archives_match() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());
    let template = FolderTemplate::new(temp_dir.path());
    let pass = boarding_pass();

    let from_memory = MemorySigner::new()
        .create_signed_archive(&pass, &template, &credentials)
        .unwrap();
    let from_stage = FileSigner::new()
        .create_signed_archive(&pass, &template, &credentials)
        .unwrap();

    assert_eq!(entry_names(&from_memory), entry_names(&from_stage));
    assert_eq!(
        without_signature(read_archive(&from_memory).unwrap()),
        without_signature(read_archive(&from_stage).unwrap())
    );

    verify_archive(&from_memory, &pki.ca_cert).unwrap();
    verify_archive(&from_stage, &pki.ca_cert).unwrap();
}

#[test]
fn test_archive_contains_exactly_one_entry_per_file() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());
    let personalization = Personalization::new(
        "Join our rewards program",
        vec![PersonalizationField::Name, PersonalizationField::EmailAddress],
    );

    let archive = MemorySigner::new()
        .create_signed_personalized_archive(
            &boarding_pass(),
            Some(&personalization),
            &FolderTemplate::new(temp_dir.path()),
            &credentials,
        )
        .unwrap();

    assert_eq!(
        entry_names(&archive),
        [
            "de.lproj/logo.png",
            "de.lproj/pass.strings",
            "en.lproj/logo.png",
            "icon.png",
            "icon@2x.png",
            "manifest.json",
            "pass.json",
            "personalization.json",
            "signature",
        ]
    );

    let files = read_archive(&archive).unwrap();
    let manifest: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(&files["manifest.json"]).unwrap();
    assert_eq!(manifest.len(), 7);
    assert_eq!(
        manifest["de.lproj/logo.png"],
        ManifestBuilder::hash_data(b"logo de")
    );
    assert!(!manifest.contains_key("manifest.json"));
    assert!(!manifest.contains_key("signature"));
}

#[test]
fn test_repeated_signing_differs_but_verifies() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());
    let template = FolderTemplate::new(temp_dir.path());

    let first = read_archive(
        &MemorySigner::new()
            .create_signed_archive(&boarding_pass(), &template, &credentials)
            .unwrap(),
    )
    .unwrap();
    let second = read_archive(
        &MemorySigner::new()
            .create_signed_archive(&boarding_pass(), &template, &credentials)
            .unwrap(),
    )
    .unwrap();

    assert_eq!(first["manifest.json"], second["manifest.json"]);
    assert_ne!(first["signature"], second["signature"]);

    for files in [&first, &second] {
        verify_manifest_signature(&files["signature"], &files["manifest.json"], &pki.ca_cert)
            .unwrap();
    }
}

#[test]
fn test_signature_covers_shipped_manifest_bytes() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());

    let archive = FileSigner::new()
        .compression_level(0)
        .create_signed_archive(&boarding_pass(), &FolderTemplate::new(temp_dir.path()), &credentials)
        .unwrap();
    let files = read_archive(&archive).unwrap();

    let rebuilt = ManifestBuilder::from_files(&files).build().unwrap();
    assert_eq!(rebuilt, files["manifest.json"]);

    let mut altered = files["manifest.json"].clone();
    altered.push(b' ');
    assert!(verify_manifest_signature(&files["signature"], &altered, &pki.ca_cert).is_err());
}

#[test]
fn test_tampered_archive_fails_verification() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());

    let archive = MemorySigner::new()
        .create_signed_archive(&boarding_pass(), &FolderTemplate::new(temp_dir.path()), &credentials)
        .unwrap();
    let mut files = read_archive(&archive).unwrap();
    files.insert("icon.png".into(), b"replaced".to_vec());
    let tampered = passkit::write_archive(&files, Default::default()).unwrap();

    assert!(matches!(
        verify_archive(&tampered, &pki.ca_cert),
        Err(Error::ManifestMismatch(_))
    ));

    let other = Pki::generate((-1, 365));
    assert!(verify_archive(&archive, &other.ca_cert).is_err());
}

#[test]
fn test_invalid_pass_is_rejected_before_signing() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path());

    let mut pass = boarding_pass();
    pass.web_service_url = Some("https://example.com/passes".into());
    pass.authentication_token = Some("short".into());
    pass.attach_style(PassStyle::coupon());

    let result = MemorySigner::new().create_signed_archive(
        &pass,
        &FolderTemplate::new(temp_dir.path()),
        &credentials,
    );

    match result {
        Err(Error::Validation(violations)) => assert_eq!(violations.len(), 2, "{violations:?}"),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_expired_signing_certificate_is_rejected() {
    let pki = Pki::generate((-30, -1));
    assert!(matches!(pki.credentials(), Err(Error::CertificateExpired(_))));
}

#[test]
fn test_empty_manifest_is_rejected() {
    let pki = Pki::generate((-1, 365));
    let credentials = pki.credentials().unwrap();
    assert!(matches!(
        credentials.sign_manifest(&[]),
        Err(Error::MissingManifest)
    ));
}
