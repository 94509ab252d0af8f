//! Build, sign and package Wallet `.pkpass` bundles.
//!
//! The pipeline validates a [`Pass`], merges it with template content from a
//! [`PassTemplate`], hashes every member into `manifest.json`, signs the
//! manifest with a detached CMS signature and packages everything into a ZIP
//! archive.

pub mod bundle;
pub mod crypto;
pub mod error;
pub mod pass;
pub mod pkpass;
pub mod template;

pub use bundle::{FileSet, ManifestBuilder};
pub use crypto::{ManifestSigner, SigningCredentials};
pub use error::Error;
pub use pass::{Field, Pass, PassStyle, Personalization, Validate};
pub use pkpass::{
    read_archive, verify_archive, write_archive, CompressionLevel, FileSigner, MemorySigner,
    PassSigner,
};
pub use template::{FolderTemplate, InMemoryTemplate, PassTemplate};

pub type Result<T> = std::result::Result<T, Error>;
