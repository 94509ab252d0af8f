//! Command-line interface for building and checking Wallet passes.
//!
//! `passkit sign` turns a template folder and a `pass.json` into a signed
//! `.pkpass`; `passkit verify` checks the manifest and signature of an
//! existing archive.

use clap::{Args, Parser, Subcommand};
use passkit::crypto::{load_certificate, SigningCredentials};
use passkit::{
    verify_archive, Error, FileSigner, FolderTemplate, MemorySigner, Pass, PassSigner,
    Personalization,
};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passkit", version, about = "Wallet pass signing tool")]
struct Cli {
    /// Verbose output, repeat for more (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a signed .pkpass from a template folder and a pass.json
    Sign(SignArgs),
    /// Check the manifest and signature of a .pkpass
    Verify(VerifyArgs),
}

#[derive(Args)]
struct SignArgs {
    /// Template folder with images and *.lproj directories
    #[arg(short, long)]
    template: PathBuf,

    /// pass.json to sign
    #[arg(long)]
    pass: PathBuf,

    /// Optional personalization.json
    #[arg(long)]
    personalization: Option<PathBuf>,

    /// PKCS#12 file (.p12) with the pass type certificate
    #[arg(short = 'p', long)]
    pkcs12: PathBuf,

    /// Password for the PKCS#12 file
    #[arg(long, env = "PASSKIT_P12_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Trust anchor certificate (PEM or DER), e.g. Apple WWDR
    #[arg(short = 'a', long)]
    trust_anchor: PathBuf,

    /// Output file (default: <serialNumber>.pkpass)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stage the bundle in a temporary directory instead of memory
    #[arg(long)]
    staged: bool,

    /// ZIP compression level (0-9, default: 6)
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,
}

#[derive(Args)]
struct VerifyArgs {
    /// .pkpass file to check
    input: PathBuf,

    /// Trust anchor certificate (PEM or DER)
    #[arg(short = 'a', long)]
    trust_anchor: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Sign(args) => sign(&args),
        Commands::Verify(args) => verify(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Validation(violations)) => {
            eprintln!("Pass is invalid:");
            for violation in violations {
                eprintln!("  - {violation}");
            }
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn sign(args: &SignArgs) -> passkit::Result<()> {
    let pass = Pass::from_json(&std::fs::read(&args.pass)?)?;
    let personalization = args
        .personalization
        .as_deref()
        .map(load_personalization)
        .transpose()?;

    let password = SecretString::new(args.password.clone().unwrap_or_default());
    let credentials = SigningCredentials::from_files(&args.pkcs12, &password, &args.trust_anchor)?;
    if let Some(team_id) = credentials.team_id() {
        if team_id != pass.team_identifier {
            tracing::warn!(
                certificate = %team_id,
                pass = %pass.team_identifier,
                "teamIdentifier does not match the certificate"
            );
        }
    }

    let template = FolderTemplate::new(&args.template);
    let archive = if args.staged {
        FileSigner::new()
            .compression_level(args.zip_level)
            .create_signed_personalized_archive(&pass, personalization.as_ref(), &template, &credentials)?
    } else {
        MemorySigner::new()
            .compression_level(args.zip_level)
            .create_signed_personalized_archive(&pass, personalization.as_ref(), &template, &credentials)?
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.pkpass", pass.serial_number)));
    std::fs::write(&output, archive)?;

    println!("Signed: {}", output.display());
    Ok(())
}

fn load_personalization(path: &Path) -> passkit::Result<Personalization> {
    Ok(serde_json::from_slice(&std::fs::read(path)?)?)
}

fn verify(args: &VerifyArgs) -> passkit::Result<()> {
    let anchor = load_certificate(&std::fs::read(&args.trust_anchor)?)?;
    let archive = std::fs::read(&args.input)?;

    let files = verify_archive(&archive, &anchor)?;
    for (path, data) in &files {
        println!("{:>10}  {path}", data.len());
    }
    println!("Verified: {} ({} files)", args.input.display(), files.len());
    Ok(())
}
