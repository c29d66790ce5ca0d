use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

mod cli;

use cli::CliHandler;

#[derive(Parser)]
#[command(
    name = "jose-keygen",
    about = "Generate JOSE keys as JWK and PEM",
    long_about = "jose-keygen - Key generator for JSON Web Algorithms

Generates a secret or a key pair suitable for a given JWA algorithm, and exports it
as a JSON Web Key and, for key pairs, as SPKI / PKCS#8 PEM.

QUICK START:
  jose-keygen list                          # List supported algorithms
  jose-keygen secret HS256                  # Print a new HMAC secret as a JWK
  jose-keygen secret A256GCM -s aes         # Save a new AES key to aes.json
  jose-keygen keypair ES256 --jwk           # Print a P-256 key pair as PEM and JWK
  jose-keygen keypair RS256 -s Signing      # Save PublicSigning.pem and PrivateSigning.pem",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a secret key for a symmetric algorithm
    #[command(aliases = &["generate:secret"])]
    Secret(SecretArgs),

    /// Generate a key pair for an asymmetric algorithm
    #[command(aliases = &["generate:keypair"])]
    Keypair(KeypairArgs),

    /// List supported algorithms
    #[command(aliases = &["ls"])]
    List,
}

#[derive(Args)]
pub struct SecretArgs {
    /// JWA algorithm identifier, e.g. HS256 or A256GCM
    pub algorithm: Option<String>,

    /// Save the key to <NAME>.json
    #[arg(short, long, value_name = "NAME")]
    pub save: Option<String>,

    /// Set the key ID to the key thumbprint
    #[arg(long)]
    pub kid: bool,
}

#[derive(Args)]
pub struct KeypairArgs {
    /// JWA algorithm identifier, e.g. ES256 or RSA-OAEP
    pub algorithm: Option<String>,

    /// Also export the key pair as JWK
    #[arg(short, long)]
    pub jwk: bool,

    /// Save the keys to Public<NAME>.pem and Private<NAME>.pem (<NAME>public.json and <NAME>private.json for JWK)
    #[arg(short, long, value_name = "NAME")]
    pub save: Option<String>,

    /// Curve to use instead of the algorithm default, e.g. X25519 for ECDH-ES
    #[arg(long, value_name = "CRV")]
    pub crv: Option<String>,

    /// RSA modulus length, in bits: 2048, 3072 or 4096
    #[arg(long, value_name = "BITS")]
    pub modulus_length: Option<usize>,

    /// Set the key ID to the public key thumbprint
    #[arg(long)]
    pub kid: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let handler = CliHandler::new();
    if let Err(e) = handler.execute(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
