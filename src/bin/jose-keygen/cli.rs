use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use jose_keygen::error::{anyhow, bail, Error};
use jose_keygen::prelude::*;
use log::{debug, info};

use crate::{Commands, KeypairArgs, SecretArgs};

/// CLI handler for processing commands
pub struct CliHandler {
    output_dir: PathBuf,
}

impl Default for CliHandler {
    /// A handler that saves keys to the current directory
    fn default() -> Self {
        Self::with_output_dir(PathBuf::from("."))
    }
}

impl CliHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Execute a CLI command
    pub fn execute(&self, command: Commands) -> Result<(), Error> {
        match command {
            Commands::Secret(args) => self.handle_secret(args),
            Commands::Keypair(args) => self.handle_keypair(args),
            Commands::List => {
                print!("{}", algorithm_list());
                Ok(())
            }
        }
    }

    fn handle_secret(&self, args: SecretArgs) -> Result<(), Error> {
        let algorithm = select_algorithm(args.algorithm.as_deref(), true)?;
        let options = ProduceOptions {
            with_key_id: args.kid,
            ..Default::default()
        };
        debug!("Generating a secret key for {}", algorithm);
        let artifacts = produce_with_options(algorithm.name(), Formats::JWK, &options)?;
        let saved = self.emit(artifacts.into_vec(), args.save.as_deref())?;
        info!("Generated a {} secret key ({} file(s) written)", algorithm, saved);
        Ok(())
    }

    fn handle_keypair(&self, args: KeypairArgs) -> Result<(), Error> {
        let algorithm = select_algorithm(args.algorithm.as_deref(), false)?;
        let curve = args.crv.as_deref().map(Curve::from_name).transpose()?;
        let options = ProduceOptions {
            generate: GenerateOptions {
                modulus_bits: args.modulus_length,
                curve,
            },
            with_key_id: args.kid,
        };
        let formats = Formats {
            jwk: args.jwk,
            pem: true,
        };
        debug!("Generating a key pair for {}", algorithm);
        let artifacts = produce_with_options(algorithm.name(), formats, &options)?;
        let saved = self.emit(artifacts.into_vec(), args.save.as_deref())?;
        info!("Generated a {} key pair ({} file(s) written)", algorithm, saved);
        Ok(())
    }

    /// Print every artifact, and save it when a file name was given. Returns the number of
    /// files written.
    fn emit(&self, artifacts: Vec<EncodedArtifact>, save: Option<&str>) -> Result<usize, Error> {
        let mut saved = 0;
        for artifact in &artifacts {
            let text = artifact.to_text()?;
            if artifact.is_jwk() && artifact.role() != KeyRole::Secret && save.is_none() {
                println!("JWK {} key:", artifact.role().name());
            }
            println!("{}", text.trim_end());
            if let Some(name) = save {
                let path = self.output_dir.join(file_name(artifact, name));
                write_key_file(&path, &text, artifact.role() != KeyRole::Public)?;
                println!("Exported to : {}\n", path.display());
                saved += 1;
            }
        }
        Ok(saved)
    }
}

/// Resolve the algorithm argument, which must belong to the requested family
fn select_algorithm(name: Option<&str>, symmetric: bool) -> Result<Algorithm, Error> {
    let family = if symmetric { "symmetric" } else { "asymmetric" };
    let choices = || {
        let names: Vec<_> = Algorithm::all()
            .filter(|alg| alg.is_symmetric() == symmetric)
            .map(|alg| alg.name())
            .collect();
        names.join(", ")
    };
    let name = match name {
        Some(name) => name,
        None => bail!(
            "missing {} algorithm. Valid choices: {}",
            family,
            choices()
        ),
    };
    match Algorithm::from_name(name) {
        Ok(algorithm) if algorithm.is_symmetric() == symmetric => Ok(algorithm),
        _ => Err(anyhow!(
            "[{}] is not a supported {} algorithm. Valid choices: {}",
            name,
            family,
            choices()
        )),
    }
}

fn file_name(artifact: &EncodedArtifact, name: &str) -> String {
    match (artifact, artifact.role()) {
        (EncodedArtifact::Jwk { .. }, KeyRole::Secret) => format!("{}.json", name),
        (EncodedArtifact::Jwk { .. }, KeyRole::Public) => format!("{}public.json", name),
        (EncodedArtifact::Jwk { .. }, KeyRole::Private) => format!("{}private.json", name),
        (EncodedArtifact::Pem { .. }, KeyRole::Public) => format!("Public{}.pem", name),
        (EncodedArtifact::Pem { .. }, _) => format!("Private{}.pem", name),
    }
}

/// Secret and private keys are only readable by their owner, from the moment the file exists
fn write_key_file(path: &Path, text: &str, private: bool) -> Result<(), Error> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if private { 0o600 } else { 0o644 });
    }
    let mut file = options
        .open(path)
        .map_err(|e| anyhow!("Unable to export key to {}: {}", path.display(), e))?;
    // `mode` only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
    }
    #[cfg(not(unix))]
    let _ = private;
    file.write_all(text.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| anyhow!("Unable to export key to {}: {}", path.display(), e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn algorithm_list() -> String {
    let mut out = String::from("Symmetric algorithms:\n");
    for algorithm in Algorithm::symmetric() {
        out.push_str(&format!("  {}\n", algorithm));
    }
    out.push_str("Asymmetric algorithms:\n");
    for algorithm in Algorithm::asymmetric() {
        out.push_str(&format!("  {}\n", algorithm));
    }
    out
}
