use clap::Parser;
use pem_jwks::ConvertOptions;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pem-jwks",
    version,
    about = "Convert PEM encoded keys and certificates into a JWK Set",
    override_usage = "pem-jwks <file1> [file2] [file3] ..."
)]
pub struct Cli {
    /// PEM files with a public key, private key or certificate
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Add kid, alg, use, x5c, x5t and x5t#S256 to keys read from certificates
    #[arg(long)]
    pub x509: bool,

    /// Print the JWK Set on a single line
    #[arg(long)]
    pub compact: bool,
}

impl Cli {
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            x509_metadata: self.x509,
        }
    }
}
