use std::path::PathBuf;
use x509_parser::error::X509Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("File '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("unable to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed PEM: {0}")]
    Pem(#[from] rustls_pki_types::pem::Error),
    #[error("no key or certificate found in PEM input")]
    NoKeyMaterial,
    #[error("malformed certificate: {0}")]
    Certificate(String),
    #[error("malformed public key: {0}")]
    PublicKey(String),
    #[error("malformed private key: {0}")]
    PrivateKey(String),
    #[error("unsupported key algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported elliptic curve {0}")]
    UnsupportedCurve(String),
}

impl From<X509Error> for Error {
    fn from(value: X509Error) -> Self {
        Self::PublicKey(value.to_string())
    }
}
