#[cfg(test)]
mod test;

use crate::error::{Error, Result};
use crate::pem_set::PemBundle;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use std::path::Path;

/// Where PEM input is read from
pub trait KeySource {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystem;

impl KeySource for FileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Attach `kid`, `alg`, `use`, `x5c`, `x5t` and `x5t#S256` to keys taken from certificates
    pub x509_metadata: bool,
}

/// Convert the first key found in PEM text into its public JWK
pub fn pem_to_jwk(pem: &[u8], options: ConvertOptions) -> Result<Jwk> {
    PemBundle::from_pem_slice(pem)?.into_jwk(options.x509_metadata)
}

pub struct Converter<S> {
    source: S,
    options: ConvertOptions,
}

impl Converter<FileSystem> {
    pub fn new(options: ConvertOptions) -> Self {
        Self::from_source(FileSystem, options)
    }
}

impl<S: KeySource> Converter<S> {
    pub fn from_source(source: S, options: ConvertOptions) -> Self {
        Self { source, options }
    }

    /// Fails on the first path that does not exist, nothing is read
    pub fn ensure_exist<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        match paths
            .iter()
            .map(AsRef::as_ref)
            .find(|path| !self.source.exists(path))
        {
            Some(missing) => Err(Error::FileNotFound(missing.to_path_buf())),
            None => Ok(()),
        }
    }

    pub fn convert_file(&self, path: &Path) -> Result<Jwk> {
        let pem = self.source.read(path)?;

        pem_to_jwk(&pem, self.options)
    }

    /// Converts every path in order, files that fail are logged and left out of the set
    pub fn convert_all<P: AsRef<Path>>(&self, paths: &[P]) -> JwkSet {
        let keys = paths
            .iter()
            .map(AsRef::as_ref)
            .filter_map(|path| {
                log::info!("Processing: {}", path.display());

                match self.convert_file(path) {
                    Ok(jwk) => Some(jwk),
                    Err(err) => {
                        log::error!("Error processing {}: {err}", path.display());
                        None
                    }
                }
            })
            .collect();

        JwkSet { keys }
    }
}
