use super::{ConvertOptions, Converter, KeySource, pem_to_jwk};
use crate::error::Error;
use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

const RSA_CERT: &[u8] = include_bytes!("../../testdata/rsa-cert.pem");
const RSA_PUBLIC: &[u8] = include_bytes!("../../testdata/rsa-public.pem");
const P256_PUBLIC: &[u8] = include_bytes!("../../testdata/ec-p256-public.pem");
const ED25519_PUBLIC: &[u8] = include_bytes!("../../testdata/ed25519-public.pem");
const NOT_A_KEY: &[u8] = include_bytes!("../../testdata/not-a-key.pem");
const DSA_PUBLIC: &[u8] = include_bytes!("../../testdata/dsa-public.pem");

/// Files held in memory, `None` content stands for a file that exists but cannot be read
#[derive(Default)]
struct MemorySource {
    files: HashMap<PathBuf, Option<Vec<u8>>>,
}

impl MemorySource {
    fn with(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(path.into(), Some(content.to_vec()));
        self
    }

    fn unreadable(mut self, path: &str) -> Self {
        self.files.insert(path.into(), None);
        self
    }
}

impl KeySource for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.files.get(path) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            )),
            None => Err(io::ErrorKind::NotFound.into()),
        }
    }
}

fn key_types(jwks: &JwkSet) -> Vec<String> {
    jwks.keys
        .iter()
        .map(|jwk| serde_json::to_value(jwk).unwrap()["kty"].as_str().unwrap().to_owned())
        .collect()
}

#[test]
fn test_certificate_produces_plain_rsa_jwk() {
    let jwk = pem_to_jwk(RSA_CERT, ConvertOptions::default()).unwrap();
    let value = serde_json::to_value(&jwk).unwrap();

    let object = value.as_object().unwrap();
    let mut fields: Vec<&str> = object.keys().map(String::as_str).collect();
    fields.sort_unstable();

    assert_eq!(fields, ["e", "kty", "n"]);
    assert_eq!(object["kty"], "RSA");
    assert_eq!(object["e"], "AQAB");

    let public = pem_to_jwk(RSA_PUBLIC, ConvertOptions::default()).unwrap();
    let public = serde_json::to_value(&public).unwrap();
    assert_eq!(object["n"], public["n"]);
}

#[test]
fn test_keeps_argument_order_and_skips_failures() {
    let source = MemorySource::default()
        .with("ec.pem", P256_PUBLIC)
        .with("junk.pem", NOT_A_KEY)
        .with("rsa.pem", RSA_PUBLIC)
        .with("dsa.pem", DSA_PUBLIC)
        .with("ed.pem", ED25519_PUBLIC);
    let converter = Converter::from_source(source, ConvertOptions::default());

    let jwks =
        converter.convert_all(&["ec.pem", "junk.pem", "rsa.pem", "dsa.pem", "ed.pem"]);

    assert_eq!(key_types(&jwks), ["EC", "RSA", "OKP"]);
}

#[test]
fn test_all_failures_give_empty_set() {
    let source = MemorySource::default()
        .with("junk.pem", NOT_A_KEY)
        .with("dsa.pem", DSA_PUBLIC);
    let converter = Converter::from_source(source, ConvertOptions::default());

    let jwks = converter.convert_all(&["junk.pem", "dsa.pem"]);

    assert!(jwks.keys.is_empty());
    assert_eq!(serde_json::to_string(&jwks).unwrap(), r#"{"keys":[]}"#);
}

#[test]
fn test_unreadable_file_is_skipped() {
    let source = MemorySource::default()
        .unreadable("locked.pem")
        .with("rsa.pem", RSA_PUBLIC);
    let converter = Converter::from_source(source, ConvertOptions::default());

    assert!(matches!(
        converter.convert_file(Path::new("locked.pem")),
        Err(Error::Io(_))
    ));
    assert_eq!(
        key_types(&converter.convert_all(&["locked.pem", "rsa.pem"])),
        ["RSA"]
    );
}

#[test]
fn test_ensure_exist_names_missing_path() {
    let source = MemorySource::default().with("rsa.pem", RSA_PUBLIC);
    let converter = Converter::from_source(source, ConvertOptions::default());

    assert!(converter.ensure_exist(&["rsa.pem"]).is_ok());

    let err = converter
        .ensure_exist(&["rsa.pem", "missing.pem", "other.pem"])
        .unwrap_err();
    assert!(matches!(
        &err,
        Error::FileNotFound(path) if path == Path::new("missing.pem")
    ));
    assert_eq!(err.to_string(), "File 'missing.pem' does not exist");
}

#[test]
fn test_output_is_deterministic() {
    let source = MemorySource::default()
        .with("cert.pem", RSA_CERT)
        .with("ec.pem", P256_PUBLIC);
    let converter = Converter::from_source(source, ConvertOptions { x509_metadata: true });
    let paths = ["cert.pem", "ec.pem"];

    let first = serde_json::to_string_pretty(&converter.convert_all(&paths)).unwrap();
    let second = serde_json::to_string_pretty(&converter.convert_all(&paths)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_x509_option_reaches_certificates() {
    let source = MemorySource::default().with("cert.pem", RSA_CERT);
    let converter = Converter::from_source(source, ConvertOptions { x509_metadata: true });

    let jwk = converter.convert_file(Path::new("cert.pem")).unwrap();

    assert_eq!(jwk.common.key_id.as_deref(), Some("4096"));
}
