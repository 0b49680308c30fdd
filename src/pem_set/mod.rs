
use crate::error::{Error, Result};
use crate::key::{Curve, PublicKeyParams};
use base64::prelude::*;
use jsonwebtoken::jwk::{CommonParameters, Jwk, KeyAlgorithm, PublicKeyUse};
use rsa::{RsaPublicKey, pkcs1::DecodeRsaPublicKey};
use rustls_pki_types::{
    CertificateDer, PrivateKeyDer, SubjectPublicKeyInfoDer,
    pem::{PemObject, SectionKind},
};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_parser::{
    certificate::{X509Certificate, X509CertificateParser},
    nom::Parser,
};

const RS256_OID: &str = "1.2.840.113549.1.1.11";
const RS384_OID: &str = "1.2.840.113549.1.1.12";
const RS512_OID: &str = "1.2.840.113549.1.1.13";
const ES256_OID: &str = "1.2.840.10045.4.3.2";
const ES384_OID: &str = "1.2.840.10045.4.3.3";
const ED25519_OID: &str = "1.3.101.112";

const BEGIN: &[u8] = b"-----BEGIN ";
const RSA_PUBLIC_KEY_BEGIN: &[u8] = b"-----BEGIN RSA PUBLIC KEY-----";
const RSA_PUBLIC_KEY_END: &[u8] = b"-----END RSA PUBLIC KEY-----";

/// A decoded PEM section that can carry a key
pub enum PemSection {
    Certificate(CertificateDer<'static>),
    PublicKey(SubjectPublicKeyInfoDer<'static>),
    /// PKCS#1 `RSAPublicKey`
    RsaPublicKey(RsaPublicKey),
    PrivateKey(PrivateKeyDer<'static>),
}

impl PemSection {
    fn label(&self) -> &'static str {
        match self {
            Self::Certificate(_) => "CERTIFICATE",
            Self::PublicKey(_) => "PUBLIC KEY",
            Self::RsaPublicKey(_) => "RSA PUBLIC KEY",
            Self::PrivateKey(PrivateKeyDer::Pkcs1(_)) => "RSA PRIVATE KEY",
            Self::PrivateKey(PrivateKeyDer::Sec1(_)) => "EC PRIVATE KEY",
            Self::PrivateKey(_) => "PRIVATE KEY",
        }
    }
}

impl PemObject for PemSection {
    fn from_pem(kind: SectionKind, der: Vec<u8>) -> Option<Self> {
        match kind {
            SectionKind::Certificate => Some(Self::Certificate(der.into())),
            SectionKind::PublicKey => Some(Self::PublicKey(der.into())),
            SectionKind::RsaPrivateKey => Some(Self::PrivateKey(PrivateKeyDer::Pkcs1(der.into()))),
            SectionKind::PrivateKey => Some(Self::PrivateKey(PrivateKeyDer::Pkcs8(der.into()))),
            SectionKind::EcPrivateKey => Some(Self::PrivateKey(PrivateKeyDer::Sec1(der.into()))),
            _ => None,
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Cut PEM text into chunks that each start at a `-----BEGIN ` line
fn split_sections(mut pem: &[u8]) -> Vec<&[u8]> {
    let mut chunks = Vec::new();

    while let Some(start) = find(pem, BEGIN) {
        let rest = &pem[start..];
        let end = find(&rest[BEGIN.len()..], BEGIN).map_or(rest.len(), |next| next + BEGIN.len());

        chunks.push(&rest[..end]);
        pem = &rest[end..];
    }

    chunks
}

/// `RSA PUBLIC KEY` has no `SectionKind`, so it is decoded here
fn rsa_public_key_section(chunk: &[u8]) -> Result<PemSection> {
    let end = find(chunk, RSA_PUBLIC_KEY_END)
        .ok_or_else(|| Error::PublicKey("unterminated RSA PUBLIC KEY section".into()))?;
    let text = std::str::from_utf8(&chunk[..end + RSA_PUBLIC_KEY_END.len()])
        .map_err(|err| Error::PublicKey(err.to_string()))?;

    let key = RsaPublicKey::from_pkcs1_pem(text)
        .map_err(|err| Error::PublicKey(format!("malformed RSA PUBLIC KEY section: {err}")))?;

    Ok(PemSection::RsaPublicKey(key))
}

/// Every supported section of the text, in file order
fn decode_sections(pem: &[u8]) -> Result<Vec<PemSection>> {
    let mut sections = Vec::new();

    for chunk in split_sections(pem) {
        if chunk.starts_with(RSA_PUBLIC_KEY_BEGIN) {
            sections.push(rsa_public_key_section(chunk)?);
            continue;
        }

        for section in PemSection::pem_slice_iter(chunk) {
            sections.push(section?);
        }
    }

    Ok(sections)
}

/// Key-bearing content of a single PEM file.
///
/// The first supported section decides the key, every `CERTIFICATE` section
/// in file order makes up the chain.
pub struct PemBundle {
    key: PemSection,
    chain: Vec<CertificateDer<'static>>,
}

impl PemBundle {
    pub fn from_pem_slice(pem: &[u8]) -> Result<Self> {
        let mut key = None;
        let mut chain = Vec::new();

        for section in decode_sections(pem)? {
            if let PemSection::Certificate(cert) = &section {
                chain.push(cert.clone());
            }

            if key.is_none() {
                key = Some(section);
            }
        }

        let key = key.ok_or(Error::NoKeyMaterial)?;
        log::debug!(
            "using {} section, {} certificate(s) in chain",
            key.label(),
            chain.len()
        );

        Ok(Self { key, chain })
    }

    /// Build the public JWK, optionally carrying the certificate metadata of the key
    pub fn into_jwk(self, x509_metadata: bool) -> Result<Jwk> {
        let (params, common) = match &self.key {
            PemSection::Certificate(der) => {
                let der: &[u8] = der;
                let mut parser = X509CertificateParser::new().with_deep_parse_extensions(false);
                let (_, cert) = parser
                    .parse(der)
                    .map_err(|err| Error::Certificate(err.to_string()))?;

                let params = PublicKeyParams::from_spki(cert.public_key())?;
                let common = if x509_metadata {
                    self.certificate_parameters(&cert, der, &params)
                } else {
                    CommonParameters::default()
                };

                (params, common)
            }
            PemSection::PublicKey(der) => (
                PublicKeyParams::from_spki_der(der.as_ref())?,
                CommonParameters::default(),
            ),
            PemSection::RsaPublicKey(key) => (
                PublicKeyParams::from_rsa_public_key(key)?,
                CommonParameters::default(),
            ),
            PemSection::PrivateKey(der) => (
                PublicKeyParams::from_private_key(der)?,
                CommonParameters::default(),
            ),
        };

        log::debug!("extracted {} public key", params.key_type());

        Ok(Jwk {
            common,
            algorithm: params.into_algorithm_parameters(),
        })
    }

    fn certificate_parameters(
        &self,
        leaf: &X509Certificate<'_>,
        leaf_der: &[u8],
        params: &PublicKeyParams,
    ) -> CommonParameters {
        CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_algorithm: key_algorithm(leaf, params),
            key_id: Some(leaf.tbs_certificate.serial.to_string()),
            x509_chain: Some(
                self.chain
                    .iter()
                    .map(|cert| BASE64_STANDARD.encode(cert))
                    .collect(),
            ),
            x509_sha1_fingerprint: Some(BASE64_URL_SAFE_NO_PAD.encode(Sha1::digest(leaf_der))),
            x509_sha256_fingerprint: Some(BASE64_URL_SAFE_NO_PAD.encode(Sha256::digest(leaf_der))),
            ..Default::default()
        }
    }
}

/// `alg` taken from the certificate's signature algorithm.
///
/// The signature belongs to the issuer, so it is only used when it can be
/// produced with the leaf key: same key family and, for EC, the curve that
/// goes with the hash.
fn key_algorithm(cert: &X509Certificate<'_>, params: &PublicKeyParams) -> Option<KeyAlgorithm> {
    let oid = cert.signature_algorithm.oid().to_id_string();

    let algo = match (oid.as_str(), params) {
        (RS256_OID, PublicKeyParams::Rsa { .. }) => KeyAlgorithm::RS256,
        (RS384_OID, PublicKeyParams::Rsa { .. }) => KeyAlgorithm::RS384,
        (RS512_OID, PublicKeyParams::Rsa { .. }) => KeyAlgorithm::RS512,
        (ES256_OID, PublicKeyParams::Ec { curve: Curve::P256, .. }) => KeyAlgorithm::ES256,
        (ES384_OID, PublicKeyParams::Ec { curve: Curve::P384, .. }) => KeyAlgorithm::ES384,
        (ED25519_OID, PublicKeyParams::Okp { .. }) => KeyAlgorithm::EdDSA,
        _ => {
            log::debug!(
                "no JWK alg for signature algorithm {oid} with a {} key",
                params.key_type()
            );
            return None;
        }
    };

    Some(algo)
}
