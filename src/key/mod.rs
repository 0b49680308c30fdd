
use crate::error::{Error, Result};
use base64::prelude::*;
use ed25519_dalek::SigningKey;
use jsonwebtoken::jwk::{
    AlgorithmParameters, EllipticCurve, EllipticCurveKeyParameters, EllipticCurveKeyType,
    OctetKeyPairParameters, OctetKeyPairType, RSAKeyParameters,
};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::DecodeRsaPrivateKey,
    pkcs8::{DecodePrivateKey, PrivateKeyInfo},
    traits::PublicKeyParts,
};
use rustls_pki_types::PrivateKeyDer;
use x509_parser::{prelude::FromDer, public_key::PublicKey, x509::SubjectPublicKeyInfo};

const RSA_OID: &str = "1.2.840.113549.1.1.1";
const EC_OID: &str = "1.2.840.10045.2.1";
const ED25519_OID: &str = "1.3.101.112";

const P256_OID: &str = "1.2.840.10045.3.1.7";
const P384_OID: &str = "1.3.132.0.34";
const P521_OID: &str = "1.3.132.0.35";

/// NIST curves accepted for `EC` keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
    P521,
}

impl Curve {
    fn from_oid(oid: &str) -> Result<Self> {
        match oid {
            P256_OID => Ok(Self::P256),
            P384_OID => Ok(Self::P384),
            P521_OID => Ok(Self::P521),
            _ => Err(Error::UnsupportedCurve(oid.to_owned())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Length in bytes of a single affine coordinate
    fn field_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl From<Curve> for EllipticCurve {
    fn from(value: Curve) -> Self {
        match value {
            Curve::P256 => EllipticCurve::P256,
            Curve::P384 => EllipticCurve::P384,
            Curve::P521 => EllipticCurve::P521,
        }
    }
}

/// Public half of a key, reduced to the raw numbers a JWK carries.
///
/// Integers are big-endian without leading zero octets, EC coordinates are
/// padded to the curve's field size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyParams {
    Rsa {
        modulus: Vec<u8>,
        exponent: Vec<u8>,
    },
    Ec {
        curve: Curve,
        x: Vec<u8>,
        y: Vec<u8>,
    },
    /// Ed25519 only
    Okp { x: Vec<u8> },
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn malformed_private_key(err: impl std::fmt::Display) -> Error {
    Error::PrivateKey(err.to_string())
}

impl PublicKeyParams {
    /// JWK `kty` value
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::Ec { .. } => "EC",
            Self::Okp { .. } => "OKP",
        }
    }

    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let (_, spki) =
            SubjectPublicKeyInfo::from_der(der).map_err(|err| Error::PublicKey(err.to_string()))?;

        Self::from_spki(&spki)
    }

    /// Dispatch on the algorithm identifier of a SubjectPublicKeyInfo
    pub fn from_spki(spki: &SubjectPublicKeyInfo<'_>) -> Result<Self> {
        let algorithm = spki.algorithm.oid().to_id_string();

        match (algorithm.as_str(), spki.parsed()?) {
            (RSA_OID, PublicKey::RSA(rsa_key)) => Self::rsa(rsa_key.modulus, rsa_key.exponent),
            (EC_OID, PublicKey::EC(point)) => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .and_then(|params| params.as_oid().ok())
                    .ok_or_else(|| Error::PublicKey("EC key without a named curve".into()))?;

                Self::ec_point(Curve::from_oid(&curve.to_id_string())?, point.data())
            }
            (ED25519_OID, PublicKey::Unknown(key)) => Self::ed25519(key),
            (RSA_OID | EC_OID | ED25519_OID, _) => Err(Error::PublicKey(format!(
                "key data does not match algorithm {algorithm}"
            ))),
            _ => Err(Error::UnsupportedAlgorithm(algorithm)),
        }
    }

    /// Derive the public parameters from a private key
    pub fn from_private_key(key: &PrivateKeyDer<'_>) -> Result<Self> {
        match key {
            PrivateKeyDer::Pkcs1(der) => {
                let rsa_key = RsaPrivateKey::from_pkcs1_der(der.secret_pkcs1_der())
                    .map_err(malformed_private_key)?;

                Self::from_rsa_key(&rsa_key)
            }
            PrivateKeyDer::Pkcs8(der) => Self::from_pkcs8(der.secret_pkcs8_der()),
            PrivateKeyDer::Sec1(der) => Self::from_sec1(der.secret_sec1_der()),
            _ => Err(Error::PrivateKey("unsupported private key encoding".into())),
        }
    }

    fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der).map_err(malformed_private_key)?;
        let algorithm = info.algorithm.oid.to_string();

        match algorithm.as_str() {
            RSA_OID => {
                let rsa_key = RsaPrivateKey::from_pkcs8_der(der).map_err(malformed_private_key)?;

                Self::from_rsa_key(&rsa_key)
            }
            EC_OID => {
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .map_err(malformed_private_key)?
                    .to_string();

                match Curve::from_oid(&curve)? {
                    Curve::P256 => {
                        let secret = p256::SecretKey::from_pkcs8_der(der)
                            .map_err(malformed_private_key)?;
                        Self::ec_uncompressed(
                            Curve::P256,
                            secret.public_key().to_encoded_point(false).as_bytes(),
                        )
                    }
                    Curve::P384 => {
                        let secret = p384::SecretKey::from_pkcs8_der(der)
                            .map_err(malformed_private_key)?;
                        Self::ec_uncompressed(
                            Curve::P384,
                            secret.public_key().to_encoded_point(false).as_bytes(),
                        )
                    }
                    Curve::P521 => {
                        let secret = p521::SecretKey::from_pkcs8_der(der)
                            .map_err(malformed_private_key)?;
                        Self::ec_uncompressed(
                            Curve::P521,
                            secret.public_key().to_encoded_point(false).as_bytes(),
                        )
                    }
                }
            }
            ED25519_OID => {
                let signing_key = SigningKey::from_pkcs8_der(der).map_err(malformed_private_key)?;

                Self::ed25519(signing_key.verifying_key().as_bytes())
            }
            _ => Err(Error::UnsupportedAlgorithm(algorithm)),
        }
    }

    /// SEC1 keys name their curve inside the structure, each curve rejects foreign ones
    fn from_sec1(der: &[u8]) -> Result<Self> {
        if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
            return Self::ec_uncompressed(
                Curve::P256,
                secret.public_key().to_encoded_point(false).as_bytes(),
            );
        }

        if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
            return Self::ec_uncompressed(
                Curve::P384,
                secret.public_key().to_encoded_point(false).as_bytes(),
            );
        }

        if let Ok(secret) = p521::SecretKey::from_sec1_der(der) {
            return Self::ec_uncompressed(
                Curve::P521,
                secret.public_key().to_encoded_point(false).as_bytes(),
            );
        }

        Err(Error::PrivateKey(
            "EC private key is malformed or not on P-256, P-384 or P-521".into(),
        ))
    }

    pub fn from_rsa_public_key(rsa_key: &RsaPublicKey) -> Result<Self> {
        Self::from_rsa_key(rsa_key)
    }

    fn from_rsa_key(rsa_key: &impl PublicKeyParts) -> Result<Self> {
        Self::rsa(&rsa_key.n().to_bytes_be(), &rsa_key.e().to_bytes_be())
    }

    fn rsa(modulus: &[u8], exponent: &[u8]) -> Result<Self> {
        let modulus = strip_leading_zeros(modulus);
        let exponent = strip_leading_zeros(exponent);

        if modulus.is_empty() || exponent.is_empty() {
            return Err(Error::PublicKey("RSA modulus or exponent is zero".into()));
        }

        Ok(Self::Rsa {
            modulus: modulus.to_vec(),
            exponent: exponent.to_vec(),
        })
    }

    fn ed25519(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::PublicKey(format!(
                "Ed25519 key must be 32 bytes, got {}",
                key.len()
            )));
        }

        Ok(Self::Okp { x: key.to_vec() })
    }

    /// Accepts SEC1 encoded points, compressed ones are expanded
    fn ec_point(curve: Curve, point: &[u8]) -> Result<Self> {
        let invalid = |err: p256::elliptic_curve::Error| {
            Error::PublicKey(format!("invalid {} point: {err}", curve.name()))
        };

        match curve {
            Curve::P256 => {
                let key = p256::PublicKey::from_sec1_bytes(point).map_err(invalid)?;
                Self::ec_uncompressed(curve, key.to_encoded_point(false).as_bytes())
            }
            Curve::P384 => {
                let key = p384::PublicKey::from_sec1_bytes(point).map_err(invalid)?;
                Self::ec_uncompressed(curve, key.to_encoded_point(false).as_bytes())
            }
            Curve::P521 => {
                let key = p521::PublicKey::from_sec1_bytes(point).map_err(invalid)?;
                Self::ec_uncompressed(curve, key.to_encoded_point(false).as_bytes())
            }
        }
    }

    fn ec_uncompressed(curve: Curve, point: &[u8]) -> Result<Self> {
        let size = curve.field_size();

        match point.split_first() {
            Some((0x04, coordinates)) if coordinates.len() == 2 * size => {
                let (x, y) = coordinates.split_at(size);

                Ok(Self::Ec {
                    curve,
                    x: x.to_vec(),
                    y: y.to_vec(),
                })
            }
            _ => Err(Error::PublicKey(format!(
                "expected an uncompressed {} point",
                curve.name()
            ))),
        }
    }

    pub fn into_algorithm_parameters(self) -> AlgorithmParameters {
        match self {
            Self::Rsa { modulus, exponent } => AlgorithmParameters::RSA(RSAKeyParameters {
                n: BASE64_URL_SAFE_NO_PAD.encode(modulus),
                e: BASE64_URL_SAFE_NO_PAD.encode(exponent),
                ..Default::default()
            }),
            Self::Ec { curve, x, y } => {
                AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
                    key_type: EllipticCurveKeyType::EC,
                    curve: curve.into(),
                    x: BASE64_URL_SAFE_NO_PAD.encode(x),
                    y: BASE64_URL_SAFE_NO_PAD.encode(y),
                })
            }
            Self::Okp { x } => AlgorithmParameters::OctetKeyPair(OctetKeyPairParameters {
                key_type: OctetKeyPairType::OctetKeyPair,
                curve: EllipticCurve::Ed25519,
                x: BASE64_URL_SAFE_NO_PAD.encode(x),
            }),
        }
    }
}
