mod convert;
mod error;
mod key;
mod pem_set;

pub use convert::{ConvertOptions, Converter, FileSystem, KeySource, pem_to_jwk};
pub use error::{Error, Result};
pub use key::{Curve, PublicKeyParams};
pub use jsonwebtoken;
