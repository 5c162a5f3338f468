//! HMAC signature computation and comparison.
//!
//! [`sign`] computes `Encode(HMAC(algorithm, key, payload))`. [`verify`]
//! decodes two encoded signatures and compares the raw bytes in constant time.
//! A signature that fails to decode never matches.

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::encoding::SignatureEncoding;

/// The hash function underlying the HMAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// HMAC-SHA1 (20-byte digest).
    Sha1,
    /// HMAC-SHA256 (32-byte digest).
    #[default]
    Sha256,
    /// HMAC-SHA384 (48-byte digest).
    Sha384,
    /// HMAC-SHA512 (64-byte digest).
    Sha512,
    /// HMAC-MD5 (16-byte digest).
    Md5,
}

impl HashAlgorithm {
    /// The digest size in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
            Self::Md5 => 16,
        }
    }

    /// The configuration name of this algorithm.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Md5 => "md5",
        }
    }

    /// Compute the raw MAC of `payload` under `key`.
    #[must_use]
    pub fn mac(self, key: &[u8], payload: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => compute::<Hmac<Sha1>>(key, payload),
            Self::Sha256 => compute::<Hmac<Sha256>>(key, payload),
            Self::Sha384 => compute::<Hmac<Sha384>>(key, payload),
            Self::Sha512 => compute::<Hmac<Sha512>>(key, payload),
            Self::Md5 => compute::<Hmac<Md5>>(key, payload),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "md5" => Ok(Self::Md5),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

fn compute<M: Mac + KeyInit>(key: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC can accept any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Sign `payload` with `key` and encode the MAC.
///
/// # Examples
///
/// ```
/// use urlsigner::{HashAlgorithm, SignatureEncoding, mac};
///
/// let sig = mac::sign(HashAlgorithm::Sha256, b"dev", "payload", SignatureEncoding::Hex);
/// assert_eq!(sig, "ac90e58e6d3d1b15b6ed55b73d81eacda74b4f563a3cd1278f0033515e406b29");
/// ```
#[must_use]
pub fn sign(
    algorithm: HashAlgorithm,
    key: &[u8],
    payload: &str,
    encoding: SignatureEncoding,
) -> String {
    encoding.encode(&algorithm.mac(key, payload.as_bytes()))
}

/// Compare two encoded signatures in constant time.
///
/// Returns `false` if either signature fails to decode.
#[must_use]
pub fn verify(encoding: SignatureEncoding, a: &str, b: &str) -> bool {
    let (Ok(a), Ok(b)) = (encoding.decode(a), encoding.decode(b)) else {
        return false;
    };
    a.as_slice().ct_eq(b.as_slice()).into()
}
