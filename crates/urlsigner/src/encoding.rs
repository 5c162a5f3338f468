//! Text encodings for raw signature bytes.
//!
//! A signature travels as a query value, so the raw MAC bytes are encoded with
//! an alphabet that survives a URL unescaped. Two encodings are available:
//!
//! - [`SignatureEncoding::Hex`] - lowercase hexadecimal, two characters per byte
//! - [`SignatureEncoding::Base64Url`] - RFC 4648 URL-safe base64 without `=` padding

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// The encoding applied to raw signature bytes.
///
/// # Examples
///
/// ```
/// use urlsigner::SignatureEncoding;
///
/// let encoded = SignatureEncoding::Hex.encode(&[0xde, 0xad]);
/// assert_eq!(encoded, "dead");
/// assert_eq!(SignatureEncoding::Hex.decode(&encoded).unwrap(), vec![0xde, 0xad]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    /// Lowercase hexadecimal without separators.
    Hex,
    /// Unpadded base64 with the URL-safe alphabet.
    #[default]
    #[serde(rename = "base64")]
    Base64Url,
}

impl SignatureEncoding {
    /// Encode raw bytes into a URL-safe string.
    #[must_use]
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    /// Decode a string produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the input contains characters outside the
    /// alphabet or has an invalid length or padding.
    pub fn decode(self, encoded: &str) -> Result<Vec<u8>, DecodeError> {
        match self {
            Self::Hex => Ok(hex::decode(encoded)?),
            Self::Base64Url => Ok(URL_SAFE_NO_PAD.decode(encoded)?),
        }
    }

    /// The configuration name of this encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64Url => "base64",
        }
    }
}

impl fmt::Display for SignatureEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" | "base64url" => Ok(Self::Base64Url),
            other => Err(format!("unknown signature encoding: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 4] = [0x00, 0xfb, 0xff, 0x7f];

    #[test]
    fn test_should_encode_hex_lowercase() {
        assert_eq!(SignatureEncoding::Hex.encode(&MAC), "00fbff7f");
    }

    #[test]
    fn test_should_encode_base64_with_url_alphabet_and_no_padding() {
        let encoded = SignatureEncoding::Base64Url.encode(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_should_roundtrip_both_encodings() {
        for encoding in [SignatureEncoding::Hex, SignatureEncoding::Base64Url] {
            let encoded = encoding.encode(&MAC);
            assert_eq!(encoding.decode(&encoded).unwrap(), MAC);
        }
    }

    #[test]
    fn test_should_roundtrip_empty_input() {
        for encoding in [SignatureEncoding::Hex, SignatureEncoding::Base64Url] {
            assert_eq!(encoding.encode(&[]), "");
            assert!(encoding.decode("").unwrap().is_empty());
        }
    }

    #[test]
    fn test_should_reject_characters_outside_alphabet() {
        assert!(matches!(
            SignatureEncoding::Hex.decode("zz"),
            Err(DecodeError::Hex(_))
        ));
        assert!(matches!(
            SignatureEncoding::Base64Url.decode("ab+/"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn test_should_reject_invalid_length() {
        assert!(SignatureEncoding::Hex.decode("abc").is_err());
        assert!(SignatureEncoding::Base64Url.decode("a").is_err());
        assert!(SignatureEncoding::Base64Url.decode("-_8=").is_err());
    }

    #[test]
    fn test_should_accept_uppercase_hex_on_decode() {
        assert_eq!(
            SignatureEncoding::Hex.decode("00FBFF7F").unwrap(),
            MAC.to_vec()
        );
    }

    #[test]
    fn test_should_parse_encoding_names() {
        assert_eq!("hex".parse(), Ok(SignatureEncoding::Hex));
        assert_eq!("BASE64".parse(), Ok(SignatureEncoding::Base64Url));
        assert!("base32".parse::<SignatureEncoding>().is_err());
        assert_eq!(SignatureEncoding::Base64Url.to_string(), "base64");
    }

    #[test]
    fn test_should_serialize_lowercase_names() {
        let json = serde_json::to_string(&SignatureEncoding::Base64Url).unwrap();
        assert_eq!(json, "\"base64\"");
        let parsed: SignatureEncoding = serde_json::from_str("\"hex\"").unwrap();
        assert_eq!(parsed, SignatureEncoding::Hex);
    }
}
