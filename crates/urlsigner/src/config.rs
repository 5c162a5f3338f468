//! Signer configuration.
//!
//! Provides [`SignerConfig`], the immutable set of options a
//! [`UrlSigner`](crate::UrlSigner) works with. Configuration is built with the
//! typed builder or loaded from environment variables.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::clock::{Clock, SystemClock};
use crate::encoding::SignatureEncoding;
use crate::error::ConfigError;
use crate::mac::HashAlgorithm;

/// Default query field carrying the signature.
pub const DEFAULT_SIGNATURE_FIELD: &str = "sig";

/// Default query field carrying the expiration timestamp.
pub const DEFAULT_EXPIRATION_FIELD: &str = "exp";

/// The HMAC secret. Its bytes never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// URL signer configuration.
///
/// Every option except the secret key has a default matching the wire format
/// described in the crate docs. The clock is not serialized and defaults to
/// the wall clock.
///
/// # Examples
///
/// ```
/// use urlsigner::{HashAlgorithm, SignatureEncoding, SignerConfig};
///
/// let config = SignerConfig::builder()
///     .secret_key("dev".into())
///     .encoding(SignatureEncoding::Hex)
///     .build();
/// assert_eq!(config.signature_field, "sig");
/// assert_eq!(config.expiration_field, "exp");
/// assert_eq!(config.algorithm, HashAlgorithm::Sha256);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SignerConfig {
    /// HMAC secret key.
    pub secret_key: SecretKey,

    /// Query field that carries the signature.
    #[builder(default = String::from(DEFAULT_SIGNATURE_FIELD))]
    #[serde(default = "default_signature_field")]
    pub signature_field: String,

    /// Query field that carries the expiration timestamp.
    #[builder(default = String::from(DEFAULT_EXPIRATION_FIELD))]
    #[serde(default = "default_expiration_field")]
    pub expiration_field: String,

    /// Encoding of the signature value.
    #[builder(default)]
    #[serde(default)]
    pub encoding: SignatureEncoding,

    /// Hash function underlying the HMAC.
    #[builder(default)]
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Source of the current time.
    #[builder(default = default_clock())]
    #[serde(skip, default = "default_clock")]
    pub clock: Arc<dyn Clock>,
}

impl SignerConfig {
    /// Create a configuration with default options for `secret_key`.
    pub fn new(secret_key: impl Into<SecretKey>) -> Self {
        Self::builder().secret_key(secret_key.into()).build()
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `URLSIGNER_SECRET_KEY` | *(required)* |
    /// | `URLSIGNER_SIGNATURE_FIELD` | `sig` |
    /// | `URLSIGNER_EXPIRATION_FIELD` | `exp` |
    /// | `URLSIGNER_ENCODING` | `base64` |
    /// | `URLSIGNER_ALGORITHM` | `sha256` |
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the secret is missing, a value cannot be
    /// parsed, or the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("URLSIGNER_SECRET_KEY").ok_or(ConfigError::MissingSecretKey)?;
        let mut config = Self::new(secret_key);

        if let Some(v) = lookup("URLSIGNER_SIGNATURE_FIELD") {
            config.signature_field = v;
        }
        if let Some(v) = lookup("URLSIGNER_EXPIRATION_FIELD") {
            config.expiration_field = v;
        }
        if let Some(v) = lookup("URLSIGNER_ENCODING") {
            config.encoding = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "URLSIGNER_ENCODING",
                value: v,
            })?;
        }
        if let Some(v) = lookup("URLSIGNER_ALGORITHM") {
            config.algorithm = v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "URLSIGNER_ALGORITHM",
                value: v,
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can sign and verify.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the secret is empty, a field name is
    /// empty, or both fields share a name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }
        if self.signature_field.is_empty() {
            return Err(ConfigError::EmptyFieldName("signature"));
        }
        if self.expiration_field.is_empty() {
            return Err(ConfigError::EmptyFieldName("expiration"));
        }
        if self.signature_field == self.expiration_field {
            return Err(ConfigError::DuplicateFieldName(
                self.signature_field.clone(),
            ));
        }
        Ok(())
    }
}

fn default_signature_field() -> String {
    DEFAULT_SIGNATURE_FIELD.to_owned()
}

fn default_expiration_field() -> String {
    DEFAULT_EXPIRATION_FIELD.to_owned()
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::FixedClock;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = SignerConfig::new("dev");
        assert_eq!(config.secret_key.as_bytes(), b"dev");
        assert_eq!(config.signature_field, "sig");
        assert_eq!(config.expiration_field, "exp");
        assert_eq!(config.encoding, SignatureEncoding::Base64Url);
        assert_eq!(config.algorithm, HashAlgorithm::Sha256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let at = Utc.with_ymd_and_hms(2019, 3, 27, 12, 0, 0).unwrap();
        let config = SignerConfig::builder()
            .secret_key("dev".into())
            .signature_field("signature".into())
            .expiration_field("expires".into())
            .encoding(SignatureEncoding::Hex)
            .algorithm(HashAlgorithm::Sha512)
            .clock(Arc::new(FixedClock::new(at)))
            .build();

        assert_eq!(config.signature_field, "signature");
        assert_eq!(config.expiration_field, "expires");
        assert_eq!(config.encoding, SignatureEncoding::Hex);
        assert_eq!(config.algorithm, HashAlgorithm::Sha512);
        assert_eq!(config.clock.now(), at);
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let config = SignerConfig::new("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("SecretKey(***)"));
    }

    #[test]
    fn test_should_load_from_lookup() {
        let config = SignerConfig::from_lookup(lookup_from(&[
            ("URLSIGNER_SECRET_KEY", "dev"),
            ("URLSIGNER_SIGNATURE_FIELD", "s"),
            ("URLSIGNER_EXPIRATION_FIELD", "e"),
            ("URLSIGNER_ENCODING", "hex"),
            ("URLSIGNER_ALGORITHM", "sha1"),
        ]))
        .unwrap();

        assert_eq!(config.signature_field, "s");
        assert_eq!(config.expiration_field, "e");
        assert_eq!(config.encoding, SignatureEncoding::Hex);
        assert_eq!(config.algorithm, HashAlgorithm::Sha1);
    }

    #[test]
    fn test_should_require_secret_key() {
        let result = SignerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingSecretKey);

        let result = SignerConfig::from_lookup(lookup_from(&[("URLSIGNER_SECRET_KEY", "")]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingSecretKey);
    }

    #[test]
    fn test_should_reject_unknown_encoding_and_algorithm() {
        let result = SignerConfig::from_lookup(lookup_from(&[
            ("URLSIGNER_SECRET_KEY", "dev"),
            ("URLSIGNER_ENCODING", "base32"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "URLSIGNER_ENCODING",
                ..
            })
        ));

        let result = SignerConfig::from_lookup(lookup_from(&[
            ("URLSIGNER_SECRET_KEY", "dev"),
            ("URLSIGNER_ALGORITHM", "crc32"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                name: "URLSIGNER_ALGORITHM",
                ..
            })
        ));
    }

    #[test]
    fn test_should_reject_conflicting_field_names() {
        let config = SignerConfig::builder()
            .secret_key("dev".into())
            .signature_field("x".into())
            .expiration_field("x".into())
            .build();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateFieldName("x".to_owned()))
        );

        let config = SignerConfig::builder()
            .secret_key("dev".into())
            .signature_field(String::new())
            .build();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyFieldName("signature"))
        );
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = SignerConfig::new("dev");
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("signatureField"));
        assert!(json.contains("expirationField"));
        assert!(json.contains("\"encoding\":\"base64\""));
        assert!(json.contains("\"algorithm\":\"sha256\""));
    }

    #[test]
    fn test_should_deserialize_with_defaults() {
        let config: SignerConfig =
            serde_json::from_str(r#"{"secretKey":"dev","encoding":"hex"}"#).unwrap();
        assert_eq!(config.secret_key.as_bytes(), b"dev");
        assert_eq!(config.signature_field, "sig");
        assert_eq!(config.encoding, SignatureEncoding::Hex);
        assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    }
}
