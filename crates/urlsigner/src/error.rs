//! Error types for URL signing.
//!
//! Sign and verify failures are represented by [`UrlSignerError`]. The encoding
//! layer reports [`DecodeError`], and configuration loading reports
//! [`ConfigError`]; neither of those ever surfaces from a verification call.

/// Errors returned by the signing and verification entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlSignerError {
    /// The input string is not a valid URL.
    #[error("failed to parse URL: {0}")]
    ParseFailure(String),

    /// The signature is absent, malformed, or does not match the URL.
    #[error("invalid signature")]
    InvalidSignature,

    /// The expiration field is unparsable or lies in the past.
    #[error("url has expired")]
    Expired,
}

/// Errors produced when decoding an encoded signature back into raw bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The input is not valid lowercase or uppercase hexadecimal.
    #[error("invalid hex signature: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The input is not valid unpadded URL-safe base64.
    #[error("invalid base64 signature: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors produced while building or loading a [`SignerConfig`](crate::SignerConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No secret key was supplied.
    #[error("missing secret key")]
    MissingSecretKey,

    /// A query field name is empty.
    #[error("{0} field name must not be empty")]
    EmptyFieldName(&'static str),

    /// The signature and expiration fields share a name.
    #[error("signature and expiration fields must differ (both are {0:?})")]
    DuplicateFieldName(String),

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Convenience result type for sign and verify operations.
pub type UrlSignerResult<T> = Result<T, UrlSignerError>;
