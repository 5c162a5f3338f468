//! HMAC-signed, optionally expiring URLs.
//!
//! This crate issues and verifies tamper-evident URLs. Signing appends an HMAC
//! of the URL (and optionally an expiration timestamp) to the query string;
//! verification recomputes the HMAC and rejects any URL whose content changed
//! or whose expiration has passed. No server-side state is involved.
//!
//! # Overview
//!
//! A signed URL looks like this (default field names and encoding):
//!
//! ```text
//! https://app.dev/report.pdf?exp=1553691600&sig=<base64url HMAC-SHA256>
//! ```
//!
//! The signature covers every component except the fragment and the signature
//! field itself, with query parameters in sorted key order. The expiration is
//! written before signing, so it cannot be altered or stripped.
//!
//! # Usage
//!
//! ```rust
//! use chrono::TimeDelta;
//! use urlsigner::{UrlSigner, UrlSignerError};
//!
//! let signer = UrlSigner::new("my-secret");
//!
//! let signed = signer
//!     .sign_url_with_ttl("https://app.dev/report.pdf?user=alice", TimeDelta::hours(1))
//!     .unwrap();
//! assert!(signer.verify_url(&signed).is_ok());
//!
//! let tampered = signed.replace("alice", "mallory");
//! assert_eq!(signer.verify_url(&tampered), Err(UrlSignerError::InvalidSignature));
//! ```
//!
//! # Modules
//!
//! - [`clock`] - Injected time source
//! - [`config`] - Signer configuration, builder and environment loading
//! - [`encoding`] - Hex and base64 signature encodings
//! - [`error`] - Error types
//! - [`mac`] - HMAC computation and constant-time comparison
//! - [`query`] - Canonical query string handling
//! - [`signer`] - URL signing and verification
//! - [`url`] - The URL value type

pub mod clock;
pub mod config;
pub mod encoding;
pub mod error;
pub mod mac;
pub mod query;
pub mod signer;
pub mod url;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{SecretKey, SignerConfig};
pub use encoding::SignatureEncoding;
pub use error::{ConfigError, DecodeError, UrlSignerError, UrlSignerResult};
pub use mac::HashAlgorithm;
pub use query::QueryParams;
pub use signer::UrlSigner;
pub use url::SignableUrl;
