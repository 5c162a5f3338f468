//! URL signing and verification.
//!
//! A signed URL carries its signature, and optionally an expiration timestamp,
//! in the query string:
//!
//! ```text
//! https://app.dev/report.pdf?exp=1553691600&sig=<encoded HMAC>&user=alice
//! ```
//!
//! The signed bytes are the URL serialized with its query keys sorted, the
//! expiration field already present, the signature field absent and the
//! fragment dropped. Signing and verification derive these bytes the same
//! way, so re-signing a signed URL replaces its signature. Fragments never
//! reach a server and are not part of what is signed.
//!
//! Verification:
//!
//! 1. Extracts the signature; absent or empty fails as invalid
//! 2. Checks the expiration field, if present; unparsable or past fails as expired
//! 3. Rebuilds the signed bytes by removing the signature and fragment
//! 4. Recomputes the signature and compares it in constant time

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::config::{SecretKey, SignerConfig};
use crate::error::{ConfigError, UrlSignerError, UrlSignerResult};
use crate::mac;
use crate::url::SignableUrl;

/// Signs and verifies URLs with one immutable configuration.
///
/// A signer holds no mutable state; share it across threads freely.
///
/// # Examples
///
/// ```
/// use urlsigner::UrlSigner;
///
/// let signer = UrlSigner::new("dev");
/// let signed = signer.sign_url("https://app.dev").unwrap();
/// assert_eq!(signed, "https://app.dev?sig=lOR7I0OgvXRneYlMx-3jzZe8YK09_MuZNXPuiK2knoM");
/// assert!(signer.verify_url(&signed).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct UrlSigner {
    config: SignerConfig,
}

impl UrlSigner {
    /// Create a signer with default options for `secret_key`.
    pub fn new(secret_key: impl Into<SecretKey>) -> Self {
        Self {
            config: SignerConfig::new(secret_key),
        }
    }

    /// Create a signer from a configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration fails
    /// [`SignerConfig::validate`].
    pub fn from_config(config: SignerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this signer uses.
    #[must_use]
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Sign `url`, setting the signature field.
    ///
    /// Any existing value under the signature field is replaced. Signing an
    /// unchanged URL with an unchanged configuration yields identical output.
    #[must_use]
    pub fn sign(&self, mut url: SignableUrl) -> SignableUrl {
        let signature = self.compute_signature(&url);
        url.query_mut()
            .set(self.config.signature_field.as_str(), signature);
        url
    }

    /// Sign `url` so that it expires at `expire_at`.
    ///
    /// The expiration is written as Unix seconds before signing, so the
    /// signature covers it.
    #[must_use]
    pub fn sign_with_expiry(&self, mut url: SignableUrl, expire_at: DateTime<Utc>) -> SignableUrl {
        url.query_mut().set(
            self.config.expiration_field.as_str(),
            expire_at.timestamp().to_string(),
        );
        self.sign(url)
    }

    /// Sign `url` so that it expires `ttl` after the clock's current time.
    #[must_use]
    pub fn sign_with_ttl(&self, url: SignableUrl, ttl: TimeDelta) -> SignableUrl {
        let expire_at = self
            .config
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.sign_with_expiry(url, expire_at)
    }

    /// Parse and sign a URL string.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if `raw_url` does not parse.
    pub fn sign_url(&self, raw_url: &str) -> UrlSignerResult<String> {
        let url = SignableUrl::parse(raw_url)?;
        Ok(self.sign(url).to_string())
    }

    /// Parse and sign a URL string that expires at `expire_at`.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if `raw_url` does not parse.
    pub fn sign_url_with_expiry(
        &self,
        raw_url: &str,
        expire_at: DateTime<Utc>,
    ) -> UrlSignerResult<String> {
        let url = SignableUrl::parse(raw_url)?;
        Ok(self.sign_with_expiry(url, expire_at).to_string())
    }

    /// Parse and sign a URL string that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if `raw_url` does not parse.
    pub fn sign_url_with_ttl(&self, raw_url: &str, ttl: TimeDelta) -> UrlSignerResult<String> {
        let url = SignableUrl::parse(raw_url)?;
        Ok(self.sign_with_ttl(url, ttl).to_string())
    }

    /// Verify a signed URL.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::InvalidSignature`] if the signature is absent,
    /// malformed or wrong, and [`UrlSignerError::Expired`] if the expiration
    /// field is unparsable or in the past.
    pub fn verify(&self, url: &SignableUrl) -> UrlSignerResult<()> {
        let sig_field = self.config.signature_field.as_str();
        let exp_field = self.config.expiration_field.as_str();

        let Some(provided) = url.query().get(sig_field).filter(|s| !s.is_empty()) else {
            debug!(field = sig_field, "Signed URL has no signature");
            return Err(UrlSignerError::InvalidSignature);
        };

        if let Some(expires) = url.query().get(exp_field) {
            self.check_expiration(expires)?;
        }

        let expected = self.compute_signature(url);

        if mac::verify(self.config.encoding, &expected, provided) {
            debug!("Signed URL verification succeeded");
            Ok(())
        } else {
            debug!(field = sig_field, "Signed URL signature mismatch");
            Err(UrlSignerError::InvalidSignature)
        }
    }

    /// Parse and verify a signed URL string.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if `raw_url` does not parse,
    /// otherwise the errors of [`verify`](Self::verify).
    pub fn verify_url(&self, raw_url: &str) -> UrlSignerResult<()> {
        let url = SignableUrl::parse(raw_url)?;
        self.verify(&url)
    }

    /// Compute the encoded signature over `url` without its signature field
    /// and fragment.
    fn compute_signature(&self, url: &SignableUrl) -> String {
        let mut unsigned = url.clone();
        unsigned.query_mut().remove(&self.config.signature_field);
        unsigned.clear_fragment();
        let canonical = unsigned.to_string();

        trace!(canonical, "Signing canonical URL");

        mac::sign(
            self.config.algorithm,
            self.config.secret_key.as_bytes(),
            &canonical,
            self.config.encoding,
        )
    }

    /// Fail unless `expires` is a Unix timestamp at or after the current time.
    fn check_expiration(&self, expires: &str) -> UrlSignerResult<()> {
        let Some(expire_at) = expires
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            debug!(expires, "Signed URL has an unparsable expiration");
            return Err(UrlSignerError::Expired);
        };

        let now = self.config.clock.now();
        if expire_at < now {
            debug!(%expire_at, %now, "Signed URL has expired");
            return Err(UrlSignerError::Expired);
        }

        Ok(())
    }
}
