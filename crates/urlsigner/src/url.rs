//! The URL value type that signing operates on.
//!
//! [`SignableUrl`] keeps the pieces of a URL separately so the query can be
//! edited and re-serialized canonically. Serialization writes exactly what is
//! stored: a URL without a path stays without one (`https://app.dev`), because
//! the signed bytes depend on it.
//!
//! Parsing accepts request URIs:
//!
//! ```text
//! scheme://authority[/path][?query][#fragment]
//! scheme:/path[?query][#fragment]
//! /path[?query][#fragment]
//! ?query[#fragment]
//! ```

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::UrlSignerError;
use crate::query::{QueryParams, has_valid_escapes};

/// Characters escaped when writing a path. `%` is left alone so an already
/// escaped path serializes unchanged.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A URL split into scheme, authority, path, query and fragment.
///
/// # Examples
///
/// ```
/// use urlsigner::SignableUrl;
///
/// let url: SignableUrl = "https://app.dev/files?z=1&a=2#top".parse().unwrap();
/// assert_eq!(url.host(), Some("app.dev"));
/// assert_eq!(url.to_string(), "https://app.dev/files?a=2&z=1#top");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignableUrl {
    scheme: Option<String>,
    authority: Option<String>,
    path: String,
    query: QueryParams,
    fragment: Option<String>,
}

impl SignableUrl {
    /// Create a URL with a scheme and authority, no path and no query.
    ///
    /// # Examples
    ///
    /// ```
    /// use urlsigner::SignableUrl;
    ///
    /// assert_eq!(SignableUrl::new("https", "app.dev").to_string(), "https://app.dev");
    /// ```
    #[must_use]
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into().to_ascii_lowercase()),
            authority: Some(authority.into()),
            ..Self::default()
        }
    }

    /// Parse a request URI.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if the input is empty, contains
    /// control characters, has a malformed scheme, authority, path escape or
    /// query, or is a relative reference other than an absolute path or bare
    /// query.
    pub fn parse(raw: &str) -> Result<Self, UrlSignerError> {
        if raw.is_empty() {
            return Err(parse_failure("empty URL"));
        }
        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(parse_failure("URL contains a control character"));
        }

        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_owned())),
            None => (raw, None),
        };
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));

        let (scheme, rest) = split_scheme(rest)?;

        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) if scheme.is_some() => {
                let (authority, path) = after
                    .find('/')
                    .map_or((after, ""), |i| after.split_at(i));
                validate_authority(authority)?;
                (Some(authority.to_owned()), path)
            }
            _ if rest.is_empty() && scheme.is_none() => (None, rest),
            _ if rest.starts_with('/') => (None, rest),
            _ if scheme.is_some() => {
                return Err(parse_failure("opaque URLs are not supported"));
            }
            _ => return Err(parse_failure("invalid URI for request")),
        };
        if !has_valid_escapes(path) {
            return Err(parse_failure("invalid URL escape in path"));
        }

        Ok(Self {
            scheme,
            authority,
            path: path.to_owned(),
            query: QueryParams::parse(query)?,
            fragment,
        })
    }

    /// The lowercased scheme, if any.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// The full authority (`[userinfo@]host[:port]`), if any.
    #[must_use]
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// The host portion of the authority, without userinfo or port.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        let authority = self.authority.as_deref()?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        if host.starts_with('[') {
            let bracketed = host.split_once(']').map_or(host, |(h, _)| h);
            return Some(bracketed.trim_start_matches('['));
        }
        Some(host.split_once(':').map_or(host, |(h, _)| h))
    }

    /// The path as given, possibly empty. Display escapes characters that
    /// cannot appear literally in a URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Mutable access to the query parameters.
    pub fn query_mut(&mut self) -> &mut QueryParams {
        &mut self.query
    }

    /// The fragment, if any.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Replace the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(key, value);
        self
    }

    /// Replace the fragment.
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Drop the fragment.
    pub fn clear_fragment(&mut self) {
        self.fragment = None;
    }
}

impl fmt::Display for SignableUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "//{authority}")?;
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        write!(f, "{}", utf8_percent_encode(&self.path, PATH_ENCODE_SET))?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl FromStr for SignableUrl {
    type Err = UrlSignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for SignableUrl {
    type Error = UrlSignerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Split a leading `scheme:` off `input`.
///
/// A scheme starts with an ASCII letter followed by letters, digits, `+`, `-`
/// or `.`. Anything else before the first `:` means there is no scheme.
fn split_scheme(input: &str) -> Result<(Option<String>, &str), UrlSignerError> {
    for (i, c) in input.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' => {}
            '0'..='9' | '+' | '-' | '.' if i > 0 => {}
            ':' if i == 0 => return Err(parse_failure("missing protocol scheme")),
            ':' => {
                let scheme = input[..i].to_ascii_lowercase();
                return Ok((Some(scheme), &input[i + 1..]));
            }
            _ => break,
        }
    }
    Ok((None, input))
}

/// Reject authorities that cannot name a host.
fn validate_authority(authority: &str) -> Result<(), UrlSignerError> {
    const FORBIDDEN: &[char] = &[' ', '<', '>', '"', '{', '}', '|', '\\', '^', '`'];

    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    if host_port.is_empty() {
        return Err(parse_failure("missing host"));
    }
    if authority.contains(FORBIDDEN) {
        return Err(parse_failure("invalid character in host"));
    }

    let port = if host_port.starts_with('[') {
        let (_, after) = host_port
            .split_once(']')
            .ok_or_else(|| parse_failure("unterminated IPv6 host"))?;
        after.strip_prefix(':')
    } else {
        host_port.split_once(':').map(|(_, port)| port)
    };
    if let Some(port) = port {
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(parse_failure("invalid port"));
        }
    }
    Ok(())
}

fn parse_failure(reason: &str) -> UrlSignerError {
    UrlSignerError::ParseFailure(reason.to_owned())
}
