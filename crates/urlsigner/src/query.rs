//! Query string parsing and canonical serialization.
//!
//! Parameters are held in a map keyed by the decoded parameter name, so the
//! serialized form always lists keys in ascending byte order no matter how
//! they were inserted. Values under one key keep their insertion order.
//!
//! Serialization escapes every byte except ASCII alphanumerics and `-`, `_`,
//! `.`, `~`, and writes spaces as `+`:
//!
//! ```text
//! b=hello world&a=x/y   ->   a=x%2Fy&b=hello+world
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::UrlSignerError;

/// The set of characters that must be percent-encoded in a query key or value.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Decoded query parameters in canonical (sorted) order.
///
/// # Examples
///
/// ```
/// use urlsigner::QueryParams;
///
/// let mut query = QueryParams::parse("z=3&a=2").unwrap();
/// query.set("m", "hello world");
/// assert_eq!(query.to_string(), "a=2&m=hello+world&z=3");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`).
    ///
    /// Pairs are separated by `&`; a pair without `=` has an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`UrlSignerError::ParseFailure`] if any pair contains a `;`, a
    /// malformed percent escape, or escapes that do not decode to UTF-8.
    pub fn parse(raw: &str) -> Result<Self, UrlSignerError> {
        let mut query = Self::new();
        for param in raw.split('&').filter(|s| !s.is_empty()) {
            if param.contains(';') {
                return Err(UrlSignerError::ParseFailure(
                    "invalid semicolon separator in query".to_owned(),
                ));
            }
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            query.append(unescape(key)?, unescape(value)?);
        }
        Ok(query)
    }

    /// The first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values stored under `key`, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `key` is present, even with an empty value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Replace every value under `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), vec![value.into()]);
    }

    /// Add `value` after any existing values under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Remove `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.params.remove(key)
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Iterate over `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", escape(key), escape(value))?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.append(key, value);
        }
        query
    }
}

/// Form-encode a single key or value.
fn escape(input: &str) -> String {
    input
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Whether every `%` in `input` starts a two-digit hex escape.
pub(crate) fn has_valid_escapes(input: &str) -> bool {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Form-decode a single key or value.
fn unescape(input: &str) -> Result<String, UrlSignerError> {
    if !has_valid_escapes(input) {
        return Err(UrlSignerError::ParseFailure(format!(
            "invalid URL escape in query: {input:?}"
        )));
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| UrlSignerError::ParseFailure(format!("query is not valid UTF-8: {input:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_sort_keys_on_serialize() {
        assert_eq!(QueryParams::parse("b=2&a=1&c=3").unwrap().to_string(), "a=1&b=2&c=3");
    }

    #[test]
    fn test_should_return_empty_for_empty_query() {
        let query = QueryParams::parse("").unwrap();
        assert!(query.is_empty());
        assert_eq!(query.to_string(), "");
    }

    #[test]
    fn test_should_keep_value_order_for_duplicate_keys() {
        let query = QueryParams::parse("k=2&a=0&k=1").unwrap();
        assert_eq!(query.get("k"), Some("2"));
        assert_eq!(query.get_all("k"), ["2", "1"]);
        assert_eq!(query.to_string(), "a=0&k=2&k=1");
    }

    #[test]
    fn test_should_treat_missing_equals_as_empty_value() {
        let query = QueryParams::parse("flag&x=1").unwrap();
        assert!(query.contains_key("flag"));
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.to_string(), "flag=&x=1");
    }

    #[test]
    fn test_should_decode_plus_and_percent_escapes() {
        let query = QueryParams::parse("q=hello+world&tag=a%2Fb").unwrap();
        assert_eq!(query.get("q"), Some("hello world"));
        assert_eq!(query.get("tag"), Some("a/b"));
        assert_eq!(query.to_string(), "q=hello+world&tag=a%2Fb");
    }

    #[test]
    fn test_should_normalize_raw_special_characters() {
        assert_eq!(
            QueryParams::parse("events=s3:ObjectCreated:*").unwrap().to_string(),
            "events=s3%3AObjectCreated%3A%2A"
        );
        assert_eq!(QueryParams::parse("t=a~b").unwrap().to_string(), "t=a~b");
    }

    #[test]
    fn test_should_replace_values_on_set() {
        let mut query = QueryParams::parse("sig=old&sig=older").unwrap();
        query.set("sig", "new");
        assert_eq!(query.get_all("sig"), ["new"]);
    }

    #[test]
    fn test_should_remove_all_values_for_key() {
        let mut query = QueryParams::parse("a=1&sig=x&sig=y").unwrap();
        assert_eq!(
            query.remove("sig"),
            Some(vec!["x".to_owned(), "y".to_owned()])
        );
        assert_eq!(query.to_string(), "a=1");
        assert_eq!(query.remove("sig"), None);
    }

    #[test]
    fn test_should_collect_from_pairs() {
        let query: QueryParams = [("z", "3"), ("a", "2")].into_iter().collect();
        assert_eq!(query.to_string(), "a=2&z=3");
    }

    #[test]
    fn test_should_escape_unicode_and_reserved_characters() {
        let mut query = QueryParams::new();
        query.set("name", "caf\u{e9} & co");
        assert_eq!(query.to_string(), "name=caf%C3%A9+%26+co");
        assert_eq!(QueryParams::parse(&query.to_string()).unwrap(), query);
    }

    #[test]
    fn test_should_reject_malformed_escapes() {
        for raw in ["bad=%zz", "ok=1&short=%4", "admin=true%", "%g1=x"] {
            assert!(
                matches!(QueryParams::parse(raw), Err(UrlSignerError::ParseFailure(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn test_should_reject_semicolon_separators() {
        assert!(matches!(
            QueryParams::parse("a=1;b=2"),
            Err(UrlSignerError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_should_reject_escapes_that_are_not_utf8() {
        for raw in ["id=%FF", "id=%C0", "%FE=1", "name=caf%E9"] {
            assert!(
                matches!(QueryParams::parse(raw), Err(UrlSignerError::ParseFailure(_))),
                "{raw:?} should not parse"
            );
        }
        assert_eq!(
            QueryParams::parse("name=caf%C3%A9").unwrap().get("name"),
            Some("caf\u{e9}")
        );
    }

    #[test]
    fn test_should_validate_escapes() {
        assert!(has_valid_escapes("a%20b%2Fc"));
        assert!(has_valid_escapes("plain"));
        assert!(!has_valid_escapes("100%"));
        assert!(!has_valid_escapes("%2"));
        assert!(!has_valid_escapes("%zz"));
    }
}
