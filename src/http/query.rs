//! URL query string decoder with ordered, percent-decoded parameters.

use crate::errors::ErrorKind;
use indexmap::IndexMap;
use memchr::{memchr, memchr_iter};
use std::{borrow::Cow, str::FromStr};

/// URL query string decoder.
///
/// Splits the query on `&`, splits every pair on its first `=`, and
/// percent-decodes both sides (`%XX` escapes and `+` as space, UTF-8).
///
/// The decoder is strict: a pair without `=`, a broken `%` escape or an
/// escape sequence that does not decode to UTF-8 fails the whole query with
/// [`ErrorKind::MalformedQuery`]. Callers that have sensible defaults should
/// use [`Query::decode_or_default`].
///
/// # Examples
/// ```rust
/// use fun_web::query::{Query, QueryParameters};
///
/// let params: QueryParameters = Query::decode("q=hello+world%2Fme&bob=5").unwrap();
/// assert_eq!(params.get("q"), Some("hello world/me"));
/// assert_eq!(params.get("bob"), Some("5"));
///
/// // Later duplicates overwrite earlier ones
/// let params: QueryParameters = Query::decode("a=1&a=2").unwrap();
/// assert_eq!(params.len(), 1);
/// assert_eq!(params.get("a"), Some("2"));
///
/// // Pairs without `=` are rejected
/// assert!(Query::decode::<QueryParameters>("flag&a=1").is_err());
/// ```
pub struct Query;

impl Query {
    /// Decodes a query string into a new collection.
    ///
    /// # Type Parameters
    /// - `C`: Collection type implementing [QueryCollector]
    ///
    /// # Arguments
    /// - `query`: The query string without the leading marker (no `?`)
    #[inline]
    pub fn decode<C: QueryCollector>(query: &str) -> Result<C, ErrorKind> {
        let mut result = C::default();
        Self::decode_into(&mut result, query)?;
        Ok(result)
    }

    /// Decodes a query string into an existing collection.
    ///
    /// Trailing `&` separators are ignored; an empty query decodes to nothing.
    /// On error the collection may already hold the pairs decoded before the
    /// failing one.
    ///
    /// # Examples
    /// ```
    /// use fun_web::query::Query;
    ///
    /// let mut pairs: Vec<(String, String)> = Vec::new();
    /// Query::decode_into(&mut pairs, "a=1&b=%20x&").unwrap();
    /// assert_eq!(pairs, [("a".into(), "1".into()), ("b".into(), " x".into())]);
    /// ```
    pub fn decode_into<C: QueryCollector>(result: &mut C, query: &str) -> Result<(), ErrorKind> {
        let query = query.trim_end_matches('&');
        if query.is_empty() {
            return Ok(());
        }

        for pair in query.split('&') {
            let index = memchr(b'=', pair.as_bytes()).ok_or(ErrorKind::MalformedQuery)?;

            let key = decode_component(&pair[..index])?;
            let value = decode_component(&pair[index + 1..])?;

            result.add_param(key, value);
        }

        Ok(())
    }

    /// Decodes a query string, falling back to an empty parameter set when
    /// it is malformed.
    ///
    /// Every lookup then resolves to its default, which is exactly the
    /// recovery policy of the numeric endpoints.
    pub fn decode_or_default(query: &str) -> QueryParameters {
        Self::decode(query).unwrap_or_else(|err: ErrorKind| {
            tracing::debug!(query, error = %err, "Query rejected, using parameter defaults");
            QueryParameters::default()
        })
    }
}

fn decode_component(raw: &str) -> Result<String, ErrorKind> {
    let bytes = raw.as_bytes();

    for pos in memchr_iter(b'%', bytes) {
        match bytes.get(pos + 1..pos + 3) {
            Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {}
            _ => return Err(ErrorKind::MalformedQuery),
        }
    }

    let spaced = match memchr(b'+', bytes) {
        Some(_) => Cow::Owned(raw.replace('+', " ")),
        None => Cow::Borrowed(raw),
    };

    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|_| ErrorKind::MalformedQuery)
}

/// A trait for types that can collect decoded query parameters.
///
/// # Examples
/// ```rust
/// use fun_web::query::QueryCollector;
///
/// #[derive(Default)]
/// struct KeysOnly(Vec<String>);
///
/// impl QueryCollector for KeysOnly {
///     fn add_param(&mut self, key: String, _value: String) {
///         self.0.push(key);
///     }
///
///     fn length(&self) -> usize {
///         self.0.len()
///     }
/// }
/// ```
pub trait QueryCollector: Default {
    /// Adds a decoded parameter to the collection.
    fn add_param(&mut self, key: String, value: String);

    /// Returns the current number of parameters in the collection.
    fn length(&self) -> usize;
}

// Implementation for Vec - keeps every pair, duplicates included
impl QueryCollector for Vec<(String, String)> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.push((key, value));
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }
}

/// Ordered mapping of decoded query parameters.
///
/// Keys are unique. Inserting an existing key replaces its value but keeps
/// the position of its first insertion, so iteration order is the order in
/// which each surviving key first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters(IndexMap<String, String>);

impl QueryParameters {
    /// Returns the value for the specified parameter.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parses the specified parameter, or returns `default` if it is absent
    /// or does not parse.
    ///
    /// # Examples
    /// ```
    /// use fun_web::query::Query;
    ///
    /// let params = Query::decode_or_default("num1=x&num2=4");
    /// assert_eq!(params.parse_or("num1", 1), 1);
    /// assert_eq!(params.parse_or("num2", 1), 4);
    /// assert_eq!(params.parse_or("num3", 1), 1);
    /// ```
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        let Some(value) = self.get(key) else {
            return default;
        };

        match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                let err = ErrorKind::InvalidNumericParameter {
                    name: key.to_owned(),
                    value: value.to_owned(),
                };
                tracing::debug!(error = %err, "Using parameter default");
                default
            }
        }
    }

    /// Returns the number of distinct parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameter was decoded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// Last value wins, first position stays
impl QueryCollector for QueryParameters {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.0.len()
    }
}
