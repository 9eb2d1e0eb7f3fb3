//! The `github?` endpoint: an outbound GitHub REST call and a narrow field
//! extraction from its payload.

use crate::{config::GithubConfig, errors::ErrorKind};
use memchr::memmem;
use std::{fmt, future::Future};

/// Outbound fetch of an upstream JSON payload.
pub trait Fetch: Send + Sync + 'static {
    /// Fetches `url` and returns the response body as text.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, ErrorKind>> + Send;
}

/// [`Fetch`] over a shared `reqwest` client.
///
/// The client carries the whole-request timeout and the `User-Agent`
/// GitHub requires.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &GithubConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ErrorKind> {
        let upstream = |err: reqwest::Error| ErrorKind::UpstreamFetchFailure(err.to_string());

        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(upstream)?
            .text()
            .await
            .map_err(upstream)
    }
}

/// Pulls individual fields out of an upstream payload.
///
/// Only the first occurrence of a key counts, wherever it is nested.
pub trait FieldExtractor: Send + Sync + 'static {
    /// Returns the first string value stored under `key`.
    fn string_field<'a>(&self, payload: &'a str, key: &str) -> Result<&'a str, ErrorKind>;

    /// Returns the first integer value stored under `key`.
    fn integer_field(&self, payload: &str, key: &str) -> Result<u64, ErrorKind>;
}

/// Substring scanner: finds `"key":`, skips whitespace and reads the value
/// that follows.
///
/// It does not understand JSON structure or escapes, so a string value ends
/// at the first `"` after its opening quote.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringExtractor;

impl SubstringExtractor {
    fn value_start<'a>(payload: &'a str, key: &str) -> Result<&'a str, ErrorKind> {
        let needle = format!("\"{key}\":");
        let start = memmem::find(payload.as_bytes(), needle.as_bytes())
            .ok_or_else(|| ErrorKind::FieldExtractionFailure(format!("field `{key}` is missing")))?;

        Ok(payload[start + needle.len()..].trim_start())
    }
}

impl FieldExtractor for SubstringExtractor {
    fn string_field<'a>(&self, payload: &'a str, key: &str) -> Result<&'a str, ErrorKind> {
        let not_a_string =
            || ErrorKind::FieldExtractionFailure(format!("field `{key}` is not a string"));

        let value = Self::value_start(payload, key)?
            .strip_prefix('"')
            .ok_or_else(not_a_string)?;
        let end = memchr::memchr(b'"', value.as_bytes()).ok_or_else(not_a_string)?;

        Ok(&value[..end])
    }

    fn integer_field(&self, payload: &str, key: &str) -> Result<u64, ErrorKind> {
        let value = Self::value_start(payload, key)?;
        let end = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());

        value[..end].parse().map_err(|_| {
            ErrorKind::FieldExtractionFailure(format!("field `{key}` is not an integer"))
        })
    }
}

/// The fields the endpoint reports.
///
/// `owner_name` is read from the same `"name"` key as `name`, so both always
/// carry the repository name.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoSummary<'a> {
    pub full_name: &'a str,
    pub name: &'a str,
    pub id: u64,
    pub login: &'a str,
    pub owner_name: &'a str,
}

impl<'a> RepoSummary<'a> {
    pub fn extract<X: FieldExtractor + ?Sized>(
        extractor: &X,
        payload: &'a str,
    ) -> Result<Self, ErrorKind> {
        Ok(Self {
            full_name: extractor.string_field(payload, "full_name")?,
            name: extractor.string_field(payload, "name")?,
            id: extractor.integer_field(payload, "id")?,
            login: extractor.string_field(payload, "login")?,
            owner_name: extractor.string_field(payload, "name")?,
        })
    }
}

impl fmt::Display for RepoSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Full Name: {}<br>Repository Name: {}<br>ID: {}<br>Login Name: {}<br>Owner Name: {}<br>",
            self.full_name, self.name, self.id, self.login, self.owner_name
        )
    }
}
