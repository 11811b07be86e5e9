//! Request and response model shared by the worker, cache and network layers
//!
//! A `Response` owns its body and is deliberately not `Clone`. Anything that
//! needs a second copy (the cache write during revalidation) must ask for one
//! with [`Response::duplicate`], so the caller and the cache each own an
//! independent body.

use crate::error::{SootError, SootResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use url::Url;

/// Case-insensitive header map (names are stored lowercase)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// How the request was initiated by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
    mode: RequestMode,
    headers: Headers,
}

impl Request {
    /// Create a GET sub-resource request
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::default(),
            headers: Headers::new(),
        }
    }

    /// Create a top-level navigation request accepting HTML
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_header("accept", "text/html,application/xhtml+xml,*/*;q=0.8")
    }

    /// Parse an absolute URL into a GET request
    pub fn parse(url: &str) -> SootResult<Self> {
        let url = Url::parse(url).map_err(|e| SootError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::get(url))
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the `Accept` header asks for an HTML document
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get("accept")
            .is_some_and(|accept| {
                accept.split(',').any(|range| {
                    let media = range.split(';').next().unwrap_or_default();
                    media.trim().eq_ignore_ascii_case("text/html")
                })
            })
    }

    /// Cache key: the URL without its fragment
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// Cache key for a URL (fragments never take part in matching)
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// A response with a single owned body
#[derive(Debug, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A 200 response with the given body and no headers
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, Headers::new(), body.into())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Create an independent copy with its own body
    pub fn duplicate(&self) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Consume the response, returning the body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn into_parts(self) -> (u16, Headers, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}
