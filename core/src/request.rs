use std::fmt;
use std::mem;
use std::str::FromStr;
use std::time::Duration;

use http::HeaderMap;
use http::Method;
use url::Url;

use crate::{Error, Result};

/// Signing context for request.
///
/// The uri is lifted into an absolute [`Url`] so that query parameters can be
/// read and rewritten without losing scheme, host or port.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request url including query.
    pub url: Url,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        if parts.uri.authority().is_none() {
            return Err(Error::request_invalid(
                "request without authority is invalid for signing",
            ));
        }
        let url = Url::parse(&parts.uri.to_string())?;

        Ok(SigningRequest {
            method: parts.method.clone(),
            url,
            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = self.url.as_str().parse()?;

        Ok(())
    }

    /// Replace every query pair named in `keys` with the given pairs.
    ///
    /// Pairs not named in `keys` keep their relative order.
    pub fn query_overwrite(&mut self, pairs: &[(&str, &str)]) {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| !pairs.iter().any(|(name, _)| k == name))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        self.url
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .extend_pairs(pairs.iter().copied());
    }
}

/// SignatureMode is the resolved way a signature travels with the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SignatureMode {
    /// Signature carried in `Date` and `Authorization` headers.
    #[default]
    Header,
    /// Signature carried in query parameters with an expiry window.
    ///
    /// `None` means the signer's configured default window.
    Query {
        /// Expiry window added to the signing time.
        duration: Option<Duration>,
    },
}

impl SignatureMode {
    /// Query mode with the signer's default expiry window.
    pub fn query() -> Self {
        SignatureMode::Query { duration: None }
    }

    /// Query mode with an explicit expiry window.
    pub fn query_with_duration(duration: Duration) -> Self {
        SignatureMode::Query {
            duration: Some(duration),
        }
    }

    /// Resolve an optional mode literal and an optional duration.
    ///
    /// A missing literal resolves to [`SignatureMode::Header`]. The duration
    /// is only meaningful for query mode and ignored otherwise.
    pub fn resolve(mode: Option<&str>, duration: Option<Duration>) -> Result<Self> {
        match mode.map(SignatureMode::from_str).transpose()? {
            None | Some(SignatureMode::Header) => Ok(SignatureMode::Header),
            Some(SignatureMode::Query { .. }) => Ok(SignatureMode::Query { duration }),
        }
    }

    /// The literal name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMode::Header => "header",
            SignatureMode::Query { .. } => "query",
        }
    }
}

impl FromStr for SignatureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "header" => Ok(SignatureMode::Header),
            "query" => Ok(SignatureMode::query()),
            _ => Err(Error::argument_invalid(format!(
                "signature mode must be 'header' or 'query', got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for SignatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
