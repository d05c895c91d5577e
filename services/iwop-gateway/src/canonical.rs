//! Canonical request construction for the IWOP gateway.
//!
//! The gateway rebuilds the very same string from the raw request it receives
//! and compares HMACs, so every byte here is part of the protocol.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use http::HeaderMap;
use http::Method;
use iwopsign_core::utils::Redact;
use iwopsign_core::{Result, SignatureMode};
use url::Url;

use crate::constants::{CUSTOM_PREFIX, QUERY_KEYS};

/// SignatureOption describes one outgoing call to be signed.
#[derive(Clone)]
pub struct SignatureOption {
    /// Access id issued by the gateway.
    pub access_id: String,
    /// Shared secret used as HMAC key.
    pub secret: String,
    /// HTTP method of the call.
    pub method: Method,
    /// Value of the `Content-Type` header, if any.
    ///
    /// Required for `POST`, `PUT` and `PATCH`. An empty value counts as absent.
    pub content_type: Option<String>,
    /// Absolute url of the call including its query.
    pub resource_url: Url,
    /// Request headers; custom headers are picked from here in header mode.
    pub headers: HeaderMap,
}

impl SignatureOption {
    /// Create an option without content type or headers.
    pub fn new(
        access_id: impl Into<String>,
        secret: impl Into<String>,
        method: Method,
        resource_url: Url,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            secret: secret.into(),
            method,
            content_type: None,
            resource_url,
            headers: HeaderMap::new(),
        }
    }

    /// Set content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The content type if it is set and not empty.
    pub(crate) fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref().filter(|s| !s.is_empty())
    }
}

impl Debug for SignatureOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureOption")
            .field("access_id", &Redact::from(&self.access_id))
            .field("secret", &Redact::from(&self.secret))
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("resource_url", &self.resource_url.as_str())
            .field("headers", &self.headers)
            .finish()
    }
}

/// Build the canonical string for `option`.
///
/// ## Format
///
/// ```text
/// METHOD + "\n" +
/// [Content-Type + "\n"] +
/// Timestamp + "\n" +
/// [x-iwop-name:value + "\n"]... +
/// CanonicalizedResource
/// ```
///
/// `time` is the HTTP date in header mode and the `Expires` value in query mode.
pub fn canonical_string(mode: SignatureMode, option: &SignatureOption, time: &str) -> Result<String> {
    let mut items: Vec<String> = vec![option.method.as_str().to_ascii_uppercase()];
    if let Some(content_type) = option.content_type() {
        items.push(content_type.to_string());
    }
    items.push(time.to_string());

    let custom: Vec<(String, String)> = match mode {
        SignatureMode::Header => custom_headers(&option.headers)?.into_iter().collect(),
        SignatureMode::Query { .. } => custom_query(&option.resource_url),
    };
    items.extend(custom.into_iter().map(|(k, v)| format!("{k}:{v}")));

    items.push(canonicalized_resource(&option.resource_url));

    Ok(items.join("\n"))
}

/// Custom headers with lowercase names, sorted by name.
///
/// Multiple values of one header are joined with `,` in insertion order.
/// Header names are ASCII, so byte order matches UTF-16 order here.
fn custom_headers(headers: &HeaderMap) -> Result<BTreeMap<String, String>> {
    let mut custom = BTreeMap::new();
    for name in headers.keys() {
        // HeaderName is always lowercase.
        if !name.as_str().starts_with(CUSTOM_PREFIX) {
            continue;
        }

        let values = headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        custom.insert(name.as_str().to_string(), values.join(","));
    }

    Ok(custom)
}

/// Custom query parameters with lowercase names, sorted by UTF-16 code units.
///
/// When a name repeats, the last value wins.
fn custom_query(url: &Url) -> Vec<(String, String)> {
    let latest: BTreeMap<String, String> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            let name = k.to_lowercase();
            is_custom(&name).then(|| (name, v.into_owned()))
        })
        .collect();

    let mut custom: Vec<_> = latest.into_iter().collect();
    custom.sort_by(|a, b| utf16_cmp(&a.0, &b.0));
    custom
}

/// Build the canonicalized resource of `url`.
///
/// Authentication parameters and custom parameters are dropped, the rest is
/// stably sorted by name in UTF-16 code unit order and serialized as
/// `application/x-www-form-urlencoded`. An empty query leaves no `?` behind.
pub fn canonicalized_resource(url: &Url) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !QUERY_KEYS.contains(&&**k) && !is_custom(&k.to_lowercase()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort_by(|a, b| utf16_cmp(&a.0, &b.0));

    let mut resource = url.clone();
    if params.is_empty() {
        resource.set_query(None);
    } else {
        resource.query_pairs_mut().clear().extend_pairs(params);
    }

    resource.to_string()
}

#[inline]
fn is_custom(lowercase_name: &str) -> bool {
    lowercase_name.starts_with(CUSTOM_PREFIX)
}

/// Order strings by UTF-16 code units, the order the gateway sorts keys in.
///
/// Differs from byte order only between U+E000..=U+FFFF and non-BMP chars.
fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}
