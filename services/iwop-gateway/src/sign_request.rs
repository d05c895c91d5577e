use std::fmt::{Debug, Formatter};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::HeaderValue;
use iwopsign_core::time::{format_http_date, now, unix_seconds_rounded, DateTime};
use iwopsign_core::{Context, Error, Result, SignRequest, SignatureMode, SigningRequest};
use log::info;
use serde::Serialize;

use crate::canonical::SignatureOption;
use crate::constants::*;
use crate::signature::{compute_signature, SignatureEncoding, SignedData};
use crate::{Config, Credential};

/// Callback receiving every [`SignedData`] produced by a [`RequestSigner`].
pub type DiagnosticSink = Arc<dyn Fn(&SignedData) + Send + Sync>;

/// Headers to merge into a request signed in header mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignedHeaders {
    /// HTTP date the signature was computed at.
    pub date: String,
    /// `IWOP {access_id}:{signature}`.
    pub authorization: String,
}

/// Query parameters to merge into a request signed in query mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignedQuery {
    /// Access id issued by the gateway.
    pub access_id: String,
    /// Unix seconds after which the signature is rejected.
    pub expires: i64,
    /// Encoded signature.
    pub signature: String,
}

/// Result of signing in header mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSignedInfo {
    /// What was signed and the signature.
    pub signed: SignedData,
    /// Headers carrying the signature.
    pub headers: SignedHeaders,
}

/// Result of signing in query mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySignedInfo {
    /// What was signed and the signature.
    pub signed: SignedData,
    /// Query parameters carrying the signature.
    pub query: SignedQuery,
}

/// Output of [`generate_signature`], tagged by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SignedInfo {
    /// Signature for headers.
    Header(HeaderSignedInfo),
    /// Signature for the query string.
    Query(QuerySignedInfo),
}

impl SignedInfo {
    /// The literal mode of this signature.
    pub fn mode(&self) -> &'static str {
        match self {
            SignedInfo::Header(_) => "header",
            SignedInfo::Query(_) => "query",
        }
    }

    /// The signed data of this signature.
    pub fn signed(&self) -> &SignedData {
        match self {
            SignedInfo::Header(v) => &v.signed,
            SignedInfo::Query(v) => &v.signed,
        }
    }
}

/// RequestSigner that implements the IWOP gateway signature.
///
/// - [Header mode](SignatureMode::Header) adds `Date` and `Authorization`.
/// - [Query mode](SignatureMode::Query) adds `AccessId`, `Expires` and `Signature`.
#[derive(Clone)]
pub struct RequestSigner {
    time: Option<DateTime>,
    query_duration: Duration,
    encoding: SignatureEncoding,
    diagnostic: Option<DiagnosticSink>,
}

impl Debug for RequestSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("time", &self.time)
            .field("query_duration", &self.query_duration)
            .field("encoding", &self.encoding)
            .field("diagnostic", &self.diagnostic.is_some())
            .finish()
    }
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSigner {
    /// Create a new signer with [`DEFAULT_QUERY_DURATION`] and base64 signatures.
    pub fn new() -> Self {
        Self {
            time: None,
            query_duration: DEFAULT_QUERY_DURATION,
            encoding: SignatureEncoding::default(),
            diagnostic: None,
        }
    }

    /// Create a signer from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_query_duration(config.query_duration())
            .with_debug(config.debug)
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the expiry window used when query mode carries no duration.
    pub fn with_query_duration(mut self, duration: Duration) -> Self {
        self.query_duration = duration;
        self
    }

    /// Set the signature encoding.
    pub fn with_encoding(mut self, encoding: SignatureEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Install a callback receiving every string to sign and its signature.
    pub fn with_diagnostic(mut self, sink: impl Fn(&SignedData) + Send + Sync + 'static) -> Self {
        self.diagnostic = Some(Arc::new(sink));
        self
    }

    /// Log every string to sign and its signature at info level.
    ///
    /// Passing `false` removes any installed diagnostic.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.diagnostic = None;
        if debug {
            let sink: DiagnosticSink = Arc::new(|signed: &SignedData| {
                info!(
                    "iwop signature: signable={:?}, signature={}",
                    signed.signable, signed.signature
                )
            });
            self.diagnostic = Some(sink);
        }
        self
    }

    fn get_time(&self) -> DateTime {
        self.time.unwrap_or_else(now)
    }

    /// Sign `option` in `mode`.
    ///
    /// Fails before any canonicalization when the access id or secret is
    /// empty, or when a `POST`, `PUT` or `PATCH` carries no content type.
    pub fn generate_signature(
        &self,
        mode: SignatureMode,
        option: &SignatureOption,
    ) -> Result<SignedInfo> {
        validate_credential(option)?;
        validate_content_type(option)?;

        let signing_time = self.get_time();
        let info = match mode {
            SignatureMode::Header => {
                let date = format_http_date(signing_time);
                let signed = compute_signature(mode, option, &date, self.encoding)?;
                let authorization = format!(
                    "{AUTHORIZATION_SCHEME} {}:{}",
                    option.access_id, signed.signature
                );
                SignedInfo::Header(HeaderSignedInfo {
                    headers: SignedHeaders {
                        date,
                        authorization,
                    },
                    signed,
                })
            }
            SignatureMode::Query { duration } => {
                let duration = duration.unwrap_or(self.query_duration);
                let expires = i64::try_from(duration.as_secs())
                    .ok()
                    .and_then(|secs| unix_seconds_rounded(signing_time).checked_add(secs))
                    .ok_or_else(|| {
                        Error::argument_invalid(format!(
                            "query signature duration {duration:?} is out of range"
                        ))
                    })?;
                let signed =
                    compute_signature(mode, option, &expires.to_string(), self.encoding)?;
                SignedInfo::Query(QuerySignedInfo {
                    query: SignedQuery {
                        access_id: option.access_id.clone(),
                        expires,
                        signature: signed.signature.clone(),
                    },
                    signed,
                })
            }
        };

        if let Some(sink) = &self.diagnostic {
            sink(info.signed());
        }

        Ok(info)
    }

    fn sign_signing_request(
        &self,
        req: &mut SigningRequest,
        cred: &Credential,
        mode: SignatureMode,
    ) -> Result<()> {
        let content_type = req
            .headers
            .get(CONTENT_TYPE)
            .map(|v| v.to_str())
            .transpose()?
            .map(str::to_string);

        let option = SignatureOption {
            access_id: cred.access_id.clone(),
            secret: cred.secret.clone(),
            method: req.method.clone(),
            content_type,
            resource_url: req.url.clone(),
            headers: mem::take(&mut req.headers),
        };
        let result = self.generate_signature(mode, &option);
        req.headers = option.headers;

        match result? {
            SignedInfo::Header(info) => {
                req.headers.insert(DATE, info.headers.date.parse()?);

                let mut value: HeaderValue = info.headers.authorization.parse()?;
                value.set_sensitive(true);
                req.headers.insert(AUTHORIZATION, value);
            }
            SignedInfo::Query(info) => {
                req.query_overwrite(&[
                    (QUERY_ACCESS_ID, info.query.access_id.as_str()),
                    (QUERY_EXPIRES, info.query.expires.to_string().as_str()),
                    (QUERY_SIGNATURE, info.query.signature.as_str()),
                ]);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _ctx: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
        mode: SignatureMode,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid(
                "no credential available for iwop gateway",
            ));
        };

        let mut signing = SigningRequest::build(req)?;
        let result = self.sign_signing_request(&mut signing, cred, mode);
        signing.apply(req)?;
        result
    }
}

/// Generate a signature from a mode literal.
///
/// `mode` must be `"header"`, `"query"` or absent (header). `duration` only
/// applies to query mode and falls back to [`DEFAULT_QUERY_DURATION`].
///
/// Checks run in order: access id, secret, mode, content type.
pub fn generate_signature(
    mode: Option<&str>,
    option: &SignatureOption,
    duration: Option<Duration>,
) -> Result<SignedInfo> {
    validate_credential(option)?;
    let mode = SignatureMode::resolve(mode, duration)?;

    RequestSigner::new().generate_signature(mode, option)
}

fn validate_credential(option: &SignatureOption) -> Result<()> {
    if option.access_id.is_empty() {
        return Err(Error::credential_invalid("access id must not be empty"));
    }
    if option.secret.is_empty() {
        return Err(Error::credential_invalid("secret must not be empty"));
    }
    Ok(())
}

fn validate_content_type(option: &SignatureOption) -> Result<()> {
    let method = option.method.as_str().to_ascii_uppercase();
    let needs_content_type = matches!(method.as_str(), "POST" | "PUT" | "PATCH");
    if needs_content_type && option.content_type().is_none() {
        return Err(Error::request_invalid(format!(
            "content type is required for {method} requests"
        )));
    }
    Ok(())
}
