use std::fmt::{Debug, Formatter};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use iwopsign_core::{Context, Error, SignatureMode, Signer};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::constants::DEFAULT_JSON_CONTENT_TYPE;
use crate::error::{ClientError, ResponseError};
use crate::provide_credential::{DefaultCredentialProvider, StaticCredentialProvider};
use crate::{Config, Credential, RequestSigner};

/// Body of a gateway call.
#[derive(Debug, Clone)]
pub enum Body {
    /// Raw bytes, sent as is.
    Bytes(Bytes),
    /// JSON document.
    ///
    /// Sent with `application/json; charset=UTF-8` unless a content type is set.
    Json(Value),
}

/// Per call options for [`OpenApiClient::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOption {
    query: Vec<(String, String)>,
    headers: HeaderMap,
    content_type: Option<String>,
    body: Option<Body>,
    signed_by: SignatureMode,
}

impl RequestOption {
    /// Create an empty option signed in header mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append a header.
    ///
    /// Headers starting with `x-iwop-` are covered by header mode signatures.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set a raw body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Bytes(body.into()));
        self
    }

    /// Set a JSON body.
    pub fn with_json(mut self, value: impl Into<Value>) -> Self {
        self.body = Some(Body::Json(value.into()));
        self
    }

    /// Choose how the call is signed.
    pub fn signed_by(mut self, mode: SignatureMode) -> Self {
        self.signed_by = mode;
        self
    }
}

/// Successful (2xx) answer of the gateway.
#[derive(Debug, Clone)]
pub struct RequestResult {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestResult {
    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Take the body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> iwopsign_core::Result<String> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> iwopsign_core::Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::unexpected("response body is not the expected json").with_source(e))
    }
}

impl From<http::Response<Bytes>> for RequestResult {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// Client for APIs published behind the IWOP gateway.
///
/// Every call is signed, sent through the [`Context`]'s `HttpSend` and
/// non-2xx answers are turned into [`ResponseError`].
///
/// ## Example
///
/// ```no_run
/// use iwopsign_core::{Context, OsEnv};
/// use iwopsign_gateway::{Config, OpenApiClient, RequestOption};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = Context::new().with_env(OsEnv);
/// let base = Url::parse("https://gateway.example.com/")?;
/// let client = OpenApiClient::from_config(ctx, base, Config::new());
///
/// let res = client
///     .get("api/v1/items", RequestOption::new().with_query("page", "1"))
///     .await?;
/// println!("{}", res.text()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenApiClient {
    ctx: Context,
    base_url: Url,
    signer: Signer<Credential>,
}

impl Debug for OpenApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl OpenApiClient {
    /// Create a client with a prepared signer.
    pub fn new(ctx: Context, base_url: Url, signer: Signer<Credential>) -> Self {
        Self {
            ctx,
            base_url,
            signer,
        }
    }

    /// Create a client signing with a fixed credential.
    pub fn with_credential(ctx: Context, base_url: Url, credential: Credential) -> Self {
        let loader = StaticCredentialProvider::new(&credential.access_id, &credential.secret);
        let signer = Signer::new(ctx.clone(), loader, RequestSigner::new());
        Self::new(ctx, base_url, signer)
    }

    /// Create a client from config, completed from the context's env.
    pub fn from_config(ctx: Context, base_url: Url, config: Config) -> Self {
        let config = config.from_env(&ctx);
        let loader = DefaultCredentialProvider::from_config(&config);
        let signer = Signer::new(ctx.clone(), loader, RequestSigner::from_config(&config));
        Self::new(ctx, base_url, signer)
    }

    /// Base url api paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send a `GET` request.
    pub async fn get(&self, path: &str, option: RequestOption) -> Result<RequestResult, ClientError> {
        self.request(Method::GET, path, option).await
    }

    /// Send a `POST` request.
    pub async fn post(&self, path: &str, option: RequestOption) -> Result<RequestResult, ClientError> {
        self.request(Method::POST, path, option).await
    }

    /// Send a `PUT` request.
    pub async fn put(&self, path: &str, option: RequestOption) -> Result<RequestResult, ClientError> {
        self.request(Method::PUT, path, option).await
    }

    /// Send a `PATCH` request.
    pub async fn patch(&self, path: &str, option: RequestOption) -> Result<RequestResult, ClientError> {
        self.request(Method::PATCH, path, option).await
    }

    /// Send a `DELETE` request.
    pub async fn delete(&self, path: &str, option: RequestOption) -> Result<RequestResult, ClientError> {
        self.request(Method::DELETE, path, option).await
    }

    /// Sign and send a request to `path`, resolved against the base url.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        option: RequestOption,
    ) -> Result<RequestResult, ClientError> {
        let mode = option.signed_by;
        let req = self.build_request(method, path, option)?;

        let (mut parts, body) = req.into_parts();
        self.signer.sign(&mut parts, mode).await?;
        let req = http::Request::from_parts(parts, body);

        debug!("sending {} {}", req.method(), req.uri());
        let resp = self.ctx.http_send(req).await?;
        if resp.status().is_success() {
            return Ok(RequestResult::from(resp));
        }

        let err = ResponseError::from(resp);
        debug!("gateway rejected request: {err}");
        Err(err.into())
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        option: RequestOption,
    ) -> iwopsign_core::Result<http::Request<Bytes>> {
        let mut url = self.base_url.join(path).map_err(|e| {
            Error::request_invalid(format!("api path '{path}' is invalid")).with_source(e)
        })?;
        if !option.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&option.query);
        }

        let (body, default_content_type) = match option.body {
            None => (Bytes::new(), None),
            Some(Body::Bytes(bytes)) => (bytes, None),
            Some(Body::Json(value)) => {
                let bytes = serde_json::to_vec(&value).map_err(|e| {
                    Error::request_invalid("request body cannot be encoded as json").with_source(e)
                })?;
                (Bytes::from(bytes), Some(DEFAULT_JSON_CONTENT_TYPE))
            }
        };

        let mut req = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body)?;
        *req.headers_mut() = option.headers;
        if let Some(content_type) = option
            .content_type
            .as_deref()
            .or(default_content_type)
        {
            req.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }

        Ok(req)
    }
}
