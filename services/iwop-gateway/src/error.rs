use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::gateway_error::{resolve_error, ApiGatewayError};

/// The gateway answered with a non-2xx status.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ResponseError {
    status: StatusCode,
    message: String,
    headers: HeaderMap,
    body: Bytes,
    data: ApiGatewayError,
}

impl ResponseError {
    /// Build from a failed response, decoding its body.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let data = resolve_error(&body);
        let message = match (data.code(), data.message()) {
            (Some(code), Some(msg)) => {
                format!("request failed with status code {status}: {code}: {msg}")
            }
            (Some(code), None) => format!("request failed with status code {status}: {code}"),
            _ => format!("request failed with status code {status}"),
        };

        Self {
            status,
            message,
            headers,
            body,
            data,
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decoded gateway error, empty when the body could not be decoded.
    pub fn data(&self) -> &ApiGatewayError {
        &self.data
    }
}

impl From<http::Response<Bytes>> for ResponseError {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        Self::new(parts.status, parts.headers, body)
    }
}

/// Error returned by [`OpenApiClient`](crate::OpenApiClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The call was not sent or not answered: bad configuration, signing
    /// failure or transport failure.
    #[error(transparent)]
    Request(#[from] iwopsign_core::Error),
    /// The gateway rejected the call.
    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl ClientError {
    /// HTTP status if the gateway answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Request(_) => None,
            ClientError::Response(e) => Some(e.status()),
        }
    }

    /// Decoded gateway error if the gateway answered.
    pub fn gateway_error(&self) -> Option<&ApiGatewayError> {
        match self {
            ClientError::Request(_) => None,
            ClientError::Response(e) => Some(e.data()),
        }
    }

    /// Whether the call failed on the client side before anything was signed.
    pub fn is_config_error(&self) -> bool {
        match self {
            ClientError::Request(e) => e.is_config_error(),
            ClientError::Response(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iwopsign_core::Error;

    #[test]
    fn test_response_error_decodes_body() {
        let resp = http::Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Bytes::from_static(
                b"<Error><Code>SERVICE_NOT_FOUND</Code><Message>no such api</Message><ClientIP>192.168.1.1</ClientIP></Error>",
            ))
            .unwrap();

        let err = ResponseError::from(resp);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.data().code(), Some("SERVICE_NOT_FOUND"));
        assert_eq!(
            err.to_string(),
            "request failed with status code 404 Not Found: SERVICE_NOT_FOUND: no such api"
        );
    }

    #[test]
    fn test_response_error_without_body() {
        let err = ResponseError::new(StatusCode::BAD_GATEWAY, HeaderMap::new(), Bytes::new());
        assert!(err.data().is_empty());
        assert_eq!(err.message(), "request failed with status code 502 Bad Gateway");
    }

    #[test]
    fn test_client_error_classification() {
        let err = ClientError::from(Error::request_invalid("content type is required"));
        assert!(err.is_config_error());
        assert_eq!(err.status(), None);

        let err = ClientError::from(Error::unexpected("connection refused"));
        assert!(!err.is_config_error());

        let err = ClientError::from(ResponseError::new(
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            Bytes::new(),
        ));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(err.gateway_error().is_some_and(|e| e.is_empty()));
    }
}
