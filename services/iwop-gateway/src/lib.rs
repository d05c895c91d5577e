//! IWOP API gateway signing implementation for iwopsign.
//!
//! This crate signs calls to APIs published behind the IWOP API gateway and
//! decodes the error envelope the gateway answers with when it rejects one.
//!
//! ## Overview
//!
//! The gateway authenticates a call by rebuilding a canonical string from the
//! request (method, content type, timestamp, `x-iwop-*` headers or query
//! parameters, and the sorted resource url) and comparing its HMAC-SHA1 with
//! the signature the caller sent. The signature travels either in headers:
//!
//! ```text
//! Date: Mon, 15 Aug 2022 16:50:12 GMT
//! Authorization: IWOP {access_id}:{signature}
//! ```
//!
//! or, for pre-signed urls, in the query string as `AccessId`, `Expires` and
//! `Signature`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use iwopsign_core::{Context, OsEnv, Result, SignatureMode, Signer};
//! use iwopsign_gateway::{Config, DefaultCredentialProvider, RequestSigner};
//! use iwopsign_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let config = Config::new().from_env(&ctx);
//!     let loader = DefaultCredentialProvider::from_config(&config);
//!     let builder = RequestSigner::from_config(&config);
//!     let signer = Signer::new(ctx, loader, builder);
//!
//!     let mut req = http::Request::get("https://gateway.example.com/api/v1/items?page=1")
//!         .body(())
//!         .unwrap()
//!         .into_parts()
//!         .0;
//!     signer.sign(&mut req, SignatureMode::Header).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! ```bash
//! export IWOP_ACCESS_ID=your-access-id
//! export IWOP_SECRET=your-secret
//! export IWOP_QUERY_DURATION=3600  # Optional, seconds
//! export IWOP_DEBUG=true           # Optional, log every string to sign
//! ```
//!
//! ## Calling APIs
//!
//! [`OpenApiClient`] wraps signing, sending and error decoding:
//!
//! ```no_run
//! # use iwopsign_core::{Context, OsEnv};
//! # use iwopsign_gateway::{ClientError, Config, OpenApiClient, RequestOption};
//! # async fn example(ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenApiClient::from_config(ctx, "https://gateway.example.com/".parse()?, Config::new());
//!
//! match client.get("api/v1/items", RequestOption::new()).await {
//!     Ok(res) => println!("{}", res.text()?),
//!     Err(ClientError::Response(err)) => {
//!         println!("{:?} from {:?}", err.data().code(), err.data().client_ip())
//!     }
//!     Err(err) => return Err(err.into()),
//! }
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;
pub use constants::{
    CUSTOM_PREFIX, DEFAULT_QUERY_DURATION, IWOP_ACCESS_ID, IWOP_DEBUG, IWOP_QUERY_DURATION,
    IWOP_SECRET, QUERY_ACCESS_ID, QUERY_EXPIRES, QUERY_KEYS, QUERY_SIGNATURE,
};

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod canonical;
pub use canonical::{canonical_string, canonicalized_resource, SignatureOption};

mod signature;
pub use signature::{sign, SignatureEncoding, SignedData};

mod sign_request;
pub use sign_request::{
    generate_signature, DiagnosticSink, HeaderSignedInfo, QuerySignedInfo, RequestSigner,
    SignedHeaders, SignedInfo, SignedQuery,
};

mod gateway_error;
pub use gateway_error::{resolve_error, ApiGatewayError};

mod error;
pub use error::{ClientError, ResponseError};

mod client;
pub use client::{Body, OpenApiClient, RequestOption, RequestResult};

mod provide_credential;
pub use provide_credential::*;
