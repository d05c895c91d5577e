use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::{Method, Request, Response, StatusCode};
use iwopsign_core::time::parse_rfc2822;
use iwopsign_core::{Context, ErrorKind, HttpSend, SignatureMode, Signer, StaticEnv};
use iwopsign_gateway::{
    ClientError, Config, Credential, OpenApiClient, RequestOption, RequestSigner,
    StaticCredentialProvider, IWOP_ACCESS_ID, IWOP_SECRET,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;

/// HttpSend that records requests and answers with a canned response.
#[derive(Debug, Clone)]
struct MockHttpSend {
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
}

impl MockHttpSend {
    fn new(status: StatusCode, content_type: &'static str, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
            requests: Arc::default(),
        }
    }

    fn ok_json(body: &'static str) -> Self {
        Self::new(StatusCode::OK, "application/json", body)
    }

    fn sent(&self) -> Vec<Request<Bytes>> {
        self.requests.lock().unwrap().drain(..).collect()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> iwopsign_core::Result<Response<Bytes>> {
        self.requests.lock().unwrap().push(req);

        Ok(Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, self.content_type)
            .body(Bytes::from_static(self.body.as_bytes()))?)
    }
}

fn base_url() -> Url {
    Url::parse("https://gateway.example.com/").unwrap()
}

fn client(http: MockHttpSend) -> OpenApiClient {
    let _ = env_logger::builder().is_test(true).try_init();

    let ctx = Context::new().with_http_send(http);
    let builder = RequestSigner::new()
        .with_time(parse_rfc2822("Mon, 15 Aug 2022 16:50:12 GMT").unwrap())
        .with_debug(true);
    let signer = Signer::new(
        ctx.clone(),
        StaticCredentialProvider::new("iwop-access-id", "123456"),
        builder,
    );
    OpenApiClient::new(ctx, base_url(), signer)
}

#[tokio::test]
async fn test_get_is_signed_in_headers() {
    let http = MockHttpSend::ok_json(r#"{"items":[1,2]}"#);
    let client = client(http.clone());

    let res = client
        .get(
            "api/v1/projects",
            RequestOption::new()
                .with_query("pageSize", "10")
                .with_query("pageNo", "1")
                .with_header("x-iwop-integrated".parse().unwrap(), "wq666".parse().unwrap())
                .with_header("x-iwop-tenant".parse().unwrap(), "t1".parse().unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.content_type(), Some("application/json"));
    let value: serde_json::Value = res.json().unwrap();
    assert_eq!(value, json!({"items": [1, 2]}));

    let sent = http.sent();
    assert_eq!(sent.len(), 1);
    let req = &sent[0];
    assert_eq!(req.method(), Method::GET);
    assert_eq!(
        req.uri().to_string(),
        "https://gateway.example.com/api/v1/projects?pageSize=10&pageNo=1"
    );
    assert_eq!(
        req.headers().get(DATE).unwrap(),
        "Mon, 15 Aug 2022 16:50:12 GMT"
    );
    assert_eq!(
        req.headers().get(AUTHORIZATION).unwrap(),
        "IWOP iwop-access-id:wusgzSL7EkLoZVemVqaermEd2Xg="
    );
}

#[tokio::test]
async fn test_post_json_defaults_content_type() {
    let http = MockHttpSend::new(StatusCode::CREATED, "text/plain", "created");
    let client = client(http.clone());

    let res = client
        .post(
            "api/v1/projects",
            RequestOption::new().with_json(json!({"name": "demo"})),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().unwrap(), "created");

    let sent = http.sent();
    let req = &sent[0];
    assert_eq!(
        req.headers().get(CONTENT_TYPE).unwrap(),
        "application/json; charset=UTF-8"
    );
    assert_eq!(req.body().as_ref(), br#"{"name":"demo"}"#);
    assert_eq!(
        req.headers().get(AUTHORIZATION).unwrap(),
        "IWOP iwop-access-id:MLtuTt+VVY+dem0p4PrWbDAI+g8="
    );
}

#[tokio::test]
async fn test_explicit_content_type_wins() {
    let http = MockHttpSend::ok_json("{}");
    let client = client(http.clone());

    client
        .put(
            "api/v1/projects/1",
            RequestOption::new()
                .with_content_type("application/merge-patch+json")
                .with_json(json!({"name": "demo"})),
        )
        .await
        .unwrap();

    let sent = http.sent();
    assert_eq!(
        sent[0].headers().get(CONTENT_TYPE).unwrap(),
        "application/merge-patch+json"
    );
}

#[tokio::test]
async fn test_missing_content_type_is_not_sent() {
    let http = MockHttpSend::ok_json("{}");
    let client = client(http.clone());

    let err = client
        .patch("api/v1/projects/1", RequestOption::new().with_body("raw"))
        .await
        .unwrap_err();

    assert!(err.is_config_error());
    assert_eq!(err.status(), None);
    assert!(http.sent().is_empty());
}

#[tokio::test]
async fn test_gateway_error_is_decoded() {
    let http = MockHttpSend::new(
        StatusCode::NOT_FOUND,
        "application/xml",
        "<Error><Code>SERVICE_NOT_FOUND</Code><Message>no such api</Message><ClientIP>192.168.1.1</ClientIP></Error>",
    );
    let client = client(http);

    let err = client
        .delete("api/v1/projects/1", RequestOption::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(!err.is_config_error());
    let ClientError::Response(err) = err else {
        panic!("expected response error");
    };
    assert_eq!(err.data().code(), Some("SERVICE_NOT_FOUND"));
    assert_eq!(err.data().message(), Some("no such api"));
    assert_eq!(err.data().client_ip(), Some("192.168.1.1"));
    assert_eq!(err.headers().get(CONTENT_TYPE).unwrap(), "application/xml");
}

#[tokio::test]
async fn test_gateway_error_with_garbage_body() {
    let http = MockHttpSend::new(StatusCode::BAD_GATEWAY, "text/html", "<html>oops");
    let client = client(http);

    let err = client
        .get("api/v1/projects", RequestOption::new())
        .await
        .unwrap_err();

    let data = err.gateway_error().expect("gateway answered");
    assert!(data.is_empty());
    assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
}

#[tokio::test]
async fn test_query_mode_request() {
    let http = MockHttpSend::ok_json("{}");
    let client = client(http.clone());

    client
        .get(
            "api/v1/items",
            RequestOption::new()
                .with_query("page", "1")
                .signed_by(SignatureMode::query()),
        )
        .await
        .unwrap();

    let sent = http.sent();
    let req = &sent[0];
    assert!(req.headers().get(AUTHORIZATION).is_none());
    assert_eq!(
        req.uri().to_string(),
        "https://gateway.example.com/api/v1/items?page=1\
         &AccessId=iwop-access-id&Expires=1660585812&Signature=Qcv5Ry6T78XZZpJgrUMXoO%2Bjxss%3D"
    );
}

#[tokio::test]
async fn test_from_config_reads_env() {
    let http = MockHttpSend::ok_json("{}");
    let ctx = Context::new()
        .with_http_send(http.clone())
        .with_env(StaticEnv::from_pairs([
            (IWOP_ACCESS_ID, "env-access-id"),
            (IWOP_SECRET, "env-secret"),
        ]));
    let client = OpenApiClient::from_config(ctx, base_url(), Config::new());

    client
        .get("api/v1/items", RequestOption::new())
        .await
        .unwrap();

    let sent = http.sent();
    let auth = sent[0].headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
    assert!(auth.starts_with("IWOP env-access-id:"), "{auth}");
}

#[tokio::test]
async fn test_missing_credential_is_config_error() {
    let http = MockHttpSend::ok_json("{}");
    let ctx = Context::new().with_http_send(http.clone());
    let client = OpenApiClient::from_config(ctx, base_url(), Config::new());

    let err = client
        .get("api/v1/items", RequestOption::new())
        .await
        .unwrap_err();

    let ClientError::Request(err) = err else {
        panic!("expected request error");
    };
    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    assert!(http.sent().is_empty());
}

#[tokio::test]
async fn test_with_credential() {
    let http = MockHttpSend::ok_json("{}");
    let ctx = Context::new().with_http_send(http.clone());
    let client =
        OpenApiClient::with_credential(ctx, base_url(), Credential::new("ak-fixed", "sk"));

    client.get("/ping", RequestOption::new()).await.unwrap();

    let sent = http.sent();
    assert_eq!(sent[0].uri().to_string(), "https://gateway.example.com/ping");
    assert!(sent[0].headers().contains_key(DATE));
}
