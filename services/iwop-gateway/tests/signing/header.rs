use super::{sign, signer, SIGNING_TIME};
use http::header::{AUTHORIZATION, DATE};
use http::{Method, Request};
use iwopsign_core::{ErrorKind, SignatureMode};
use iwopsign_gateway::{generate_signature, SignatureEncoding, SignatureOption, SignedInfo};
use pretty_assertions::assert_eq;
use url::Url;

#[tokio::test]
async fn test_get_with_custom_headers() {
    let req = Request::get(
        "https://gateway.example.com/api/v1/projects?pageSize=10&pageNo=1&x-iwop-q=ignored",
    )
    .header("x-iwop-integrated", "wq666")
    .header("X-Iwop-Tenant", "t1")
    .header("accept", "application/json")
    .body(())
    .unwrap();

    let parts = sign(req, SignatureMode::Header).await.unwrap();

    assert_eq!(parts.headers.get(DATE).unwrap(), SIGNING_TIME);
    assert_eq!(
        parts.headers.get(AUTHORIZATION).unwrap(),
        "IWOP iwop-access-id:wusgzSL7EkLoZVemVqaermEd2Xg="
    );
    assert!(parts.headers.get(AUTHORIZATION).unwrap().is_sensitive());
    assert_eq!(parts.headers.get("x-iwop-tenant").unwrap(), "t1");
    assert_eq!(
        parts.uri.to_string(),
        "https://gateway.example.com/api/v1/projects?pageSize=10&pageNo=1&x-iwop-q=ignored"
    );
}

#[tokio::test]
async fn test_post_with_content_type() {
    let req = Request::post("https://gateway.example.com/api/v1/projects")
        .header("content-type", "application/json; charset=UTF-8")
        .body(())
        .unwrap();

    let parts = sign(req, SignatureMode::Header).await.unwrap();

    assert_eq!(
        parts.headers.get(AUTHORIZATION).unwrap(),
        "IWOP iwop-access-id:MLtuTt+VVY+dem0p4PrWbDAI+g8="
    );
}

#[tokio::test]
async fn test_put_with_repeated_custom_header() {
    let req = Request::put("https://gateway.example.com/api/v1/items/42?force=true")
        .header("content-type", "text/plain")
        .header("x-iwop-tag", "a")
        .header("x-iwop-tag", "b")
        .body(())
        .unwrap();

    let parts = sign(req, SignatureMode::Header).await.unwrap();

    assert_eq!(
        parts.headers.get(AUTHORIZATION).unwrap(),
        "IWOP iwop-access-id:19BTzLKEZwhY1f3yhtUBljq9NZc="
    );
    assert_eq!(parts.headers.get_all("x-iwop-tag").iter().count(), 2);
}

#[tokio::test]
async fn test_body_methods_require_content_type() {
    for method in [Method::POST, Method::PUT, Method::PATCH] {
        let req = Request::builder()
            .method(method.clone())
            .uri("https://gateway.example.com/api/v1/projects")
            .body(())
            .unwrap();

        let err = sign(req, SignatureMode::Header).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid, "{method}");
        assert!(err.is_config_error());
    }
}

#[tokio::test]
async fn test_relative_uri_is_rejected() {
    let req = Request::get("/api/v1/projects").body(()).unwrap();

    let err = sign(req, SignatureMode::Header).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[test]
fn test_generate_signature_header_mode() {
    let option = SignatureOption::new(
        "iwop-access-id",
        "123456",
        Method::POST,
        Url::parse("https://gateway.example.com/api/v1/projects").unwrap(),
    )
    .with_content_type("application/json; charset=UTF-8");

    let info = signer()
        .generate_signature(SignatureMode::Header, &option)
        .unwrap();
    assert_eq!(info.mode(), "header");
    assert_eq!(
        info.signed().signable,
        "POST\napplication/json; charset=UTF-8\nMon, 15 Aug 2022 16:50:12 GMT\nhttps://gateway.example.com/api/v1/projects"
    );

    let hex = signer()
        .with_encoding(SignatureEncoding::Hex)
        .generate_signature(SignatureMode::Header, &option)
        .unwrap();
    let SignedInfo::Header(hex) = hex else {
        panic!("expected header mode");
    };
    assert_eq!(
        hex.headers.authorization,
        "IWOP iwop-access-id:30bb6e4edf95558f9d7a6d29e0fad66c3008fa0f"
    );
}

#[test]
fn test_generate_signature_defaults_to_header() {
    let option = SignatureOption::new(
        "iwop-access-id",
        "123456",
        Method::GET,
        Url::parse("https://gateway.example.com/").unwrap(),
    );

    let info = generate_signature(None, &option, None).unwrap();
    assert_eq!(info.mode(), "header");

    let err = generate_signature(Some("Header"), &option, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentInvalid);
}
