// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::time::Duration;

use super::{sign, signer};
use http::header::AUTHORIZATION;
use http::{Method, Request};
use iwopsign_core::{ErrorKind, SignatureMode};
use iwopsign_gateway::{generate_signature, SignatureOption, SignedInfo};
use pretty_assertions::assert_eq;
use url::Url;

#[tokio::test]
async fn test_presigned_url_with_custom_query() {
    let req = Request::get(
        "https://gateway.example.com/api/v1/files/report.pdf?version=2&x-iwop-before=wq666",
    )
    .body(())
    .unwrap();

    let parts = sign(
        req,
        SignatureMode::query_with_duration(Duration::from_secs(3600)),
    )
    .await
    .unwrap();

    assert!(parts.headers.get(AUTHORIZATION).is_none());
    assert_eq!(
        parts.uri.to_string(),
        "https://gateway.example.com/api/v1/files/report.pdf?version=2&x-iwop-before=wq666\
         &AccessId=iwop-access-id&Expires=1660585812&Signature=%2Fu%2B38G5j89wT1dNbe4F%2BUjI0854%3D"
    );
}

#[tokio::test]
async fn test_presigned_url_replaces_stale_signature() {
    let req = Request::get(
        "https://gateway.example.com/api/v1/items?AccessId=old&Signature=stale&page=1&Expires=1",
    )
    .body(())
    .unwrap();

    // Default window of the signer is one hour.
    let parts = sign(req, SignatureMode::query()).await.unwrap();

    assert_eq!(
        parts.uri.to_string(),
        "https://gateway.example.com/api/v1/items?page=1\
         &AccessId=iwop-access-id&Expires=1660585812&Signature=Qcv5Ry6T78XZZpJgrUMXoO%2Bjxss%3D"
    );
}

#[test]
fn test_expires_is_signing_time_plus_duration() {
    let option = SignatureOption::new(
        "iwop-access-id",
        "123456",
        Method::GET,
        Url::parse("https://gateway.example.com/api/v1/items?page=1").unwrap(),
    );

    for secs in [1u64, 60, 3600, 86400] {
        let info = signer()
            .generate_signature(
                SignatureMode::query_with_duration(Duration::from_secs(secs)),
                &option,
            )
            .unwrap();
        let SignedInfo::Query(info) = info else {
            panic!("expected query mode");
        };

        assert_eq!(info.query.expires, 1660582212 + secs as i64);
        let timestamp = info.signed.signable.lines().nth(1).unwrap();
        assert_eq!(timestamp, info.query.expires.to_string());
    }
}

#[test]
fn test_generate_signature_query_literal() {
    let option = SignatureOption::new(
        "iwop-access-id",
        "123456",
        Method::GET,
        Url::parse("https://gateway.example.com/api/v1/items?page=1").unwrap(),
    );

    let info = generate_signature(Some("query"), &option, Some(Duration::from_secs(60))).unwrap();
    assert_eq!(info.mode(), "query");

    let value = serde_json::to_value(&info).unwrap();
    assert_eq!(value["mode"], "query");
    assert_eq!(value["query"]["AccessId"], "iwop-access-id");
    assert!(value["query"]["Expires"].is_i64());
    assert_eq!(value["query"]["Signature"], value["signed"]["signature"]);
}

#[test]
fn test_generate_signature_rejects_empty_credential() {
    let option = SignatureOption::new(
        "",
        "123456",
        Method::GET,
        Url::parse("https://gateway.example.com/").unwrap(),
    );

    let err = generate_signature(Some("query"), &option, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
}
