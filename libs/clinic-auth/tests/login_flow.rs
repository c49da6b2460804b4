//! Login flow against a mock clinic backend: session filled by `LoginClient`
//! and picked up by a client built with `with_credentials`.

use std::sync::Arc;

use clinic_auth::{
    HttpClientBuilderExt, LoginClient, LoginError, RegisterRequest, SecretString,
    SessionCredential,
};
use clinic_http::HttpClient;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;

fn login_client(server: &MockServer, session: SessionCredential) -> LoginClient {
    let http = HttpClient::builder().allow_insecure_http().build().unwrap();
    let base = Url::parse(&format!("{}/api", server.base_url())).unwrap();
    LoginClient::new(http, &base, session).unwrap()
}

#[tokio::test]
async fn login_stores_token_used_by_intercepted_client() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/api/users/login")
            .json_body(json!({"email": "admin@klinik.id", "password": "secret123"}));
        then.status(200).json_body(json!({
            "token": "jwt-abc",
            "email": "admin@klinik.id",
            "role": "admin"
        }));
    });
    let patients = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients/")
            .header("authorization", "Bearer jwt-abc");
        then.status(200).json_body(json!({"data": [], "totalPages": 1}));
    });

    let session = SessionCredential::new();
    let api = HttpClient::builder()
        .allow_insecure_http()
        .with_credentials(Arc::new(session.clone()))
        .build()
        .unwrap();

    let auth = login_client(&server, session.clone());
    let logged_in = auth
        .login("admin@klinik.id", &SecretString::new("secret123"))
        .await
        .unwrap();
    assert_eq!(logged_in.role, "admin");
    assert!(session.is_authenticated());

    let url = Url::parse(&server.url("/api/patients/")).unwrap();
    let resp = api.get(url).send().await.unwrap();
    assert_eq!(resp.status(), http::StatusCode::OK);

    login.assert();
    patients.assert();
}

#[tokio::test]
async fn rejected_login_leaves_session_empty() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::POST).path("/api/users/login");
        then.status(401).json_body(json!({"error": "Invalid Password"}));
    });

    let session = SessionCredential::new();
    let auth = login_client(&server, session.clone());
    let err = auth
        .login("admin@klinik.id", &SecretString::new("wrong"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized(), "unexpected error: {err:?}");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn empty_token_is_rejected() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::POST).path("/api/users/login");
        then.status(200)
            .json_body(json!({"token": "", "email": "a@b.c", "role": "staff"}));
    });

    let auth = login_client(&server, SessionCredential::new());
    let err = auth
        .login("a@b.c", &SecretString::new("pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::EmptyToken));
}

#[tokio::test]
async fn logout_clears_session() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::POST).path("/api/users/login");
        then.status(200)
            .json_body(json!({"token": "t", "email": "a@b.c", "role": "doctor"}));
    });

    let session = SessionCredential::new();
    let auth = login_client(&server, session.clone());
    auth.login("a@b.c", &SecretString::new("pw")).await.unwrap();
    assert!(auth.session().is_authenticated());

    auth.logout();
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn register_returns_created_user() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/api/users/register")
            .json_body(json!({
                "fullName": "Budi",
                "email": "budi@klinik.id",
                "password": "pw123456",
                "role": "staff"
            }));
        then.status(201).json_body(json!({
            "message": "User Registered",
            "user": {
                "id": "staff-002-9f8e7d6c",
                "fullName": "Budi",
                "email": "budi@klinik.id",
                "role": "staff"
            }
        }));
    });

    let session = SessionCredential::new();
    let auth = login_client(&server, session.clone());
    let user = auth
        .register(&RegisterRequest {
            full_name: "Budi".to_owned(),
            email: "budi@klinik.id".to_owned(),
            password: SecretString::new("pw123456"),
            role: "staff".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "staff-002-9f8e7d6c");
    assert!(!session.is_authenticated());
    m.assert();
}
