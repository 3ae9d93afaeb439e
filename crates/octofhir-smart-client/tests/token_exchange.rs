use std::sync::OnceLock;

use octofhir_smart_client::{
    AuthError, CLIENT_ASSERTION_TYPE, LaunchContext, ServiceIdentity, SignedAssertion,
    SigningAlgorithm, TokenExchange, TokenRequestEncoding,
};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCOPE: &str = "launch system/Patient.read system/Condition.read";

fn identity() -> &'static ServiceIdentity {
    static IDENTITY: OnceLock<ServiceIdentity> = OnceLock::new();
    IDENTITY.get_or_init(|| {
        let key = RsaPrivateKey::new(&mut OsRng, 2048).expect("rsa key");
        let pem = key.to_pkcs8_pem(LineEnding::LF).expect("pem");
        ServiceIdentity::from_pem("client-123", SigningAlgorithm::RS256, &pem).expect("identity")
    })
}

fn assertion(audience: &str) -> SignedAssertion {
    identity().sign_assertion(audience).expect("signed assertion")
}

#[tokio::test]
async fn exchange_returns_access_token() {
    let server = MockServer::start().await;
    let token_url = format!("{}/oauth2/token", server.uri());
    let assertion = assertion(&token_url);

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_partial_json(json!({
            "grant_type": "client_credentials",
            "client_assertion_type": CLIENT_ASSERTION_TYPE,
            "client_assertion": assertion.as_str(),
            "scope": SCOPE,
            "launch": LaunchContext::patient("2000190").as_str(),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "X",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = TokenExchange::new(reqwest::Client::new(), &token_url, SCOPE);
    let token = exchange.exchange(&assertion, "2000190").await.unwrap();
    assert_eq!(token.secret(), "X");
}

#[tokio::test]
async fn exchange_with_form_encoding() {
    let server = MockServer::start().await;
    let token_url = format!("{}/oauth2/token", server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("launch="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "form-token" })))
        .mount(&server)
        .await;

    let exchange = TokenExchange::new(reqwest::Client::new(), &token_url, SCOPE)
        .with_encoding(TokenRequestEncoding::Form);
    let token = exchange
        .exchange(&assertion(&token_url), "2000190")
        .await
        .unwrap();
    assert_eq!(token.secret(), "form-token");
}

#[tokio::test]
async fn exchange_rejected_status_is_auth_error() {
    let server = MockServer::start().await;
    let token_url = format!("{}/oauth2/token", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let exchange = TokenExchange::new(reqwest::Client::new(), &token_url, SCOPE);
    let err = exchange
        .exchange(&assertion(&token_url), "2000190")
        .await
        .unwrap_err();
    match err {
        AuthError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid_client");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn exchange_without_access_token_field() {
    let server = MockServer::start().await;
    let token_url = format!("{}/oauth2/token", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
        .mount(&server)
        .await;

    let exchange = TokenExchange::new(reqwest::Client::new(), &token_url, SCOPE);
    let err = exchange
        .exchange(&assertion(&token_url), "2000190")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingAccessToken));
}

#[tokio::test]
async fn exchange_with_non_json_body() {
    let server = MockServer::start().await;
    let token_url = format!("{}/oauth2/token", server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let exchange = TokenExchange::new(reqwest::Client::new(), &token_url, SCOPE);
    let err = exchange
        .exchange(&assertion(&token_url), "2000190")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse { .. }));
}
