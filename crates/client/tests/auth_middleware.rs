//! Bearer-token injection and `401` escalation through the middleware chain.

mod common;

use assert_matches::assert_matches;
use common::client_for;
use triage_client::{ClientError, ErrorKind, TokenStore};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ---------------------------------------------------------------------------
// Test: stored token is sent as a bearer header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stored_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filters/departments"))
        .and(header("authorization", "Bearer abc123"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(["Ops", "Network"]))
        .expect(1)
        .mount(&server)
        .await;

    let t = client_for(&server, Some("abc123"));
    let departments = t.client.departments().await.unwrap();

    assert_eq!(departments, vec!["Ops".to_string(), "Network".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: no token means no Authorization header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filters/priorities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(["HIGH"]))
        .mount(&server)
        .await;

    let t = client_for(&server, None);
    t.client.priorities().await.unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].headers.get("authorization").is_none(),
        "request without a stored token must not carry Authorization"
    );
}

// ---------------------------------------------------------------------------
// Test: 401 clears the token and escalates exactly once per response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_clears_token_and_escalates_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/dashboard"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let t = client_for(&server, Some("stale"));
    let err = t.client.dashboard_metrics(30).await.unwrap_err();

    assert_matches!(err, ClientError::Api { status: 401, ref body } if body == "token expired");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(t.tokens.token(), None);
    assert_eq!(t.session.calls(), 1);
    assert!(!t.client.has_token());
}

#[tokio::test]
async fn request_after_unauthorized_carries_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assignees"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let t = client_for(&server, Some("stale"));
    let _ = t.client.assignees().await;
    let _ = t.client.assignees().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_some());
    assert!(requests[1].headers.get("authorization").is_none());
    // One escalation per 401 response.
    assert_eq!(t.session.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: other failures leave the session alone
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_keeps_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analysis/bottleneck-analysis"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let t = client_for(&server, Some("good"));
    let err = t.client.bottleneck_analysis(30).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.status(), Some(500));
    assert_eq!(t.tokens.token().as_deref(), Some("good"));
    assert_eq!(t.session.calls(), 0);
}

#[tokio::test]
async fn login_and_logout_manage_the_token() {
    let server = MockServer::start().await;
    let t = client_for(&server, None);

    t.client.login("fresh").unwrap();
    assert_eq!(t.tokens.token().as_deref(), Some("fresh"));

    t.client.logout().unwrap();
    assert!(!t.client.has_token());
}
