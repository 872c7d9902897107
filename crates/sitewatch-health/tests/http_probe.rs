//! HttpProber against a local mock server.

use std::time::Duration;

use sitewatch_core::{FailureKind, Policy, DEFAULT_SOFT_ERROR_PHRASES};
use sitewatch_health::{classify, HttpProber, ProbeError, Prober, SoftErrorMatcher, Verdict};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prober() -> HttpProber {
    let policy = Policy {
        probe_timeout: Duration::from_millis(500),
        ..Policy::default()
    };
    HttpProber::new(&policy).unwrap()
}

fn matcher() -> SoftErrorMatcher {
    SoftErrorMatcher::new(DEFAULT_SOFT_ERROR_PHRASES).unwrap()
}

const CLEAN_PAGE: &str = "<html><head><title>Welcome</title></head><body>ok</body></html>";

#[tokio::test]
async fn status_probe_uses_head() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let code = prober().status(&server.uri()).await.unwrap();
    assert_eq!(code, 204);
}

#[tokio::test]
async fn status_probe_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let code = prober()
        .status(&format!("{}/old", server.uri()))
        .await
        .unwrap();
    assert_eq!(code, 200);
}

#[tokio::test]
async fn head_section_stops_at_closing_tag() {
    let server = MockServer::start().await;
    let body = format!(
        "<html><head><title>Shop</title></HEAD><body>{}</body></html>",
        "Error 42 in footer ".repeat(100)
    );
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let head = prober().head_section(&server.uri()).await.unwrap();
    assert_eq!(head, "<html><head><title>Shop</title></HEAD>");
    assert_eq!(matcher().find(&head), None);
}

#[tokio::test]
async fn head_section_is_bounded_without_closing_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(200_000)))
        .mount(&server)
        .await;

    let policy = Policy {
        max_head_bytes: 1024,
        ..Policy::default()
    };
    let head = HttpProber::new(&policy)
        .unwrap()
        .head_section(&server.uri())
        .await
        .unwrap();
    assert_eq!(head.len(), 1024);
}

#[tokio::test]
async fn service_unavailable_title_is_a_content_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Service Unavailable</title></head><body></body></html>",
        ))
        .mount(&server)
        .await;

    let verdict = classify(&prober(), &matcher(), &server.uri()).await;
    assert_eq!(
        verdict,
        Verdict::Down {
            kind: FailureKind::ContentError,
            status_code: Some(200)
        }
    );
}

#[tokio::test]
async fn healthy_site_is_up() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CLEAN_PAGE))
        .mount(&server)
        .await;

    let verdict = classify(&prober(), &matcher(), &server.uri()).await;
    assert_eq!(verdict, Verdict::Up { status_code: 200 });
}

#[tokio::test]
async fn server_error_skips_content_probe() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CLEAN_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let verdict = classify(&prober(), &matcher(), &server.uri()).await;
    assert_eq!(
        verdict,
        Verdict::Down {
            kind: FailureKind::StatusCode,
            status_code: Some(503)
        }
    );
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = prober().status(&server.uri()).await.unwrap_err();
    assert!(matches!(err, ProbeError::Timeout(_)));
}

#[tokio::test]
async fn closed_port_is_a_transport_failure() {
    let verdict = classify(&prober(), &matcher(), "http://127.0.0.1:1/").await;
    assert_eq!(
        verdict,
        Verdict::Down {
            kind: FailureKind::TransportTimeout,
            status_code: None
        }
    );
}
