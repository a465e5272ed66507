use envgen_cli::http::{
    CancelCause, ReqwestTransport, RequestContext, RetryTransport, Transport, TransportError,
};
use httpmock::prelude::*;
use std::time::{Duration, Instant};

use super::fast_policy;

fn transport(max_retries: u32) -> RetryTransport<ReqwestTransport> {
    RetryTransport::with_policy(ReqwestTransport::new().unwrap(), fast_policy(max_retries))
}

#[tokio::test]
async fn server_errors_exhaust_retries() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/busy");
            then.status(503).body("busy");
        })
        .await;

    let request = reqwest::Client::new().get(server.url("/busy")).build().unwrap();
    let response = transport(2).send(&RequestContext::background(), request).await.unwrap();

    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "busy");
    mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn client_errors_are_returned_immediately() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;

    let request = reqwest::Client::new().get(server.url("/missing")).build().unwrap();
    let response = transport(3).send(&RequestContext::background(), request).await.unwrap();

    assert_eq!(response.status(), 404);
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn buffered_bodies_are_sent_on_every_attempt() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/submit").body("payload");
            then.status(502);
        })
        .await;

    let request =
        reqwest::Client::new().post(server.url("/submit")).body("payload").build().unwrap();
    let response = transport(2).send(&RequestContext::background(), request).await.unwrap();

    assert_eq!(response.status(), 502);
    mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn connection_failures_surface_after_retries() {
    let request = reqwest::Client::new().get("http://127.0.0.1:1/unreachable").build().unwrap();
    let err = transport(1).send(&RequestContext::background(), request).await.unwrap_err();

    assert!(matches!(err, TransportError::Request { .. }), "{err:?}");
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn deadline_aborts_a_slow_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(5));
        })
        .await;

    let transport = transport(3);
    let request = reqwest::Client::new().get(server.url("/slow")).build().unwrap();
    let ctx = RequestContext::background().with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let err = transport.send(&ctx, request).await.unwrap_err();

    assert!(matches!(err, TransportError::Cancelled(CancelCause::DeadlineExceeded)), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}
