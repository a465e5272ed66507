use envgen_cli::core::EnvgenError;
use envgen_cli::http::{ReqwestTransport, RequestContext};
use envgen_cli::repository::{ContentKind, RepositoryClient, client_retry_policy};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn client(server: &MockServer) -> RepositoryClient {
    RepositoryClient::new("acme", "templates-repo")
        .unwrap()
        .with_api_base(server.base_url())
        .with_raw_base(format!("{}/raw", server.base_url()))
        .with_retry_policy(
            client_retry_policy()
                .with_max_retries(2)
                .with_backoff(Duration::from_millis(1), Duration::from_millis(5), 2.0)
                .with_jitter(false),
        )
}

#[tokio::test]
async fn latest_commit_reads_the_branch_head() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/commits/main");
            then.status(200).json_body(json!({ "sha": "abc123", "commit": {} }));
        })
        .await;

    let sha = client(&server).latest_commit(&RequestContext::background()).await.unwrap();

    assert_eq!(sha, "abc123");
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn list_directory_decodes_entries() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/contents/templates");
            then.status(200).json_body(json!([
                { "name": "go-env", "path": "templates/go-env", "type": "file",
                  "download_url": "https://raw.test/go-env", "size": 10 },
                { "name": "partials", "path": "templates/partials", "type": "dir",
                  "download_url": null },
                { "name": "link", "path": "templates/link", "type": "symlink" }
            ]));
        })
        .await;

    let entries = client(&server)
        .list_directory(&RequestContext::background(), "templates")
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "go-env");
    assert_eq!(entries[0].kind, ContentKind::File);
    assert_eq!(entries[0].download_url.as_deref(), Some("https://raw.test/go-env"));
    assert_eq!(entries[1].kind, ContentKind::Directory);
    assert_eq!(entries[1].download_url, None);
    assert_eq!(entries[2].kind, ContentKind::Other);
}

#[tokio::test]
async fn download_file_is_pinned_to_the_latest_commit() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/commits/main");
            then.status(200).json_body(json!({ "sha": "deadbeef" }));
        })
        .await;
    let raw = server
        .mock_async(|when, then| {
            when.method(GET).path("/raw/acme/templates-repo/deadbeef/templates/go-env");
            then.status(200).body("package {{ config.options.go_package }}");
        })
        .await;

    let content = client(&server)
        .download_file(&RequestContext::background(), "templates/go-env")
        .await
        .unwrap();

    assert_eq!(content, "package {{ config.options.go_package }}");
    raw.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_files_report_the_status() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/nothing-here");
            then.status(404).body("Not Found");
        })
        .await;

    let url = server.url("/nothing-here");
    let err = client(&server)
        .download_from_url(&RequestContext::background(), &url)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), format!("unexpected status code: 404 (url: {url})"));
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn rate_limits_are_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/commits/main");
            then.status(429);
        })
        .await;

    let err = client(&server).latest_commit(&RequestContext::background()).await.unwrap_err();

    assert!(matches!(err, EnvgenError::UnexpectedStatus { status: 429, .. }), "{err:?}");
    mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/commits/main");
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let err = client(&server).latest_commit(&RequestContext::background()).await.unwrap_err();

    assert!(matches!(err, EnvgenError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn client_timeout_bounds_the_request() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).body("late").delay(Duration::from_secs(5));
        })
        .await;

    let url = server.url("/slow");
    let err = client(&server)
        .with_timeout(Duration::from_millis(200))
        .download_from_url(&RequestContext::background(), &url)
        .await
        .unwrap_err();

    assert!(matches!(err, EnvgenError::Timeout { .. }), "{err:?}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn cancelled_context_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/acme/templates-repo/commits/main");
            then.status(200).json_body(json!({ "sha": "abc" }));
        })
        .await;

    let ctx = RequestContext::background();
    ctx.cancel();
    let err = client(&server).latest_commit(&ctx).await.unwrap_err();

    assert!(err.is_cancelled());
    mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn retry_policy_keeps_the_http_client() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/repos/acme/templates-repo/commits/main")
                .header("x-envgen-client", "shared");
            then.status(200).json_body(json!({ "sha": "abc" }));
        })
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-envgen-client", reqwest::header::HeaderValue::from_static("shared"));
    let http = ReqwestTransport::from_client(
        reqwest::Client::builder().default_headers(headers).build().unwrap(),
    );

    let client = RepositoryClient::new("acme", "templates-repo")
        .unwrap()
        .with_api_base(server.base_url())
        .with_http(http)
        .with_retry_policy(client_retry_policy().with_max_retries(0));

    let sha = client.latest_commit(&RequestContext::background()).await.unwrap();

    assert_eq!(sha, "abc");
    mock.assert_calls_async(1).await;
}
