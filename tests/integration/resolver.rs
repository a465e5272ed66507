use envgen_cli::core::EnvgenError;
use envgen_cli::http::RequestContext;
use envgen_cli::repository::{RepositoryClient, client_retry_policy};
use envgen_cli::template::{Resolver, TemplateSource};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

const LISTING_PATH: &str = "/repos/acme/tpl/contents/templates";
const COMMIT_PATH: &str = "/repos/acme/tpl/commits/main";

fn resolver(server: &MockServer) -> Resolver {
    let client = RepositoryClient::new("acme", "tpl")
        .unwrap()
        .with_api_base(server.base_url())
        .with_raw_base(format!("{}/raw", server.base_url()))
        .with_retry_policy(
            client_retry_policy()
                .with_max_retries(2)
                .with_backoff(Duration::from_millis(1), Duration::from_millis(5), 2.0)
                .with_jitter(false),
        );
    Resolver::from_client(client)
}

async fn mock_listing(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).json_body(json!([
                { "name": "go-env", "path": "templates/go-env", "type": "file" },
                { "name": "ts-env", "path": "templates/ts-env", "type": "file" },
                { "name": "shared", "path": "templates/shared", "type": "dir" }
            ]));
        })
        .await;
}

#[tokio::test]
async fn standard_templates_resolve_to_commit_pinned_urls() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    let commits = server
        .mock_async(|when, then| {
            when.method(GET).path(COMMIT_PATH);
            then.status(200).json_body(json!({ "sha": "c0ffee" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/raw/acme/tpl/c0ffee/templates/go-env");
            then.status(200).body("package {{ config.options.go_package }}\n");
        })
        .await;

    let template = resolver(&server).resolve(&RequestContext::background(), "go-env").await.unwrap();

    assert_eq!(template.source(), TemplateSource::Standard);
    assert_eq!(template.name(), "go-env");
    assert_eq!(template.content(), "package {{ config.options.go_package }}\n");
    assert_eq!(
        template.resolved_path(),
        format!("{}/raw/acme/tpl/c0ffee/templates/go-env", server.base_url())
    );
    commits.assert_calls_async(2).await;
}

#[tokio::test]
async fn urls_skip_the_listing() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/shared/go.tmpl");
            then.status(200).body("// {{ config_path }}");
        })
        .await;

    let url = server.url("/shared/go.tmpl");
    let template = resolver(&server).resolve(&RequestContext::background(), &url).await.unwrap();

    assert_eq!(template.source(), TemplateSource::Url);
    assert_eq!(template.name(), "go.tmpl");
    assert_eq!(template.resolved_path(), url);
    listing.assert_calls_async(0).await;
}

#[tokio::test]
async fn unknown_names_are_local_paths() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.tmpl");
    std::fs::write(&path, "custom").unwrap();

    let template = resolver(&server)
        .resolve(&RequestContext::background(), &path.to_string_lossy())
        .await
        .unwrap();

    assert_eq!(template.source(), TemplateSource::Local);
    assert_eq!(template.name(), "custom.tmpl");
    assert_eq!(template.content(), "custom");
}

#[tokio::test]
async fn unavailable_listing_falls_back_to_local() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET).path(LISTING_PATH);
            then.status(500);
        })
        .await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("go-env");
    std::fs::write(&path, "local copy").unwrap();

    let ctx = RequestContext::background();
    let resolver = resolver(&server);

    assert_eq!(resolver.detect_source(&ctx, "go-env").await, TemplateSource::Local);

    let template = resolver.resolve(&ctx, &path.to_string_lossy()).await.unwrap();
    assert_eq!(template.content(), "local copy");
    listing.assert_calls_async(6).await;
}

#[tokio::test]
async fn missing_standard_file_is_not_found() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(COMMIT_PATH);
            then.status(200).json_body(json!({ "sha": "c0ffee" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/raw/acme/tpl/c0ffee/templates/ts-env");
            then.status(404);
        })
        .await;

    let err = resolver(&server).resolve(&RequestContext::background(), "ts-env").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "failed to fetch standard template: ts-env");
    match err {
        EnvgenError::TemplateNotFound { origin, source, .. } => {
            assert_eq!(origin, TemplateSource::Standard);
            assert!(matches!(*source, EnvgenError::UnexpectedStatus { status: 404, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn template_names_exclude_directories() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;

    let names = resolver(&server).list_template_names(&RequestContext::background()).await.unwrap();

    assert_eq!(names, vec!["go-env", "ts-env"]);
}
