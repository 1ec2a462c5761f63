//! Unit tests for registry client

use super::*;

use futures::TryStreamExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn public_only(url: &str) -> RegistrySection {
    RegistrySection {
        public_url: url.to_string(),
        retries: 0,
        ..RegistrySection::default()
    }
}

fn with_private(public: &str, private: &str) -> RegistrySection {
    RegistrySection {
        public_url: public.to_string(),
        private_url: Some(private.to_string()),
        private_scopes: vec!["@corp".to_string()],
        retries: 0,
        ..RegistrySection::default()
    }
}

#[test]
fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.multiplier, 2.0);
}

#[test]
fn test_encode_package_name() {
    assert_eq!(encode_package_name("lodash"), "lodash");
    assert_eq!(encode_package_name("@types/node"), "@types%2Fnode");
}

#[test]
fn test_upstream_selection_by_substring() {
    let client = RegistryClient::new(&with_private("https://registry.npmjs.org", "http://npm.internal:4873")).unwrap();

    assert_eq!(client.upstream_for("@corp/widget"), Upstream::Private);
    assert_eq!(client.upstream_for("prefix-@corp-suffix"), Upstream::Private);
    assert_eq!(client.upstream_for("@other/widget"), Upstream::Public);
    assert_eq!(client.upstream_for("react"), Upstream::Public);
}

#[test]
fn test_scopes_ignored_without_private_url() {
    let section = RegistrySection {
        private_scopes: vec!["@corp".to_string()],
        ..RegistrySection::default()
    };
    let client = RegistryClient::new(&section).unwrap();
    assert_eq!(client.upstream_for("@corp/widget"), Upstream::Public);
}

#[test]
fn test_tarball_urls() {
    let client = RegistryClient::new(&with_private("https://registry.npmjs.org/", "http://npm.internal:4873")).unwrap();

    assert_eq!(
        client.tarball_url("react", "18.2.0"),
        "https://registry.npmjs.org/react/-/react-18.2.0.tgz"
    );
    assert_eq!(
        client.tarball_url("@babel/core", "7.0.0"),
        "https://registry.npmjs.org/@babel/core/-/core-7.0.0.tgz"
    );
    assert_eq!(
        client.tarball_url("@corp/widget", "1.0.0"),
        "http://npm.internal:4873/@corp/widget/-/widget-1.0.0.tgz"
    );
}

#[test]
fn test_private_full_name_tarballs_and_port_override() {
    let section = RegistrySection {
        private_port: Some(9999),
        private_tarball_naming: TarballNaming::FullName,
        ..with_private("https://registry.npmjs.org", "http://npm.internal")
    };
    let client = RegistryClient::new(&section).unwrap();

    assert_eq!(
        client.tarball_url("@corp/widget", "1.0.0"),
        "http://npm.internal:9999/@corp/widget/-/@corp/widget-1.0.0.tgz"
    );
    assert_eq!(client.package_info_url("@corp/widget"), "http://npm.internal:9999/@corp%2Fwidget");
}

#[tokio::test]
async fn test_fetch_package_info_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/left-pad"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "left-pad",
            "dist-tags": {"latest": "1.3.0"},
            "versions": {"1.3.0": {"name": "left-pad", "version": "1.3.0"}},
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RegistryClient::new(&public_only(&mock_server.uri())).unwrap();
    let info = client.fetch_package_info("left-pad").await.unwrap().unwrap();

    assert_eq!(info.dist_tags.get("latest").map(String::as_str), Some("1.3.0"));
    assert!(info.versions.contains_key("1.3.0"));
}

#[tokio::test]
async fn test_fetch_package_info_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing-package"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = RegistryClient::new(&public_only(&mock_server.uri())).unwrap();
    assert!(client.fetch_package_info("missing-package").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unexpected_status_is_soft_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RegistryClient::new(&public_only(&mock_server.uri())).unwrap();
    assert!(client.fetch_package_info("flaky").await.unwrap().is_none());
}

#[tokio::test]
async fn test_scoped_package_routed_to_private_registry() {
    let public = MockServer::start().await;
    let private = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/@corp%2Fwidget"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "@corp/widget",
            "dist-tags": {"latest": "2.0.0"},
            "versions": {"2.0.0": {}},
        })))
        .expect(1)
        .mount(&private)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&public)
        .await;

    let client = RegistryClient::new(&with_private(&public.uri(), &private.uri())).unwrap();
    let info = client.fetch_package_info("@corp/widget").await.unwrap().unwrap();
    assert_eq!(info.name.as_deref(), Some("@corp/widget"));
}

#[tokio::test]
async fn test_fetch_tarball_stream() {
    let mock_server = MockServer::start().await;
    let body = vec![0x1f, 0x8b, 0x08, 0x00, 1, 2, 3];

    Mock::given(method("GET"))
        .and(path("/left-pad/-/left-pad-1.3.0.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&mock_server)
        .await;

    let client = RegistryClient::new(&public_only(&mock_server.uri())).unwrap();
    let stream = client.fetch_tarball_stream("left-pad", "1.3.0").await.unwrap().unwrap();
    let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();

    assert_eq!(chunks.concat(), body);
}

#[tokio::test]
async fn test_missing_tarball() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/left-pad/-/left-pad-9.9.9.tgz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = RegistryClient::new(&public_only(&mock_server.uri())).unwrap();
    assert!(client.fetch_tarball_stream("left-pad", "9.9.9").await.unwrap().is_none());
}

#[tokio::test]
async fn test_transport_failure_is_an_error() {
    // Nothing listens on port 1
    let client = RegistryClient::new(&public_only("http://127.0.0.1:1")).unwrap();
    let err = client.fetch_package_info("left-pad").await.unwrap_err();
    assert!(matches!(err, CdnError::Network { .. }));
}
