use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use httpmock::prelude::*;
use serde_json::json;

use species_marker::app::{App, ProgressEvent, ProgressSink};
use species_marker::config::{Config, ConfigLoader, Settings};
use species_marker::domain::NormalizedName;
use species_marker::error::MarkerError;
use species_marker::phylopic::{PhylopicClient, PhylopicHttpClient};
use species_marker::store::Store;

const INDEX_MEDIA_TYPE: &str = "application/vnd.phylopic.v2+json";

struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

fn settings_for(server: &MockServer, output_dir: &str) -> Settings {
    ConfigLoader::resolve_config(Config {
        output_dir: Some(output_dir.to_string()),
        api_base_url: Some(server.base_url()),
        image_base_url: Some(server.base_url()),
        ..Config::default()
    })
}

#[test]
fn positive_build_triggers_pinned_second_query() {
    let server = MockServer::start();
    let pinned = server.mock(|when, then| {
        when.method(GET)
            .path("/images")
            .query_param("filter_name", "bufo")
            .query_param("build", "5")
            .header("accept", INDEX_MEDIA_TYPE);
        then.status(200).json_body(json!({
            "build": 5,
            "_links": {"items": [{"href": "/images/pinned?build=5", "title": "Bufo bufo"}]}
        }));
    });
    let discovery = server.mock(|when, then| {
        when.method(GET)
            .path("/images")
            .query_param("filter_name", "bufo")
            .query_param("embed_items", "true")
            .query_param("embed_primaryImage", "true")
            .query_param("page", "0")
            .header("accept", INDEX_MEDIA_TYPE);
        then.status(200).json_body(json!({
            "build": 5,
            "_links": {"items": [{"href": "/images/stale", "title": "stale"}]}
        }));
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let items = client.search_images(&NormalizedName::new("Bufo")).unwrap();

    discovery.assert_hits(1);
    pinned.assert_hits(1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].href, "/images/pinned?build=5");
}

#[test]
fn missing_build_issues_a_single_query() {
    let server = MockServer::start();
    let index = server.mock(|when, then| {
        when.method(GET).path("/images").query_param("filter_name", "rana");
        then.status(200).json_body(json!({
            "_links": {"items": [{"href": "/images/abc", "title": "Rana"}]}
        }));
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let items = client.search_images(&NormalizedName::new("Rana")).unwrap();

    index.assert_hits(1);
    assert_eq!(items[0].title, "Rana");
}

#[test]
fn index_redirects_are_followed() {
    let server = MockServer::start();
    let moved = server.mock(|when, then| {
        when.method(GET).path("/images");
        then.status(302).header("location", "/v2/images");
    });
    let target = server.mock(|when, then| {
        when.method(GET).path("/v2/images");
        then.status(200).json_body(json!({"_links": {"items": []}}));
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let items = client.search_images(&NormalizedName::new("Rana")).unwrap();

    moved.assert_hits(1);
    target.assert_hits(1);
    assert!(items.is_empty());
}

#[test]
fn index_error_status_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images");
        then.status(503);
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let err = client.search_images(&NormalizedName::new("Rana")).unwrap_err();

    assert_matches!(err, MarkerError::Status { status: 503, .. });
}

#[test]
fn index_body_that_is_not_json_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images");
        then.status(200).body("<html>maintenance</html>");
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let err = client.search_images(&NormalizedName::new("Rana")).unwrap_err();

    assert_matches!(err, MarkerError::Decode(_));
}

#[test]
fn vector_download_sends_svg_accept_header() {
    let server = MockServer::start();
    let vector = server.mock(|when, then| {
        when.method(GET)
            .path("/images/abc/vector.svg")
            .header("accept", "image/svg+xml");
        then.status(200).body("<svg/>");
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let body = client
        .download_vector(&server.url("/images/abc/vector.svg"))
        .unwrap();

    vector.assert_hits(1);
    assert_eq!(body, b"<svg/>");
}

#[test]
fn non_ok_vector_status_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images/abc/vector.svg");
        then.status(204);
    });

    let client = PhylopicHttpClient::new(&settings_for(&server, "files")).unwrap();
    let err = client
        .download_vector(&server.url("/images/abc/vector.svg"))
        .unwrap_err();

    assert_matches!(err, MarkerError::Status { status: 204, .. });
}

#[test]
fn missing_vector_writes_no_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images");
        then.status(200).json_body(json!({
            "_links": {"items": [{"href": "/images/abc", "title": "Rana"}]}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/abc/vector.svg");
        then.status(404);
    });

    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("files")).unwrap();
    let settings = settings_for(&server, root.as_str());
    let client = PhylopicHttpClient::new(&settings).unwrap();
    let app = App::new(Store::new(settings.output_dir.clone()), client, settings.image_base_url);

    let report = app.make_marker("Rana", &NoopSink).unwrap();

    assert_eq!(report.markers_created(), 0);
    assert!(report.items[0].error.as_deref().unwrap().contains("404"));
    assert_eq!(fs::read_dir(root.as_std_path()).unwrap().count(), 0);
}

#[test]
fn end_to_end_marker_from_mock_server() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/images").query_param("build", "7");
        then.status(200).json_body(json!({
            "build": 7,
            "_links": {"items": [{"href": "/images/abc?build=7", "title": "Rana"}]}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/images");
        then.status(200).json_body(json!({"build": 7, "_links": {"items": []}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/images/abc/vector.svg");
        then.status(200)
            .header("content-type", "image/svg+xml")
            .body(r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M1,1"/></svg>"#);
    });

    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("files")).unwrap();
    let settings = settings_for(&server, root.as_str());
    let client = PhylopicHttpClient::new(&settings).unwrap();
    let app = App::new(Store::new(settings.output_dir.clone()), client, settings.image_base_url);

    let report = app.make_marker("Rana", &NoopSink).unwrap();

    assert_eq!(report.markers_created(), 1);
    let marker = fs::read_to_string(root.join("rana_marker.svg").as_std_path()).unwrap();
    assert!(marker.contains(r#"<path d="M1,1"/>"#));
    assert!(root.join("rana_abc.svg").as_std_path().is_file());
}
