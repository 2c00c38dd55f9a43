//! HTTP contract tests for `HttpDirectoryClient` against a mock upload API.
//!
//! Verifies request shapes (paths, auth header, multipart fields, JSON
//! bodies) and the status → error mapping.

use std::sync::{Arc, Mutex};

use gallery_client::{ClientConfig, HttpDirectoryClient};
use gallery_core::{CategoryStore, Error, FileDirectory, OrderStore, SourceFile};
use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-upload-key";

fn client_for(server: &MockServer) -> HttpDirectoryClient {
    let config = ClientConfig::new(server.uri()).with_api_key(KEY);
    HttpDirectoryClient::new(config).expect("Failed to create client")
}

#[tokio::test]
async fn test_list_files_sends_auth_and_normalizes_records() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "files": [
            {
                "key": "gallery/one.jpg",
                "url": "https://cdn.test/gallery/one.jpg",
                "size": 100,
                "uploaded": "2026-03-01T12:00:00Z",
                "categories": ["Library"],
                "originalName": "one.jpg"
            },
            {
                "key": "gallery/two.jpg",
                "url": "https://cdn.test/gallery/two.jpg",
                "thumbnailUrl": "https://cdn.test/thumbs/two.jpg",
                "size": 200,
                "uploaded": "2026-03-02T12:00:00Z",
                "categories": [],
                "originalName": "two.jpg"
            }
        ],
        "count": 2
    });

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("X-Upload-Key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let files = client_for(&server).list_files().await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].key, "gallery/one.jpg");
    assert_eq!(files[0].thumbnail_url, "https://cdn.test/gallery/one.jpg");
    assert_eq!(files[1].thumbnail_url, "https://cdn.test/thumbs/two.jpg");
    assert!(files.iter().all(|f| !f.is_immutable));
}

#[tokio::test]
async fn test_upload_sends_multipart_and_reports_progress() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("X-Upload-Key", KEY))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"cat.png\""))
        .and(body_string_contains("name=\"categories\""))
        .and(body_string_contains("[\"Travel\",\"Pets\"]"))
        .and(body_string_contains("cat-image-payload"))
        .and(header_exists("content-length"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "key": "gallery/cat.png",
            "url": "https://cdn.test/gallery/cat.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let on_progress = move |p: u8| sink.lock().unwrap().push(p);

    let file = SourceFile::new("cat.png", "image/png", &b"cat-image-payload"[..]);
    let categories = vec!["Travel".to_string(), "Pets".to_string()];
    let receipt = client_for(&server)
        .upload_one(&file, &categories, &on_progress)
        .await
        .unwrap();

    assert_eq!(receipt.key, "gallery/cat.png");
    assert_eq!(receipt.url, "https://cdn.test/gallery/cat.png");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]), "progress {:?}", seen);
}

#[tokio::test]
async fn test_upload_without_categories_uses_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("[\"Library\"]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "key": "k",
            "url": "u"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = SourceFile::new("a.png", "image/png", vec![1u8]);
    client_for(&server)
        .upload_one(&file, &[], &|_| {})
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_failure_surfaces_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "disk full"})),
        )
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let on_progress = move |p: u8| sink.lock().unwrap().push(p);

    let file = SourceFile::new("a.png", "image/png", vec![1u8]);
    let err = client_for(&server)
        .upload_one(&file, &[], &on_progress)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "disk full");
    assert!(!seen.lock().unwrap().contains(&100));
}

#[tokio::test]
async fn test_error_without_body_uses_status_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server).list_files().await.unwrap_err();
    assert_eq!(err.to_string(), "List files failed with status 502");
}

#[tokio::test]
async fn test_list_files_accepts_null_categories() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "files": [
            {
                "key": "gallery/a.jpg",
                "url": "https://cdn.test/gallery/a.jpg",
                "size": 10,
                "categories": null
            },
            {
                "key": "gallery/b.jpg",
                "url": "https://cdn.test/gallery/b.jpg",
                "size": 20,
                "categories": ["Travel"]
            }
        ],
        "count": 2
    });

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let files = client_for(&server).list_files().await.unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0].categories.is_empty());
    assert_eq!(files[1].categories, vec!["Travel"]);
}

#[tokio::test]
async fn test_list_files_accepts_null_file_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": null, "count": 0})),
        )
        .mount(&server)
        .await;

    let files = client_for(&server).list_files().await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_malformed_listing_is_serialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_files().await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
    assert!(err.to_string().contains("Failed to parse List files response"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_delete_encodes_key_segments() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/files/gallery/my%20photo.jpg"))
        .and(header("X-Upload-Key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_file("gallery/my photo.jpg")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_file_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "File not found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).delete_file("gone.jpg").await.unwrap_err();
    match err {
        Error::NotFound(msg) => assert_eq!(msg, "File not found"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_key_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/gallery-order"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Unauthorized"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .save_persisted_order(&["a".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn test_gallery_order_get_and_put() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gallery-order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "order": ["b", "a"]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/gallery-order"))
        .and(body_json(serde_json::json!({"order": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.get_persisted_order().await.unwrap(), vec!["b", "a"]);
    client
        .save_persisted_order(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_category_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "categories": [{"id": "1", "title": "Library", "isDefault": true}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/categories"))
        .and(body_json(serde_json::json!({"title": "Library"})))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(serde_json::json!({"error": "Category already exists"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/categories/1"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(serde_json::json!({"error": "Cannot delete default category"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/categories/order"))
        .and(body_json(serde_json::json!({"order": ["1"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "categories": [{"id": "1", "title": "Library", "isDefault": true}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);

    let cats = client.list_categories().await.unwrap();
    assert_eq!(cats.len(), 1);
    assert!(cats[0].is_default);

    let err = client.create_category("Library").await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)));

    let err = client.delete_category("1").await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let reordered = client.reorder_categories(&["1".to_string()]).await.unwrap();
    assert_eq!(reordered[0].title, "Library");
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_server_is_connectivity_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpDirectoryClient::new(ClientConfig::new(uri).with_api_key(KEY)).unwrap();
    let err = client.list_files().await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "got {:?}", err);
    assert!(err.to_string().starts_with("Cannot connect to upload server"));
    assert!(!client.health_check().await.unwrap());
}
