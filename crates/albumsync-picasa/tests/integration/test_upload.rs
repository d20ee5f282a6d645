//! Integration tests for photo uploads
//!
//! Verifies the request shape (method, path, headers, body) and that every
//! answered status is reported back in the receipt.

use albumsync_core::domain::CanonicalToken;
use albumsync_core::ports::local_directory::FileContent;
use albumsync_picasa::upload::upload_photo;
use chrono::NaiveDate;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn slug() -> CanonicalToken {
    let modified = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 5, 7)
        .unwrap();
    CanonicalToken::derive("IMG_0001", &modified)
}

#[tokio::test]
async fn test_upload_sends_expected_request() {
    let (server, client) = common::setup_album_mock().await;
    let data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    Mock::given(method("POST"))
        .and(path(common::album_path()))
        .and(header("Content-Type", "image/jpeg"))
        .and(header("Slug", "IMG_0001_2024_03_09_14_05_07"))
        .and(header("Authorization", "Bearer test-access-token"))
        .and(body_bytes(data.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let content = common::file_content(&data);
    let receipt = upload_photo(&client, &common::album_path(), &slug(), "image/jpeg", content)
        .await
        .expect("upload failed");

    assert_eq!(receipt.status, 201);
    assert!(receipt.is_success());
}

#[tokio::test]
async fn test_upload_streams_file_from_disk() {
    let (server, client) = common::setup_album_mock().await;
    let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("IMG_0001.JPG");
    std::fs::write(&photo, &data).unwrap();

    Mock::given(method("POST"))
        .and(path(common::album_path()))
        .and(header("Content-Length", data.len().to_string().as_str()))
        .and(body_bytes(data.clone()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let file = tokio::fs::File::open(&photo).await.unwrap();
    let content = FileContent {
        len: data.len() as u64,
        reader: Box::new(file),
    };

    let receipt = upload_photo(&client, &common::album_path(), &slug(), "image/jpeg", content)
        .await
        .expect("upload failed");
    assert_eq!(receipt.status, 201);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("transfer-encoding").is_none());
}

#[tokio::test]
async fn test_upload_reports_error_status() {
    let (server, client) = common::setup_album_mock().await;

    Mock::given(method("POST"))
        .and(path(common::album_path()))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let receipt = upload_photo(
        &client,
        &common::album_path(),
        &slug(),
        "image/jpeg",
        common::file_content(b"jpeg"),
    )
    .await
    .expect("an answered upload is not a transport error");

    assert_eq!(receipt.status, 403);
    assert!(!receipt.is_success());
}

#[tokio::test]
async fn test_upload_empty_file() {
    let (server, client) = common::setup_album_mock().await;

    Mock::given(method("POST"))
        .and(path(common::album_path()))
        .and(header("Content-Length", "0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let content = common::file_content(&[]);
    let receipt = upload_photo(&client, &common::album_path(), &slug(), "image/jpeg", content)
        .await
        .expect("upload failed");
    assert_eq!(receipt.status, 201);
}

#[tokio::test]
async fn test_upload_unreachable_server() {
    let client =
        albumsync_picasa::client::PicasaClient::with_base_url("token", "http://127.0.0.1:1");

    let result = upload_photo(
        &client,
        &common::album_path(),
        &slug(),
        "image/jpeg",
        common::file_content(b"jpeg"),
    )
    .await;

    assert!(result.is_err());
}
