//! Integration tests for PicasaAlbumProvider
//!
//! Drives the provider through the IAlbumProvider port against a mock feed.

use albumsync_core::domain::{CanonicalToken, MatchMode};
use albumsync_core::ports::album_provider::IAlbumProvider;
use albumsync_picasa::provider::PicasaAlbumProvider;
use chrono::NaiveDate;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_provider_lists_and_uploads() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing(&server, common::album_feed(&["holiday_a_2024_01_01_00_00_00"])).await;

    Mock::given(method("POST"))
        .and(path(common::album_path()))
        .and(header("Slug", "b_2024_01_02_00_00_00"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let provider = PicasaAlbumProvider::new(client, common::USER_ID, common::ALBUM_ID)
        .with_match_mode(MatchMode::Substring)
        .with_buffer_size(128);

    let titles = provider.list_titles().await.expect("list_titles failed");
    assert!(titles.contains("a_2024_01_01_00_00_00"));
    assert!(!titles.contains("b_2024_01_02_00_00_00"));

    let modified = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let token = CanonicalToken::derive("b", &modified);
    let receipt = provider
        .upload_photo(&token, "image/jpeg", common::file_content(b"data"))
        .await
        .expect("upload_photo failed");
    assert_eq!(receipt.status, 201);
}

#[tokio::test]
async fn test_provider_exact_mode_rejects_partial_titles() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing(&server, common::album_feed(&["holiday_a_2024_01_01_00_00_00"])).await;

    let provider = PicasaAlbumProvider::new(client, common::USER_ID, common::ALBUM_ID)
        .with_match_mode(MatchMode::Exact);

    let titles = provider.list_titles().await.expect("list_titles failed");
    assert!(!titles.contains("a_2024_01_01_00_00_00"));
    assert!(titles.contains("holiday_a_2024_01_01_00_00_00"));
}

#[tokio::test]
async fn test_provider_propagates_listing_errors() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing_status(&server, 503).await;

    let provider = PicasaAlbumProvider::new(client, common::USER_ID, common::ALBUM_ID);
    assert!(provider.list_titles().await.is_err());
}
