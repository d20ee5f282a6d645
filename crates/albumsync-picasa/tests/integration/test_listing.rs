//! Integration tests for the album listing
//!
//! Verifies that fetch_titles streams the feed through the chunked scanner
//! and maps error statuses.

use albumsync_core::domain::MatchMode;
use albumsync_picasa::listing::{fetch_titles, DEFAULT_BUFFER_SIZE};
use albumsync_picasa::PicasaError;

use crate::common;

#[tokio::test]
async fn test_fetch_titles_returns_all_titles() {
    let (server, client) = common::setup_album_mock().await;
    let titles = [
        "a_2024_01_01_00_00_00",
        "b_2024_01_02_10_30_00",
        "c_2024_01_03_23_59_59",
    ];
    common::mount_listing(&server, common::album_feed(&titles)).await;

    let found = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Exact,
    )
    .await
    .expect("fetch_titles failed");

    assert_eq!(found.len(), 3);
    for title in titles {
        assert!(found.contains(title), "missing {title}");
    }
}

#[tokio::test]
async fn test_fetch_titles_with_small_reads() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing(&server, common::album_feed(&["pic_2023_07_14_08_00_00"])).await;

    // The 63-byte title element cannot fit in one 80-byte read everywhere;
    // it always fits in two.
    let found = fetch_titles(&client, &common::album_path(), 80, MatchMode::Exact)
        .await
        .expect("fetch_titles failed");

    assert!(found.contains("pic_2023_07_14_08_00_00"));
}

#[tokio::test]
async fn test_fetch_titles_empty_album() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing(&server, common::album_feed(&[])).await;

    let found = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Substring,
    )
    .await
    .expect("fetch_titles failed");

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_fetch_titles_sends_bearer_token() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    let (server, client) = common::setup_album_mock().await;
    Mock::given(method("GET"))
        .and(path(common::album_path()))
        .and(header("Authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::album_feed(&["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let found = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Exact,
    )
    .await
    .expect("fetch_titles failed");
    assert!(found.contains("x"));
}

#[tokio::test]
async fn test_fetch_titles_server_error() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing_status(&server, 500).await;

    let err = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Exact,
    )
    .await
    .expect_err("500 must fail the listing");

    match err.downcast_ref::<PicasaError>() {
        Some(PicasaError::ServerError { status, .. }) => assert_eq!(*status, 500),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_titles_unauthorized() {
    let (server, client) = common::setup_album_mock().await;
    common::mount_listing_status(&server, 401).await;

    let err = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Exact,
    )
    .await
    .expect_err("401 must fail the listing");

    assert!(matches!(
        err.downcast_ref::<PicasaError>(),
        Some(PicasaError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_fetch_titles_unreachable_server() {
    let client =
        albumsync_picasa::client::PicasaClient::with_base_url("token", "http://127.0.0.1:1");

    let result = fetch_titles(
        &client,
        &common::album_path(),
        DEFAULT_BUFFER_SIZE,
        MatchMode::Exact,
    )
    .await;

    assert!(result.is_err());
}
