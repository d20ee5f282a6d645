//! Photo upload into an album
//!
//! `POST {base}/user/{userId}/albumid/{albumId}` with the raw image bytes as
//! body, the media type in `Content-Type` and the item title in `Slug`.
//!
//! The file is streamed from disk with a fixed `Content-Length`; it is never
//! held in memory as a whole.

use albumsync_core::{
    domain::CanonicalToken,
    ports::{album_provider::UploadReceipt, local_directory::FileContent},
};
use anyhow::{Context, Result};
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Body, Method,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::{client::PicasaClient, PicasaError};

/// Header carrying the title of the new item
pub const SLUG_HEADER: &str = "Slug";

/// Uploads one photo and reports the HTTP status
///
/// Every answered request yields `Ok`, whatever its status; deciding what a
/// status means is left to the caller.
///
/// # Arguments
/// * `client` - The authenticated PicasaClient
/// * `album_path` - Album feed path from [`PicasaClient::album_path`]
/// * `slug` - Title for the new item
/// * `content_type` - Media type of the file
/// * `file` - Opened file; its `len` becomes the `Content-Length`
///
/// # Errors
/// Returns an error if the request could not be sent or no response arrived.
pub async fn upload_photo(
    client: &PicasaClient,
    album_path: &str,
    slug: &CanonicalToken,
    content_type: &str,
    file: FileContent,
) -> Result<UploadReceipt> {
    let size = file.len;
    debug!(slug = %slug, size, "Uploading photo");

    let response = client
        .request(Method::POST, album_path)
        .header(CONTENT_TYPE, content_type)
        .header(SLUG_HEADER, slug.as_str())
        .header(CONTENT_LENGTH, size)
        .body(Body::wrap_stream(ReaderStream::new(file.reader)))
        .send()
        .await
        .map_err(PicasaError::from)
        .with_context(|| format!("Failed to send {}", slug))?;

    let status = response.status();
    info!(slug = %slug, status = status.as_u16(), size, "Image sent");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(
            slug = %slug,
            error = %PicasaError::from_status(status, &body),
            "Upload answered with error status"
        );
    }

    Ok(UploadReceipt {
        status: status.as_u16(),
    })
}
