//! Album listing: bounded-memory title extraction from the feed body
//!
//! The body is never buffered whole. It is read in fixed-size chunks and
//! every chunk is matched together with the one before it, so a title cut
//! by a chunk boundary is still found.
//!
//! ## Window
//!
//! ```text
//! read k-1: "...<media:title type='plain'>pic1</med"
//! read k  : "ia:title>..."
//! window  : previous chunk ++ current chunk -> captures "pic1"
//! ```
//!
//! A title element spanning more than two reads is lost.

use std::sync::OnceLock;

use albumsync_core::domain::{MatchMode, RemoteIdentifierSet};
use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use regex::bytes::Regex;
use reqwest::Method;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use crate::{client::PicasaClient, PicasaError};

/// Read size used for the listing body
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Capture pattern for item titles in the album feed
pub const TITLE_PATTERN: &str = r"<media:title type='plain'>(.*?)</media:title>";

fn title_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(TITLE_PATTERN).expect("title regex must compile"))
}

// ============================================================================
// ChunkedTitleScanner
// ============================================================================

/// Incremental title extractor with a two-chunk lookback
pub struct ChunkedTitleScanner {
    pattern: Regex,
    /// Raw bytes of the previous chunk only; older history is dropped
    previous: Vec<u8>,
    titles: RemoteIdentifierSet,
}

impl ChunkedTitleScanner {
    /// Scanner using the album feed title pattern
    pub fn new(mode: MatchMode) -> Self {
        Self::with_pattern(title_regex().clone(), mode)
    }

    /// Scanner using a custom pattern; capture group 1 is the title
    pub fn with_pattern(pattern: Regex, mode: MatchMode) -> Self {
        Self {
            pattern,
            previous: Vec::new(),
            titles: RemoteIdentifierSet::new(mode),
        }
    }

    /// Feeds one chunk and returns how many new titles it revealed
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        let mut window = Vec::with_capacity(self.previous.len() + chunk.len());
        window.extend_from_slice(&self.previous);
        window.extend_from_slice(chunk);

        let mut added = 0;
        for caps in self.pattern.captures_iter(&window) {
            let Some(m) = caps.get(1) else {
                continue;
            };
            let title = String::from_utf8_lossy(m.as_bytes());
            if self.titles.insert(&*title) {
                debug!(title = %title, "Found remote title");
                added += 1;
            }
        }

        self.previous.clear();
        self.previous.extend_from_slice(chunk);
        added
    }

    /// Titles accumulated so far
    pub fn titles(&self) -> &RemoteIdentifierSet {
        &self.titles
    }

    /// Consumes the scanner and returns the accumulated titles
    pub fn finish(self) -> RemoteIdentifierSet {
        self.titles
    }
}

// ============================================================================
// scan_listing
// ============================================================================

/// Result of scanning a listing body
#[derive(Debug)]
pub struct ScanOutcome {
    /// Distinct titles found
    pub titles: RemoteIdentifierSet,
    /// Bytes read from the body, for diagnostics
    pub total_bytes: u64,
    /// Set when a read failed before end of stream
    pub read_error: Option<std::io::Error>,
}

/// Reads `reader` to the end in reads of `buffer_size` bytes and extracts titles
///
/// A zero-byte read ends the scan. A read error also ends it; the error is
/// logged and returned in [`ScanOutcome::read_error`] together with the
/// titles found before it.
pub async fn scan_listing<R>(mut reader: R, buffer_size: usize, mode: MatchMode) -> ScanOutcome
where
    R: AsyncRead + Unpin,
{
    let mut scanner = ChunkedTitleScanner::new(mode);
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total_bytes: u64 = 0;
    let mut read_error = None;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                total_bytes += n as u64;
                scanner.feed(&buf[..n]);
            }
            Err(e) => {
                warn!(error = %e, bytes_read = total_bytes, "Read response body error");
                read_error = Some(e);
                break;
            }
        }
    }

    info!(
        total_bytes,
        titles = scanner.titles().len(),
        "Album listing scanned"
    );

    ScanOutcome {
        titles: scanner.finish(),
        total_bytes,
        read_error,
    }
}

// ============================================================================
// fetch_titles
// ============================================================================

/// Fetches the album feed and scans it for titles
///
/// `GET {base}/user/{userId}/albumid/{albumId}`. A non-success status is
/// returned as a [`PicasaError`]; the body of a success is streamed through
/// [`scan_listing`].
///
/// # Errors
/// Transport failures, non-success statuses and body read failures.
pub async fn fetch_titles(
    client: &PicasaClient,
    album_path: &str,
    buffer_size: usize,
    mode: MatchMode,
) -> Result<RemoteIdentifierSet> {
    debug!(path = album_path, "Fetching album listing");

    let response = client
        .request(Method::GET, album_path)
        .send()
        .await
        .map_err(PicasaError::from)
        .context("Failed to fetch album listing")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PicasaError::from_status(status, &body))
            .context("Album listing returned error status");
    }

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);
    tokio::pin!(reader);

    let outcome = scan_listing(reader, buffer_size, mode).await;
    if let Some(source) = outcome.read_error {
        return Err(PicasaError::BodyRead {
            bytes_read: outcome.total_bytes,
            source,
        })
        .context("Album listing body was cut short");
    }

    Ok(outcome.titles)
}
