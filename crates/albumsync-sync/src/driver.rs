//! Retry/poll driver
//!
//! Fetches the initial album listing, retrying until it succeeds, then runs
//! upload passes separated by a fixed sleep until stopped.
//!
//! ## States
//!
//! ```text
//! FetchingInitialListing --ok--> Looping --single pass / stop--> Done
//!        |   ^                      |  ^
//!        err, sleep retry_delay     sleep poll_interval
//! ```
//!
//! The stop signal is a [`CancellationToken`] observed during every sleep,
//! while the listing request is in flight, and before each pass. A pass
//! that has started is always finished.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use albumsync_core::config::SyncConfig;
use albumsync_core::domain::RemoteIdentifierSet;
use albumsync_core::ports::album_provider::IAlbumProvider;

use crate::engine::UploadEngine;

/// Where the driver is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for a successful album listing
    FetchingInitialListing,
    /// Running passes
    Looping,
    /// Finished; [`Driver::run`] has returned or is about to
    Done,
}

/// Timing and mode of a [`Driver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Sleep between passes
    pub poll_interval: Duration,
    /// Sleep between failed listing attempts
    pub retry_delay: Duration,
    /// Run exactly one pass and stop
    pub single_pass: bool,
}

impl DriverOptions {
    /// Options from the sync section of the configuration
    pub fn from_config(config: &SyncConfig, single_pass: bool) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            single_pass,
        }
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default(), false)
    }
}

/// Totals over the lifetime of a driver
#[derive(Debug, Clone, Default)]
pub struct DriverReport {
    /// Failed listing attempts before the first success
    pub listing_failures: u32,
    /// Completed passes
    pub passes: u64,
    /// Uploads recorded over all passes
    pub uploaded: u64,
    /// Per-file failures over all passes
    pub failed: u64,
    /// Known identifiers when the driver stopped
    pub known: RemoteIdentifierSet,
}

/// Runs the initial listing and the upload loop
pub struct Driver {
    provider: Arc<dyn IAlbumProvider>,
    engine: UploadEngine,
    options: DriverOptions,
    shutdown: CancellationToken,
    state: DriverState,
}

impl Driver {
    /// Creates a driver in [`DriverState::FetchingInitialListing`]
    pub fn new(
        provider: Arc<dyn IAlbumProvider>,
        engine: UploadEngine,
        options: DriverOptions,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            provider,
            engine,
            options,
            shutdown,
            state: DriverState::FetchingInitialListing,
        }
    }

    /// Current state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Runs until a single pass completes, the token is cancelled or a pass
    /// fails fatally
    ///
    /// # Errors
    /// Returns the error of a pass that could not list the target directory
    pub async fn run(&mut self) -> Result<DriverReport> {
        let mut report = DriverReport::default();

        info!(
            dir = %self.engine.target_dir().display(),
            poll_interval_secs = self.options.poll_interval.as_secs(),
            single_pass = self.options.single_pass,
            "Driver starting"
        );

        loop {
            match self.state {
                DriverState::FetchingInitialListing => {
                    let listing = tokio::select! {
                        result = self.provider.list_titles() => Some(result),
                        _ = self.shutdown.cancelled() => None,
                    };
                    let Some(listing) = listing else {
                        info!("Shutdown signal received while fetching listing");
                        self.state = DriverState::Done;
                        continue;
                    };

                    match listing {
                        Ok(titles) => {
                            info!(titles = titles.len(), "Album listing fetched");
                            report.known = titles;
                            self.state = DriverState::Looping;
                        }
                        Err(e) => {
                            report.listing_failures += 1;
                            warn!(
                                error = %format!("{e:#}"),
                                attempt = report.listing_failures,
                                retry_in_secs = self.options.retry_delay.as_secs(),
                                "Failed to fetch album listing, retrying"
                            );
                            if !self.sleep_or_stop(self.options.retry_delay).await {
                                self.state = DriverState::Done;
                            }
                        }
                    }
                }
                DriverState::Looping => {
                    if self.shutdown.is_cancelled() {
                        self.state = DriverState::Done;
                        continue;
                    }

                    let known = std::mem::take(&mut report.known);
                    let outcome = match self.engine.run_pass(known).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!(error = %format!("{e:#}"), "Upload pass failed");
                            self.state = DriverState::Done;
                            return Err(e);
                        }
                    };

                    report.passes += 1;
                    report.uploaded += u64::from(outcome.uploaded);
                    report.failed += u64::from(outcome.failed);
                    report.known = outcome.known;

                    if self.options.single_pass {
                        self.state = DriverState::Done;
                    } else if !self.sleep_or_stop(self.options.poll_interval).await {
                        self.state = DriverState::Done;
                    }
                }
                DriverState::Done => break,
            }
        }

        info!(
            passes = report.passes,
            uploaded = report.uploaded,
            failed = report.failed,
            "Driver stopped"
        );
        Ok(report)
    }

    /// Sleeps for `duration`; `false` if the token was cancelled first
    async fn sleep_or_stop(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.shutdown.cancelled() => {
                info!("Shutdown signal received");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::engine::tests::{at, upload_config, MockDirectory, MockProvider, UploadBehavior};

    fn driver(
        provider: &Arc<MockProvider>,
        dir: &Arc<MockDirectory>,
        single_pass: bool,
        shutdown: CancellationToken,
    ) -> Driver {
        let engine = UploadEngine::new(provider.clone(), dir.clone(), &upload_config());
        Driver::new(
            provider.clone(),
            engine,
            DriverOptions::from_config(&SyncConfig::default(), single_pass),
            shutdown,
        )
    }

    #[test]
    fn test_options_from_config() {
        let options = DriverOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.retry_delay, Duration::from_secs(5));
        assert!(!options.single_pass);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_retried_after_fixed_delay() {
        let provider = Arc::new(MockProvider::new(UploadBehavior::Status(201)).with_listing(vec![
            Err(anyhow::anyhow!("HTTP 500")),
            Err(anyhow::anyhow!("connection reset")),
            Ok(RemoteIdentifierSet::default()),
        ]));
        let dir = Arc::new(MockDirectory::new(&[]));
        let mut driver = driver(&provider, &dir, true, CancellationToken::new());

        let start = Instant::now();
        let report = driver.run().await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(provider.list_calls(), 3);
        assert_eq!(report.listing_failures, 2);
        assert_eq!(report.passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_pass_does_not_sleep() {
        let provider = Arc::new(MockProvider::new(UploadBehavior::Status(201)));
        let dir = Arc::new(MockDirectory::new(&[("a.JPG", at(1), true)]));
        let mut driver = driver(&provider, &dir, true, CancellationToken::new());

        let start = Instant::now();
        let report = driver.run().await.unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(report.passes, 1);
        assert_eq!(report.uploaded, 1);
        assert_eq!(*dir.list_calls.lock().unwrap(), 1);
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_polls_until_cancelled() {
        let shutdown = CancellationToken::new();
        let provider = Arc::new(MockProvider::new(UploadBehavior::Status(201)));
        let mut dir = MockDirectory::new(&[("a.JPG", at(1), true)]);
        let stop = shutdown.clone();
        dir.on_list = Some(Box::new(move |calls: u32| {
            if calls == 3 {
                stop.cancel();
            }
        }));
        let dir = Arc::new(dir);
        let mut driver = driver(&provider, &dir, false, shutdown);

        let start = Instant::now();
        let report = driver.run().await.unwrap();

        // Three passes, one second apart; the third sleep is cut short.
        assert_eq!(report.passes, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        // Uploaded once, known afterwards.
        assert_eq!(provider.uploaded_slugs().len(), 1);
        assert!(report.known.contains("a_2024_01_01_00_00_00"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_listing_retry() {
        let shutdown = CancellationToken::new();
        let provider = Arc::new(
            MockProvider::new(UploadBehavior::Status(201))
                .with_listing(vec![Err(anyhow::anyhow!("unreachable"))]),
        );
        let dir = Arc::new(MockDirectory::new(&[]));
        let mut driver = driver(&provider, &dir, false, shutdown.clone());

        let stop = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            stop.cancel();
        });

        let report = driver.run().await.unwrap();

        // Attempts at 0s, 5s and 10s; cancelled while waiting for 15s.
        assert_eq!(provider.list_calls(), 3);
        assert_eq!(report.passes, 0);
        assert_eq!(*dir.list_calls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let provider = Arc::new(MockProvider::new(UploadBehavior::Status(201)));
        let dir = Arc::new(MockDirectory::new(&[]));
        let mut driver = driver(&provider, &dir, false, shutdown);

        let report = driver.run().await.unwrap();
        assert_eq!(report.passes, 0);
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_directory_error_ends_driver() {
        let provider = Arc::new(MockProvider::new(UploadBehavior::Status(201)));
        let dir = Arc::new(MockDirectory::failing());
        let mut driver = driver(&provider, &dir, false, CancellationToken::new());

        assert!(driver.run().await.is_err());
        assert_eq!(driver.state(), DriverState::Done);
    }
}
