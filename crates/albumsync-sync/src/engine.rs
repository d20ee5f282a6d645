//! Upload decision and execution pass
//!
//! The [`UploadEngine`] walks the target directory once and uploads every
//! eligible file whose canonical token is not yet known.
//!
//! ## Pass Flow
//!
//! 1. **List**: read the target directory (failure ends the pass with `Err`)
//! 2. **Decide**: skip non-files, other extensions and known tokens
//! 3. **Upload**: open the file and stream it with its token as title
//! 4. **Record**: accepted uploads extend the known set
//!
//! Files are processed one after another; a failure on one file never stops
//! the pass.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use albumsync_core::config::UploadConfig;
use albumsync_core::domain::{CanonicalToken, LocalCandidate, RemoteIdentifierSet};
use albumsync_core::ports::album_provider::IAlbumProvider;
use albumsync_core::ports::local_directory::ILocalDirectory;

// ============================================================================
// PassOutcome
// ============================================================================

/// Summary of one pass over the target directory
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// Known identifiers, extended with this pass's accepted uploads
    pub known: RemoteIdentifierSet,
    /// Uploads recorded as done
    pub uploaded: u32,
    /// Entries not attempted (not a file, other extension, already known)
    pub skipped: u32,
    /// Entries that could not be read or whose upload did not go through
    pub failed: u32,
}

/// Why an entry is not uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Directory, socket or other non-regular entry
    NotAFile,
    /// Extension differs from the configured suffix
    ExtensionMismatch,
    /// A remote title already covers the token
    AlreadyKnown,
}

/// Outcome of the per-entry decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Upload under this token
    Upload(CanonicalToken),
    /// Leave the entry alone
    Skip(SkipReason),
}

// ============================================================================
// UploadEngine
// ============================================================================

/// Executes upload passes against one album
///
/// ## Dependencies
///
/// - `provider`: Remote album operations (listing is done by the driver)
/// - `local_directory`: Directory listing and file reads
pub struct UploadEngine {
    provider: Arc<dyn IAlbumProvider>,
    local_directory: Arc<dyn ILocalDirectory>,
    target_dir: PathBuf,
    extension: String,
    content_type: String,
    /// Record every answered upload, whatever its status
    accept_any_status: bool,
}

impl UploadEngine {
    /// Creates a new `UploadEngine`
    ///
    /// # Arguments
    /// * `provider` - Album operations (IAlbumProvider)
    /// * `local_directory` - Local directory operations (ILocalDirectory)
    /// * `config` - Upload section of the configuration
    pub fn new(
        provider: Arc<dyn IAlbumProvider>,
        local_directory: Arc<dyn ILocalDirectory>,
        config: &UploadConfig,
    ) -> Self {
        Self {
            provider,
            local_directory,
            target_dir: config.target_dir.clone(),
            extension: config.extension.clone(),
            content_type: config.content_type.clone(),
            accept_any_status: config.accept_any_status,
        }
    }

    /// Directory scanned by each pass
    pub fn target_dir(&self) -> &std::path::Path {
        &self.target_dir
    }

    /// Decides whether `candidate` needs uploading given the `known` set
    pub fn decide(&self, candidate: &LocalCandidate, known: &RemoteIdentifierSet) -> Decision {
        if !candidate.is_file() {
            return Decision::Skip(SkipReason::NotAFile);
        }
        if !candidate.has_extension(&self.extension) {
            return Decision::Skip(SkipReason::ExtensionMismatch);
        }
        let token = candidate.token();
        if known.contains(token.as_str()) {
            return Decision::Skip(SkipReason::AlreadyKnown);
        }
        Decision::Upload(token)
    }

    /// Runs one pass over the target directory
    ///
    /// # Returns
    /// A [`PassOutcome`] carrying `known` extended with the accepted uploads
    ///
    /// # Errors
    /// Returns an error only if the target directory cannot be listed
    #[tracing::instrument(skip(self, known), fields(dir = %self.target_dir.display()))]
    pub async fn run_pass(&self, known: RemoteIdentifierSet) -> Result<PassOutcome> {
        let candidates = self
            .local_directory
            .list_candidates(&self.target_dir)
            .await
            .context("Failed to list target directory")?;

        let mut outcome = PassOutcome {
            known,
            ..PassOutcome::default()
        };

        for candidate in &candidates {
            let token = match self.decide(candidate, &outcome.known) {
                Decision::Upload(token) => token,
                Decision::Skip(reason) => {
                    debug!(file = candidate.file_name(), ?reason, "Skipping entry");
                    outcome.skipped += 1;
                    continue;
                }
            };

            if self.upload_one(candidate, &token).await {
                outcome.known.insert(token.as_str());
                outcome.uploaded += 1;
            } else {
                outcome.failed += 1;
            }
        }

        if outcome.uploaded > 0 || outcome.failed > 0 {
            info!(
                uploaded = outcome.uploaded,
                skipped = outcome.skipped,
                failed = outcome.failed,
                known = outcome.known.len(),
                "Upload pass completed"
            );
        } else {
            debug!(skipped = outcome.skipped, "Nothing to upload");
        }

        Ok(outcome)
    }

    /// Opens and uploads one file; `true` when the upload is to be recorded
    async fn upload_one(&self, candidate: &LocalCandidate, token: &CanonicalToken) -> bool {
        let file = match self.local_directory.open_file(candidate.path()).await {
            Ok(file) => file,
            Err(e) => {
                warn!(file = candidate.file_name(), error = %format!("{e:#}"), "Cannot read file, skipping");
                return false;
            }
        };

        info!(file = candidate.file_name(), token = %token, size = file.len, "Uploading");

        match self
            .provider
            .upload_photo(token, &self.content_type, file)
            .await
        {
            Ok(receipt) if receipt.is_success() || self.accept_any_status => true,
            Ok(receipt) => {
                warn!(
                    file = candidate.file_name(),
                    status = receipt.status,
                    "Upload rejected, will retry next pass"
                );
                false
            }
            Err(e) => {
                warn!(file = candidate.file_name(), error = %format!("{e:#}"), "Upload failed, will retry next pass");
                false
            }
        }
    }
}
