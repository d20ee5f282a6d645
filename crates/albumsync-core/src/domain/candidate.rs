//! Local directory entries and their canonical tokens
//!
//! A [`LocalCandidate`] is one entry of the watched directory. Its
//! [`CanonicalToken`] combines the base name with the modification time and is
//! the key used to decide whether the file already exists in the album. The
//! same token is sent as the upload title, so a file uploaded once is
//! recognised again when the album is listed on the next start.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// `strftime` layout for the timestamp part of a [`CanonicalToken`]
pub const TOKEN_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

// ============================================================================
// CanonicalToken
// ============================================================================

/// Deterministic identifier of a local file: `<stem>_<YYYY_MM_DD_HH_MM_SS>`
///
/// Depends only on the file name and its modification time, never on the
/// content, so repeated scans of an unmodified file yield the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalToken(String);

impl CanonicalToken {
    /// Builds the token from a base name (extension already removed) and
    /// the local wall-clock modification time.
    #[must_use]
    pub fn derive(stem: &str, modified: &NaiveDateTime) -> Self {
        Self(format!(
            "{}_{}",
            stem,
            modified.format(TOKEN_TIMESTAMP_FORMAT)
        ))
    }

    /// Get the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CanonicalToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CanonicalToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// LocalCandidate
// ============================================================================

/// One entry of the configured upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCandidate {
    path: PathBuf,
    file_name: String,
    /// Suffix from the last `.` of the name (inclusive), empty if none
    extension: String,
    modified: NaiveDateTime,
    is_file: bool,
}

impl LocalCandidate {
    /// Creates a candidate from a directory entry
    ///
    /// # Errors
    /// Returns [`DomainError::MissingFileName`] when the path has no final
    /// component and [`DomainError::InvalidFileName`] when the name is not
    /// valid UTF-8.
    pub fn new(
        path: impl Into<PathBuf>,
        modified: NaiveDateTime,
        is_file: bool,
    ) -> Result<Self, DomainError> {
        let path = path.into();
        let raw_name = path
            .file_name()
            .ok_or_else(|| DomainError::MissingFileName(path.display().to_string()))?;
        let file_name = raw_name
            .to_str()
            .ok_or_else(|| DomainError::InvalidFileName(raw_name.to_string_lossy().into_owned()))?
            .to_string();

        // Last-dot rule: ".hidden" has extension ".hidden" and an empty stem.
        let extension = file_name
            .rfind('.')
            .map(|idx| file_name[idx..].to_string())
            .unwrap_or_default();

        Ok(Self {
            path,
            file_name,
            extension,
            modified,
            is_file,
        })
    }

    /// Full path of the entry
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extension including the leading dot, or `""`
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name without its extension
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.file_name[..self.file_name.len() - self.extension.len()]
    }

    /// Local wall-clock modification time
    #[must_use]
    pub fn modified(&self) -> &NaiveDateTime {
        &self.modified
    }

    /// Whether the entry is a regular file
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.is_file
    }

    /// Case-sensitive comparison against an accepted suffix such as `.JPG`
    #[must_use]
    pub fn has_extension(&self, suffix: &str) -> bool {
        self.extension == suffix
    }

    /// Derives the [`CanonicalToken`] for this entry
    #[must_use]
    pub fn token(&self) -> CanonicalToken {
        CanonicalToken::derive(self.stem(), &self.modified)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_token_format() {
        let token = CanonicalToken::derive("a", &new_year());
        assert_eq!(token.as_str(), "a_2024_01_01_00_00_00");
    }

    #[test]
    fn test_token_pads_every_component() {
        let modified = NaiveDate::from_ymd_opt(2023, 9, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let token = CanonicalToken::derive("IMG_0001", &modified);
        assert_eq!(token.to_string(), "IMG_0001_2023_09_05_07_08_09");
    }

    #[test]
    fn test_candidate_splits_extension() {
        let candidate = LocalCandidate::new("/photos/a.JPG", new_year(), true).unwrap();
        assert_eq!(candidate.file_name(), "a.JPG");
        assert_eq!(candidate.extension(), ".JPG");
        assert_eq!(candidate.stem(), "a");
        assert_eq!(candidate.token().as_str(), "a_2024_01_01_00_00_00");
    }

    #[test]
    fn test_candidate_uses_last_dot() {
        let candidate = LocalCandidate::new("/photos/trip.day1.JPG", new_year(), true).unwrap();
        assert_eq!(candidate.extension(), ".JPG");
        assert_eq!(candidate.stem(), "trip.day1");
    }

    #[test]
    fn test_candidate_without_extension() {
        let candidate = LocalCandidate::new("/photos/README", new_year(), true).unwrap();
        assert_eq!(candidate.extension(), "");
        assert_eq!(candidate.stem(), "README");
        assert!(!candidate.has_extension(".JPG"));
    }

    #[test]
    fn test_candidate_dotfile_has_empty_stem() {
        let candidate = LocalCandidate::new("/photos/.JPG", new_year(), true).unwrap();
        assert_eq!(candidate.extension(), ".JPG");
        assert_eq!(candidate.stem(), "");
        assert_eq!(candidate.token().as_str(), "_2024_01_01_00_00_00");
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let upper = LocalCandidate::new("/photos/a.JPG", new_year(), true).unwrap();
        let lower = LocalCandidate::new("/photos/a.jpg", new_year(), true).unwrap();
        assert!(upper.has_extension(".JPG"));
        assert!(!lower.has_extension(".JPG"));
    }

    #[test]
    fn test_token_is_stable() {
        let first = LocalCandidate::new("/photos/a.JPG", new_year(), true).unwrap();
        let second = LocalCandidate::new("/photos/a.JPG", new_year(), true).unwrap();
        assert_eq!(first.token(), second.token());
    }

    #[test]
    fn test_candidate_rejects_path_without_name() {
        let err = LocalCandidate::new("/", new_year(), false).unwrap_err();
        assert!(matches!(err, DomainError::MissingFileName(_)));
    }
}
