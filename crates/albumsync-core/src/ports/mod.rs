//! Port definitions (hexagonal architecture)
//!
//! Traits implemented by the adapter crates:
//! - [`album_provider`] - Remote album listing and photo upload
//! - [`local_directory`] - Enumeration of the upload directory and opening of its files

pub mod album_provider;
pub mod local_directory;
