//! Integration tests for albumsync-picasa
//!
//! Uses wiremock to simulate the album feed API and verifies end-to-end
//! behavior of the listing scanner, photo uploads and the album provider.

mod common;

mod test_listing;
mod test_provider;
mod test_upload;
