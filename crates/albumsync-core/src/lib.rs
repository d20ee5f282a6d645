//! albumsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `CanonicalToken`, `LocalCandidate`, `RemoteIdentifierSet`
//! - **Port definitions** - Traits for adapters: `IAlbumProvider`, `ILocalDirectory`
//! - **Configuration** - The YAML settings shared by every component
//!
//! # Architecture
//!
//! The domain module contains pure reconciliation logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod ports;
