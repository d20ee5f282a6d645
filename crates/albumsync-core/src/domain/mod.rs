//! Domain types for album reconciliation
//!
//! - [`candidate`] - Local directory entries and the tokens derived from them
//! - [`identifiers`] - The in-memory set of titles known to exist remotely
//! - [`errors`] - Domain validation errors

pub mod candidate;
pub mod errors;
pub mod identifiers;

pub use candidate::{CanonicalToken, LocalCandidate, TOKEN_TIMESTAMP_FORMAT};
pub use errors::DomainError;
pub use identifiers::{MatchMode, RemoteIdentifierSet};
