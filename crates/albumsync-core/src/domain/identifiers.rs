//! Reconciliation state: titles known to exist in the remote album
//!
//! The set is seeded once from the album listing and grows by one entry per
//! successful upload. It is never pruned and never persisted; every start
//! rebuilds it from the remote listing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How a token is compared against the known titles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A token is known if it occurs inside any known title.
    ///
    /// Tolerates titles the service decorated around the slug (for example
    /// an appended extension).
    #[default]
    Substring,
    /// A token is known only if a title equals it.
    Exact,
}

/// Set of remote item titles, keyed by exact text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteIdentifierSet {
    titles: BTreeSet<String>,
    mode: MatchMode,
}

impl RemoteIdentifierSet {
    /// Creates an empty set using the given match mode
    #[must_use]
    pub fn new(mode: MatchMode) -> Self {
        Self {
            titles: BTreeSet::new(),
            mode,
        }
    }

    /// The match mode used by [`contains`](Self::contains)
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns a copy of this set using a different match mode
    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether `token` is already known under the set's match mode
    pub fn contains(&self, token: &str) -> bool {
        match self.mode {
            MatchMode::Exact => self.titles.contains(token),
            MatchMode::Substring => self.titles.iter().any(|title| title.contains(token)),
        }
    }

    /// Adds a title; returns `false` if it was empty or already known
    pub fn insert(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if title.is_empty() || self.contains(&title) {
            return false;
        }
        self.titles.insert(title)
    }

    /// Number of distinct titles
    #[must_use]
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether no title is known yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Iterates titles in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }
}

impl<S: Into<String>> Extend<S> for RemoteIdentifierSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for title in iter {
            self.insert(title);
        }
    }
}
