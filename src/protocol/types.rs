use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Default cap on the number of interest tags kept from a single join.
pub const DEFAULT_MAX_INTERESTS: usize = 32;
/// Default cap on the byte length of a single interest tag.
pub const DEFAULT_MAX_INTEREST_LENGTH: usize = 64;

/// Unique identifier for a connected client, assigned by the server per connection.
pub type ClientId = Uuid;

/// The set of interest tags a client declared on its latest join.
///
/// Tags are compared verbatim. Duplicates and ordering carry no meaning, so the
/// set collapses them on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSet(BTreeSet<String>);

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tags present in both sets.
    pub fn shared_with(&self, other: &InterestSet) -> usize {
        // Walk the smaller set and probe the larger one.
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small.iter().filter(|tag| large.contains(*tag)).count()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for InterestSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Bounds applied to interest lists at the protocol edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestLimits {
    pub max_interests: usize,
    pub max_interest_length: usize,
}

impl Default for InterestLimits {
    fn default() -> Self {
        Self {
            max_interests: DEFAULT_MAX_INTERESTS,
            max_interest_length: DEFAULT_MAX_INTEREST_LENGTH,
        }
    }
}
