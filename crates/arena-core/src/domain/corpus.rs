//! Labeled test corpus: strings that must match and strings that must not.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::digest::ContentDigest;
use crate::domain::error::{ArenaError, ArenaResult};

/// Two ordered, duplicate-free lists of test strings.
///
/// Invariant (checked by [`Corpus::new`] and [`Corpus::validate`]): no string
/// appears in both `valid` and `invalid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

impl Corpus {
    /// Build a corpus, dropping duplicates within each side (first occurrence
    /// wins) and rejecting any overlap between the sides.
    pub fn new<V, I>(valid: V, invalid: I) -> ArenaResult<Self>
    where
        V: IntoIterator,
        V::Item: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let corpus = Self {
            valid: dedup(valid.into_iter().map(Into::into)),
            invalid: dedup(invalid.into_iter().map(Into::into)),
        };
        corpus.validate()?;
        Ok(corpus)
    }

    /// Re-establish the invariants on a corpus that arrived over the wire.
    pub fn normalize(self) -> ArenaResult<Self> {
        Self::new(self.valid, self.invalid)
    }

    /// An empty corpus (the input to the baseline challenge).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of labeled cases.
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strings labeled both valid and invalid, in `valid` order.
    pub fn overlap(&self) -> Vec<String> {
        let invalid: HashSet<&str> = self.invalid.iter().map(String::as_str).collect();
        self.valid
            .iter()
            .filter(|s| invalid.contains(s.as_str()))
            .cloned()
            .collect()
    }

    /// Check the disjointness invariant.
    pub fn validate(&self) -> ArenaResult<()> {
        let overlap = self.overlap();
        if overlap.is_empty() {
            Ok(())
        } else {
            Err(ArenaError::Corpus(format!(
                "{} string(s) labeled both valid and invalid: {:?}",
                overlap.len(),
                overlap
            )))
        }
    }

    /// Cases of `self` that are missing from `other` (either side).
    pub fn dropped_from(&self, other: &Corpus) -> Vec<String> {
        let valid: HashSet<&str> = other.valid.iter().map(String::as_str).collect();
        let invalid: HashSet<&str> = other.invalid.iter().map(String::as_str).collect();
        self.valid
            .iter()
            .filter(|s| !valid.contains(s.as_str()))
            .chain(self.invalid.iter().filter(|s| !invalid.contains(s.as_str())))
            .cloned()
            .collect()
    }

    /// Digest of the corpus contents.
    pub fn digest(&self) -> ArenaResult<ContentDigest> {
        ContentDigest::of(self)
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|s| seen.insert(s.clone())).collect()
}
