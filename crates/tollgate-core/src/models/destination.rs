//! Destination model
//!
//! A destination is a named group of dial prefixes ("NAT", "RET", ...).
//! Numbers are matched by longest prefix; the length of the matched prefix is
//! the match *precision* and takes part in bucket ordering.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shortest prefix tried when shrinking a dialed number
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Named set of dial prefixes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub prefixes: Vec<String>,
}

impl Destination {
    pub fn new(id: impl Into<String>, prefixes: &[&str]) -> Self {
        Self {
            id: id.into(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Length of the longest own prefix that starts `number`
    pub fn contains_prefix(&self, number: &str) -> Option<usize> {
        prefix_candidates(number)
            .find(|candidate| self.prefixes.iter().any(|p| p == candidate))
            .map(str::len)
    }
}

/// Keep only the digits of a dialed number
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Shrink-and-retry candidates for a number, longest first
///
/// Yields `number[..len]`, `number[..len - 1]` and so on down to
/// [`MIN_PREFIX_LENGTH`] characters. A number shorter than the minimum is
/// tried once as a whole.
pub fn prefix_candidates(number: &str) -> impl Iterator<Item = &str> {
    let len = number.len();
    let min = MIN_PREFIX_LENGTH.min(len).max(1);
    (min..=len)
        .rev()
        .filter(move |&i| number.is_char_boundary(i))
        .map(move |i| &number[..i])
}

/// In-memory longest-prefix index over a set of destinations
#[derive(Debug, Clone, Default)]
pub struct DestinationIndex {
    by_prefix: HashMap<String, Vec<String>>,
}

impl DestinationIndex {
    pub fn new<'a>(destinations: impl IntoIterator<Item = &'a Destination>) -> Self {
        let mut index = Self::default();
        for destination in destinations {
            index.insert(destination);
        }
        index
    }

    pub fn insert(&mut self, destination: &Destination) {
        for prefix in &destination.prefixes {
            let ids = self.by_prefix.entry(prefix.clone()).or_default();
            if !ids.contains(&destination.id) {
                ids.push(destination.id.clone());
            }
        }
    }

    /// Destination ids registered for exactly this prefix
    pub fn ids_for_prefix(&self, prefix: &str) -> &[String] {
        self.by_prefix
            .get(prefix)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Longest matching destination for a number with its precision
    pub fn resolve(&self, number: &str) -> Option<(String, usize)> {
        prefix_candidates(number).find_map(|candidate| {
            self.by_prefix
                .get(candidate)
                .and_then(|ids| ids.first())
                .map(|id| (id.clone(), candidate.len()))
        })
    }

    /// Every destination matching the number, each with its own precision
    pub fn resolve_all(&self, number: &str) -> Vec<(String, usize)> {
        let mut found: Vec<(String, usize)> = Vec::new();
        for candidate in prefix_candidates(number) {
            for id in self.ids_for_prefix(candidate) {
                if !found.iter().any(|(seen, _)| seen == id) {
                    found.push((id.clone(), candidate.len()));
                }
            }
        }
        found
    }
}
