//! Canonical keys and display labels for free-text categorical names
//! (category, item, person).
//!
//! The key decides equality and grouping. The label is presentation only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercased, trimmed form of a name. Two names are the same entity iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for CanonicalKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capitalize each whitespace-delimited token: first char upper, rest lower.
/// Runs of whitespace collapse to a single space.
pub fn display_label(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_token(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
