//! Layered attribute mapping table
//!
//! # Override semantics
//!
//! The override string is a `;`-separated list of `key=value` directives.
//! - Empty segments are skipped
//! - A segment without `=` fails the whole build, no partial table is returned
//! - Only the first `=` splits, values may contain `=` themselves
//! - A directive for a known key is prepended to its sources, so the last
//!   directive listed for a key ends up most preferred
//! - A directive for an unknown key creates it with that single source

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::str::FromStr;

use super::keys;
use crate::error::MappingError;

/// Default sources per intermediate key, most preferred first
const DEFAULT_SOURCES: &[(&str, &[&str])] = &[
    (keys::UID, &["dn"]),
    (keys::NAME, &["cn", "displayName"]),
    (keys::FIRST_NAME, &["givenName"]),
    (keys::LAST_NAME, &["sn"]),
    (keys::EMAIL, &["mail", "email", "userPrincipalName"]),
    (keys::NICKNAME, &["uid", "userid", "sAMAccountName"]),
    (keys::IMAGE, &["jpegPhoto"]),
];

/// A single `key=value` override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDirective {
    /// Intermediate key
    pub key: String,
    /// Directory attribute name to prefer for `key`
    pub source: String,
}

impl OverrideDirective {
    /// Parse every non-empty directive of an override string, in order
    ///
    /// # Errors
    ///
    /// Returns an error for the first non-empty segment that has no `=`.
    /// A segment of only whitespace is not empty.
    pub fn parse_all(overrides: &str) -> Result<Vec<Self>, MappingError> {
        overrides
            .split(';')
            .filter(|segment| !segment.is_empty())
            .map(str::parse::<Self>)
            .collect()
    }
}

impl FromStr for OverrideDirective {
    type Err = MappingError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let (key, source) =
            segment
                .split_once('=')
                .ok_or_else(|| MappingError::MalformedDirective {
                    directive: segment.trim().to_string(),
                })?;

        Ok(Self {
            key: key.trim().to_string(),
            source: source.trim().to_string(),
        })
    }
}

/// Intermediate key to ordered directory attribute names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMapping {
    entries: BTreeMap<String, Vec<String>>,
}

impl AttributeMapping {
    /// The fixed default table
    #[must_use]
    pub fn defaults() -> Self {
        let entries: BTreeMap<String, Vec<String>> = DEFAULT_SOURCES
            .iter()
            .map(|(key, sources)| {
                (
                    (*key).to_string(),
                    sources.iter().map(|s| (*s).to_string()).collect(),
                )
            })
            .collect();

        Self { entries }
    }

    /// Build the table from the defaults merged with an override string
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MalformedDirective`] if any segment lacks `=`.
    pub fn build(overrides: &str) -> Result<Self, MappingError> {
        let directives = OverrideDirective::parse_all(overrides)?;

        let mut mapping = Self::defaults();
        for directive in directives {
            mapping.apply(directive);
        }

        Ok(mapping)
    }

    fn apply(&mut self, directive: OverrideDirective) {
        match self.entries.entry(directive.key) {
            Entry::Occupied(mut entry) => entry.get_mut().insert(0, directive.source),
            Entry::Vacant(entry) => {
                entry.insert(vec![directive.source]);
            }
        }
    }

    /// Ordered sources for an intermediate key
    #[must_use]
    pub fn sources(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterate `(intermediate key, sources)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, sources)| (key.as_str(), sources.as_slice()))
    }

    /// Flattened union of all source names, de-duplicated in first-seen order
    ///
    /// This is the attribute list requested from the directory.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for source in self.entries.values().flatten() {
            if !names.contains(source) {
                names.push(source.clone());
            }
        }
        names
    }

    /// Number of intermediate keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self::defaults()
    }
}
