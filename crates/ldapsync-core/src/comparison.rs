//! Change detection between stored rows and resolved directory values
//!
//! A user counts as changed when any resolved column differs from its stored
//! value. A column missing from the stored row is a difference too. Changed
//! users are re-sent in full: the emitted record carries every resolved
//! column plus the identifier, not just the columns that differ.

use std::collections::BTreeMap;

use crate::resolver::ResolvedAttributes;
use crate::store::StoredUserRecord;

/// One column that differs between store and directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// Store column
    pub column: String,
    /// Stored value, `None` if the column was not loaded
    pub old: Option<String>,
    /// Resolved directory value
    pub new: String,
}

/// Full set of columns to write for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    identifier: String,
    columns: BTreeMap<String, String>,
}

impl UpdateRecord {
    /// Build a record from resolved attributes, keyed by `identifier`
    #[must_use]
    pub fn new(
        identifier_column: &str,
        identifier: impl Into<String>,
        resolved: ResolvedAttributes,
    ) -> Self {
        let identifier = identifier.into();
        let mut columns = resolved;
        columns.insert(identifier_column.to_string(), identifier.clone());

        Self {
            identifier,
            columns,
        }
    }

    /// Unique external identifier of the user
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Value of a column, including the identifier column
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// All columns of the record
    #[must_use]
    pub const fn columns(&self) -> &BTreeMap<String, String> {
        &self.columns
    }
}

/// Result of comparing one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Every resolved column matches the store
    Unchanged,
    /// At least one column differs
    Changed {
        /// Record to write
        record: UpdateRecord,
        /// Columns that differ
        changes: Vec<AttributeChange>,
    },
}

impl Detection {
    /// Whether an update is needed
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Compares stored users against resolved directory values
pub struct ChangeDetector;

impl ChangeDetector {
    /// Decide whether `stored` needs an update to match `resolved`
    #[must_use]
    pub fn detect(
        identifier_column: &str,
        stored: &StoredUserRecord,
        resolved: ResolvedAttributes,
    ) -> Detection {
        let changes: Vec<AttributeChange> = resolved
            .iter()
            .filter_map(|(column, new)| {
                let old = stored.get(column);
                if old == Some(new.as_str()) {
                    return None;
                }
                Some(AttributeChange {
                    column: column.clone(),
                    old: old.map(str::to_string),
                    new: new.clone(),
                })
            })
            .collect();

        if changes.is_empty() {
            return Detection::Unchanged;
        }

        Detection::Changed {
            record: UpdateRecord::new(identifier_column, stored.identifier(), resolved),
            changes,
        }
    }
}
