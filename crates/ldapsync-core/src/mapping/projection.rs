//! Fixed projection from intermediate keys to store columns

use super::keys;

/// Intermediate key to store column, plus the store's identifier column
///
/// Intermediate keys without an entry are resolved but never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    columns: &'static [(&'static str, &'static str)],
    identifier_column: &'static str,
}

impl Projection {
    /// Greenlight `users` table
    pub const GREENLIGHT: Self = Self::new(
        &[
            (keys::NAME, "name"),
            (keys::EMAIL, "email"),
            (keys::NICKNAME, "username"),
            (keys::IMAGE, "image"),
        ],
        "external_id",
    );

    /// Create a projection from `(intermediate key, column)` pairs
    #[must_use]
    pub const fn new(
        columns: &'static [(&'static str, &'static str)],
        identifier_column: &'static str,
    ) -> Self {
        Self {
            columns,
            identifier_column,
        }
    }

    /// Store column for an intermediate key, if projected
    #[must_use]
    pub fn column_for(&self, key: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, column)| *column)
    }

    /// All projected store columns, in declaration order
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(_, column)| *column)
    }

    /// Column holding the unique external identifier
    #[must_use]
    pub const fn identifier_column(&self) -> &'static str {
        self.identifier_column
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::GREENLIGHT
    }
}
