//! Update batch accumulated during one pass

use crate::comparison::UpdateRecord;

/// Changed users to write in a single transaction
///
/// Built fresh for every pass and dropped once the pass ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    records: Vec<UpdateRecord>,
}

impl UpdateBatch {
    /// Create an empty batch
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record, keeping insertion order
    pub fn push(&mut self, record: UpdateRecord) {
        self.records.push(record);
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, UpdateRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a UpdateBatch {
    type Item = &'a UpdateRecord;
    type IntoIter = std::slice::Iter<'a, UpdateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
