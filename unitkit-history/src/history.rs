//! Bounded conversion history, most recent first

use std::collections::VecDeque;
use unitkit_units::ConversionResult;

use crate::ConversionRecord;

/// Number of records kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 10;

/// Append-only log of conversion records.
///
/// New records go to the front; once `capacity` is exceeded the oldest
/// record falls off the back.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionHistory {
    capacity: usize,
    records: VecDeque<ConversionRecord>,
}

impl ConversionHistory {
    /// A capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild from persisted records (most recent first); extras are dropped
    pub fn from_records(capacity: usize, records: Vec<ConversionRecord>) -> Self {
        let mut history = Self::new(capacity);
        history.records.extend(records.into_iter().take(history.capacity));
        history
    }

    /// Record a successful conversion and return the stored record
    pub fn record(&mut self, result: ConversionResult) -> &ConversionRecord {
        self.push(ConversionRecord::new(result))
    }

    pub fn push(&mut self, record: ConversionRecord) -> &ConversionRecord {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
        &self.records[0]
    }

    /// Records, most recent first
    pub fn recent(&self) -> impl Iterator<Item = &ConversionRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&ConversionRecord> {
        self.records.front()
    }

    pub fn to_vec(&self) -> Vec<ConversionRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for ConversionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
