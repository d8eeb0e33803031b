//! Ordering types for ampli-sync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier of one pull page.
///
/// A value `<= 0` means the server has nothing for the table. A positive
/// value must be acknowledged once the page has been applied locally,
/// otherwise the server delivers the same page again.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncId(i64);

impl SyncId {
    /// Create a SyncId with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this SyncId.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether the page carries changes that need acknowledgment.
    pub fn has_changes(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncId({})", self.0)
    }
}
