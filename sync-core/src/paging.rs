//! Per-table pull paging state machine.
//!
//! This module decides, page by page, whether the pull loop for one table
//! keeps going. It performs no I/O: `sync-client` fetches, applies and
//! acknowledges pages and feeds the outcome back in as a [`PageEvent`].
//!
//! ```text
//!            ┌──────── Applied (full page) ────────┐
//!            ▼                                     │
//!        HasMore ──── NoChanges / partial page ──▶ Drained
//!            │
//!            └──────── Failed / Cancelled ───────▶ Errored
//! ```

/// Pages and records consumed so far for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullTally {
    /// Pages applied and acknowledged
    pub pages: u32,
    /// Change entries in those pages
    pub records: usize,
}

impl PullTally {
    fn add_page(self, records: usize) -> Self {
        Self {
            pages: self.pages.saturating_add(1),
            records: self.records.saturating_add(records),
        }
    }
}

/// Pull state of one table within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePullState {
    /// Another page should be requested.
    HasMore {
        /// Work consumed so far
        tally: PullTally,
    },
    /// The server has nothing more for this table.
    Drained {
        /// Work consumed in this run
        tally: PullTally,
    },
    /// A page could not be applied or acknowledged, or the run was cancelled.
    ///
    /// Only the failing page is discarded; earlier acknowledged pages stay counted.
    Errored {
        /// Work acknowledged before the failure
        tally: PullTally,
    },
}

/// Outcome of one page round trip, as observed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// The page carried `SyncId <= 0`.
    NoChanges,
    /// The page was applied and its SyncId acknowledged.
    Applied {
        /// Change entries in the page
        record_count: usize,
        /// `MaxPackageSize` of the page
        max_package_size: i64,
    },
    /// Validation, apply or acknowledgment failed.
    Failed,
    /// The run was cancelled before the next page.
    Cancelled,
}

impl TablePullState {
    /// Start a table's pull loop.
    pub fn new() -> Self {
        Self::HasMore {
            tally: PullTally::default(),
        }
    }

    /// Advance on the outcome of one page.
    ///
    /// Terminal states ignore further events.
    pub fn on_event(self, event: PageEvent) -> Self {
        match (self, event) {
            (Self::HasMore { tally }, PageEvent::NoChanges) => Self::Drained { tally },
            (
                Self::HasMore { tally },
                PageEvent::Applied {
                    record_count,
                    max_package_size,
                },
            ) => {
                let tally = tally.add_page(record_count);
                if page_was_full(record_count, max_package_size) {
                    Self::HasMore { tally }
                } else {
                    Self::Drained { tally }
                }
            }
            (Self::HasMore { tally }, PageEvent::Failed | PageEvent::Cancelled) => {
                Self::Errored { tally }
            }

            // Terminal
            (state, _) => state,
        }
    }

    /// Whether another page should be requested.
    pub fn wants_page(&self) -> bool {
        matches!(self, Self::HasMore { .. })
    }

    /// Whether the loop has ended, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !self.wants_page()
    }

    /// Whether the loop ended without draining the table.
    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored { .. })
    }

    /// Pages and records acknowledged so far.
    pub fn tally(&self) -> PullTally {
        match self {
            Self::HasMore { tally } | Self::Drained { tally } | Self::Errored { tally } => *tally,
        }
    }
}

impl Default for TablePullState {
    fn default() -> Self {
        Self::new()
    }
}

/// A full page suggests the server holds more for the table.
///
/// Known imprecision: an exactly full last page costs one extra round trip
/// that comes back with `SyncId <= 0`.
pub fn page_was_full(record_count: usize, max_package_size: i64) -> bool {
    max_package_size > 0
        && record_count > 0
        && i64::try_from(record_count).map_or(true, |count| count >= max_package_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(record_count: usize, max_package_size: i64) -> PageEvent {
        PageEvent::Applied {
            record_count,
            max_package_size,
        }
    }

    // ===========================================
    // Continuation Heuristic
    // ===========================================

    #[test]
    fn full_page_continues() {
        assert!(page_was_full(50, 50));
        assert!(page_was_full(51, 50));
    }

    #[test]
    fn partial_page_stops() {
        assert!(!page_was_full(49, 50));
    }

    #[test]
    fn unlimited_or_empty_page_stops() {
        assert!(!page_was_full(50, 0));
        assert!(!page_was_full(50, -1));
        assert!(!page_was_full(0, 50));
    }

    // ===========================================
    // Transitions
    // ===========================================

    #[test]
    fn new_state_wants_a_page() {
        let state = TablePullState::new();
        assert!(state.wants_page());
        assert_eq!(state.tally(), PullTally::default());
    }

    #[test]
    fn no_changes_drains_immediately() {
        let state = TablePullState::new().on_event(PageEvent::NoChanges);
        assert_eq!(
            state,
            TablePullState::Drained {
                tally: PullTally::default()
            }
        );
    }

    #[test]
    fn full_pages_accumulate_until_partial() {
        let state = TablePullState::new()
            .on_event(applied(50, 50))
            .on_event(applied(50, 50));
        assert!(state.wants_page());
        assert_eq!(state.tally().pages, 2);

        let state = state.on_event(applied(12, 50));
        assert_eq!(
            state,
            TablePullState::Drained {
                tally: PullTally {
                    pages: 3,
                    records: 112
                }
            }
        );
    }

    #[test]
    fn exactly_full_page_then_no_changes() {
        let state = TablePullState::new()
            .on_event(applied(50, 50))
            .on_event(PageEvent::NoChanges);
        assert_eq!(state.tally().records, 50);
        assert!(state.is_terminal());
    }

    #[test]
    fn failure_keeps_acknowledged_pages() {
        let state = TablePullState::new()
            .on_event(applied(50, 50))
            .on_event(PageEvent::Failed);
        assert!(state.is_errored());
        assert_eq!(
            state.tally(),
            PullTally {
                pages: 1,
                records: 50
            }
        );
    }

    #[test]
    fn failure_on_first_page_counts_nothing() {
        let state = TablePullState::new().on_event(PageEvent::Failed);
        assert!(state.is_errored());
        assert_eq!(state.tally(), PullTally::default());
    }

    #[test]
    fn cancellation_is_terminal() {
        let state = TablePullState::new()
            .on_event(applied(50, 50))
            .on_event(PageEvent::Cancelled);
        assert!(state.is_terminal());
        assert!(state.is_errored());
        assert_eq!(state.tally().pages, 1);
    }

    #[test]
    fn terminal_states_ignore_events() {
        let drained = TablePullState::new().on_event(PageEvent::NoChanges);
        assert_eq!(drained.on_event(applied(50, 50)), drained);

        let errored = TablePullState::new().on_event(PageEvent::Failed);
        assert_eq!(errored.on_event(PageEvent::NoChanges), errored);
    }
}
