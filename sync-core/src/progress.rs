//! Pull progress as a fraction of tables completed.

/// Tracks tables completed out of a known total.
///
/// A lead-in reserves units ahead of the tables, for hosts whose progress
/// bar also covers work done before the pull starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    lead_in: u32,
    total: u32,
    completed: u32,
}

impl ProgressTracker {
    /// Tracker over `total` tables.
    pub fn new(total: usize) -> Self {
        Self {
            lead_in: 0,
            total: u32::try_from(total).unwrap_or(u32::MAX),
            completed: 0,
        }
    }

    /// Reserve leading units counted as already done.
    pub fn with_lead_in(mut self, lead_in: u32) -> Self {
        self.lead_in = lead_in;
        self
    }

    /// Mark one table complete and return the new fraction.
    pub fn advance(&mut self) -> f64 {
        if self.completed < self.total {
            self.completed += 1;
        }
        self.fraction()
    }

    /// Current fraction in `[0, 1]`; 1.0 when there is nothing to do.
    pub fn fraction(&self) -> f64 {
        let denominator = u64::from(self.lead_in) + u64::from(self.total);
        if denominator == 0 {
            return 1.0;
        }
        (u64::from(self.lead_in) + u64::from(self.completed)) as f64 / denominator as f64
    }

    /// Tables marked complete.
    pub fn completed(&self) -> u32 {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_unit_per_table() {
        let mut progress = ProgressTracker::new(4);
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.advance(), 0.25);
        assert_eq!(progress.advance(), 0.5);
        progress.advance();
        assert_eq!(progress.advance(), 1.0);
    }

    #[test]
    fn lead_in_counts_as_done() {
        let mut progress = ProgressTracker::new(2).with_lead_in(3);
        assert_eq!(progress.fraction(), 0.6);
        assert_eq!(progress.advance(), 0.8);
        assert_eq!(progress.advance(), 1.0);
    }

    #[test]
    fn never_exceeds_total() {
        let mut progress = ProgressTracker::new(1);
        progress.advance();
        assert_eq!(progress.advance(), 1.0);
        assert_eq!(progress.completed(), 1);
    }

    #[test]
    fn no_tables_is_complete() {
        assert_eq!(ProgressTracker::new(0).fraction(), 1.0);
    }
}
