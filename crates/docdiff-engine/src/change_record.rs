use crate::linear::{LinearDiff, LinearTag};

/// Running tally of kept versus changed length for one candidate pair.
///
/// Lengths are signed: a tree comparison seeds `keep_length` from the outer
/// length minus node markers, and removals may drive it below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeRecord {
    pub keep_length: i64,
    pub diff_length: i64,
    pub remove_length: i64,
    pub insert_length: i64,
}

impl ChangeRecord {
    pub fn with_keep(keep_length: i64) -> Self {
        Self {
            keep_length,
            ..Default::default()
        }
    }

    /// Charge `length` units of change. Removed units are no longer kept.
    pub fn record(&mut self, length: usize, removed: bool) {
        let length = length as i64;
        self.diff_length += length;
        if removed {
            self.keep_length -= length;
            self.remove_length += length;
        } else {
            self.insert_length += length;
        }
    }

    /// Charge every insert and delete run of a content diff.
    pub fn record_linear(&mut self, diff: &LinearDiff) {
        for op in &diff.ops {
            match op.tag {
                LinearTag::Insert => self.record(op.len(), false),
                LinearTag::Delete => self.record(op.len(), true),
                LinearTag::Equal => {}
            }
        }
    }

    /// `true` when the pair should be rejected. The comparison is strict, so
    /// `keep == threshold * diff` is still accepted.
    pub fn is_under_threshold(&self, threshold: f64) -> bool {
        (self.keep_length as f64) < threshold * self.diff_length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::LinearOp;

    #[test]
    fn record_tracks_sides() {
        let mut record = ChangeRecord::with_keep(10);
        record.record(3, true);
        record.record(2, false);
        assert_eq!(record.keep_length, 7);
        assert_eq!(record.diff_length, 5);
        assert_eq!(record.remove_length, 3);
        assert_eq!(record.insert_length, 2);
    }

    #[test]
    fn threshold_is_strict() {
        let record = ChangeRecord {
            keep_length: 2,
            diff_length: 4,
            ..Default::default()
        };
        assert!(!record.is_under_threshold(0.5));

        let record = ChangeRecord {
            keep_length: 1,
            diff_length: 4,
            ..Default::default()
        };
        assert!(record.is_under_threshold(0.5));
    }

    #[test]
    fn empty_record_is_accepted() {
        assert!(!ChangeRecord::default().is_under_threshold(0.5));
    }

    #[test]
    fn negative_keep_is_rejected() {
        let mut record = ChangeRecord::with_keep(1);
        record.record(3, true);
        assert_eq!(record.keep_length, -2);
        assert!(record.is_under_threshold(0.5));
    }

    #[test]
    fn record_linear_skips_equal_runs() {
        let diff = LinearDiff {
            ops: vec![
                LinearOp {
                    tag: LinearTag::Equal,
                    old_range: 0..2,
                    new_range: 0..2,
                },
                LinearOp {
                    tag: LinearTag::Delete,
                    old_range: 2..4,
                    new_range: 2..2,
                },
                LinearOp {
                    tag: LinearTag::Insert,
                    old_range: 4..4,
                    new_range: 2..5,
                },
            ],
            timed_out: false,
        };
        let mut record = ChangeRecord::with_keep(4);
        record.record_linear(&diff);
        assert_eq!(record.keep_length, 2);
        assert_eq!(record.diff_length, 5);
    }
}
