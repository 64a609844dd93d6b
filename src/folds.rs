//! Walk-forward fold scheduling

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One train/test window pair over the feature table.
///
/// Both ranges are half-open row index ranges. The train range ends exactly
/// where the test range begins, so the model never sees a row at or past
/// its own evaluation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    /// 1-based position in the schedule
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

impl Fold {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }
}

/// Compute the fold schedule for a table of `table_len` rows.
///
/// Starting at row 0, each candidate spans `train_bars` training rows
/// followed immediately by `test_bars` test rows; the window start advances
/// by `step` (defaulting to `test_bars` when absent or zero) until the test
/// range would run past the end of the table. The schedule is empty exactly
/// when a single fold does not fit, i.e. `train_bars + test_bars >
/// table_len`.
pub fn schedule(
    table_len: usize,
    train_bars: usize,
    test_bars: usize,
    step: Option<usize>,
) -> Vec<Fold> {
    let mut folds = Vec::new();
    if train_bars == 0 || test_bars == 0 {
        return folds;
    }
    let step = step.filter(|&s| s > 0).unwrap_or(test_bars);

    let mut start = 0usize;
    loop {
        let train_end = start + train_bars;
        let test_end = train_end + test_bars;
        if test_end > table_len {
            break;
        }
        folds.push(Fold {
            index: folds.len() + 1,
            train: start..train_end,
            test: train_end..test_end,
        });
        start += step;
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_fold_plan() {
        let folds = schedule(400, 200, 50, Some(50));
        assert_eq!(folds.len(), 4);
        assert_eq!(folds[0].train, 0..200);
        assert_eq!(folds[0].test, 200..250);
        assert_eq!(folds[1].test, 250..300);
        assert_eq!(folds[2].test, 300..350);
        assert_eq!(folds[3].test, 350..400);
        assert_eq!(folds[3].index, 4);
    }

    #[test]
    fn test_step_defaults_to_test_bars() {
        let defaulted = schedule(400, 200, 50, None);
        let explicit = schedule(400, 200, 50, Some(50));
        assert_eq!(defaulted, explicit);
    }

    #[test]
    fn test_fold_invariants_hold_across_parameters() {
        for table_len in [100usize, 257, 400, 1000] {
            for train in [30usize, 100, 200] {
                for test in [10usize, 50] {
                    for step in [None, Some(10), Some(25), Some(test)] {
                        let folds = schedule(table_len, train, test, step);
                        let mut prev_start = None;
                        for fold in &folds {
                            assert_eq!(fold.train.len(), train);
                            assert_eq!(fold.test.len(), test);
                            assert_eq!(fold.train.end, fold.test.start);
                            assert!(fold.test.end <= table_len);
                            if let Some(prev) = prev_start {
                                assert!(fold.train.start > prev);
                            }
                            prev_start = Some(fold.train.start);
                        }
                        let fits = train + test <= table_len;
                        assert_eq!(!folds.is_empty(), fits);
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_when_windows_exceed_table() {
        assert!(schedule(100, 80, 30, None).is_empty());
        assert!(schedule(0, 10, 5, None).is_empty());
        assert_eq!(schedule(110, 80, 30, None).len(), 1);
    }

    #[test]
    fn test_overlap_with_small_step() {
        let folds = schedule(320, 200, 50, Some(10));
        assert_eq!(folds.len(), 8);
        assert_eq!(folds[1].train, 10..210);
        assert_eq!(folds[7].test, 270..320);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(schedule(977, 300, 60, None), schedule(977, 300, 60, None));
    }
}
