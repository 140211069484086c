//! Grouping and summarizing the outcome log.
use crate::executor::results::{Outcome, Status};
use indexmap::IndexMap;

/// Group outcomes by the test's originating group. Groups appear in the
/// order they were first seen and keep execution order internally.
pub fn sort_by_group(outcomes: &[Outcome]) -> Vec<(&str, Vec<&Outcome>)> {
    let mut groups: IndexMap<&str, Vec<&Outcome>> = IndexMap::new();
    for outcome in outcomes {
        groups
            .entry(outcome.test.group.as_str())
            .or_default()
            .push(outcome);
    }
    groups.into_iter().collect()
}

/// Totals over an outcome log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
    pub skip: usize,
    pub cancel: usize,
}

impl Summary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut summary = Summary::default();
        for outcome in outcomes {
            match outcome.status {
                Status::Pass => summary.pass += 1,
                Status::Fail => summary.fail += 1,
                Status::Error => summary.error += 1,
                Status::Skip => summary.skip += 1,
                Status::Canceled => summary.cancel += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Percentage of executed outcomes that did not fail. Canceled outcomes
    /// count as passes and skipped ones are left out. Zero when nothing ran.
    pub fn pass_rate(&self) -> u32 {
        let executed = self.total.saturating_sub(self.skip);
        if executed == 0 {
            return 0;
        }
        ((self.pass + self.cancel) as f64 / executed as f64 * 100.0).round() as u32
    }

    /// One-line description such as `ALL 5, Pass 3, Failure 1, Skip 1,
    /// Passing rate: 75%`.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("ALL {}", self.total)];
        let counted = [
            ("Pass", self.pass),
            ("Failure", self.fail),
            ("Error", self.error),
            ("Skip", self.skip),
            ("Cancel", self.cancel),
        ];
        parts.extend(
            counted
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(label, count)| format!("{} {}", label, count)),
        );
        format!("{}, Passing rate: {}%", parts.join(", "), self.pass_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::results::TestId;
    use std::time::Duration;

    fn outcome(group: &str, name: &str, status: Status) -> Outcome {
        Outcome {
            status,
            test: TestId::new(group, name),
            output: String::new(),
            detail: String::new(),
            elapsed: Duration::from_secs(1),
            iteration: 1,
        }
    }

    #[test]
    fn groups_keep_first_seen_and_execution_order() {
        let outcomes = vec![
            outcome("A", "a1", Status::Pass),
            outcome("B", "b1", Status::Pass),
            outcome("A", "a2", Status::Fail),
        ];
        let grouped = sort_by_group(&outcomes);
        let shape: Vec<(&str, Vec<&str>)> = grouped
            .iter()
            .map(|(group, items)| {
                (*group, items.iter().map(|o| o.test.name.as_str()).collect())
            })
            .collect();
        assert_eq!(shape, vec![("A", vec!["a1", "a2"]), ("B", vec!["b1"])]);
    }

    #[test]
    fn total_is_sum_of_statuses() {
        let outcomes: Vec<Outcome> = Status::ALL
            .iter()
            .chain(&[Status::Pass, Status::Skip])
            .map(|status| outcome("g", "t", *status))
            .collect();
        let summary = Summary::from_outcomes(&outcomes);
        assert_eq!(
            summary.pass + summary.fail + summary.error + summary.skip + summary.cancel,
            summary.total
        );
        assert_eq!(summary.total, 7);
    }

    #[test]
    fn pass_rate_excludes_skips() {
        let summary = Summary {
            total: 5,
            pass: 3,
            fail: 1,
            skip: 1,
            ..Summary::default()
        };
        assert_eq!(summary.pass_rate(), 75);
        assert_eq!(
            summary.describe(),
            "ALL 5, Pass 3, Failure 1, Skip 1, Passing rate: 75%"
        );
    }

    #[test]
    fn canceled_counts_as_pass() {
        let summary = Summary {
            total: 3,
            pass: 1,
            fail: 1,
            cancel: 1,
            ..Summary::default()
        };
        assert_eq!(summary.pass_rate(), 67);
    }

    #[test]
    fn pass_rate_is_zero_without_executed_tests() {
        assert_eq!(Summary::default().pass_rate(), 0);
        let only_skips = Summary {
            total: 2,
            skip: 2,
            ..Summary::default()
        };
        assert_eq!(only_skips.pass_rate(), 0);
    }

    #[test]
    fn inconsistent_counts_do_not_underflow() {
        let summary = Summary {
            total: 1,
            pass: 1,
            skip: 3,
            ..Summary::default()
        };
        assert_eq!(summary.pass_rate(), 0);
    }
}
