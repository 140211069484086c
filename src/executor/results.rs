use std::{fmt, time::Duration};

/// Terminal state of one test attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The attempt succeeded.
    Pass,
    /// The test reported an assertion mismatch.
    Fail,
    /// The test raised a fault it did not handle.
    Error,
    /// The test excluded itself with a reason.
    Skip,
    /// The run was interrupted while the attempt was in flight.
    Canceled,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Pass,
        Status::Fail,
        Status::Error,
        Status::Skip,
        Status::Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
            Status::Skip => "SKIP",
            Status::Canceled => "CANCELED",
        }
    }

    /// Single character used by the terse progress output.
    pub fn marker(self) -> char {
        match self {
            Status::Pass | Status::Canceled => '.',
            Status::Fail => 'F',
            Status::Error => 'E',
            Status::Skip => 'S',
        }
    }

    /// FAIL and ERROR end a run of passes.
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Fail | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Identity of a test: the group it belongs to and its own name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestId {
    /// Originating class, module or suite. Used as the grouping key.
    pub group: String,
    /// Method or case name.
    pub name: String,
    /// Optional one-line description.
    pub description: Option<String>,
}

impl TestId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name shown in the result table: `name: description` when described.
    pub fn label(&self) -> String {
        match &self.description {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.name, desc),
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.group)
    }
}

/// Finalized record of one test attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub status: Status,
    pub test: TestId,
    /// Output captured while the attempt ran.
    pub output: String,
    /// Failure trace, error trace or skip reason.
    pub detail: String,
    pub elapsed: Duration,
    /// Suite pass the attempt belongs to, starting at 1.
    pub iteration: u32,
}

/// Per-status counts maintained by the tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub success: usize,
    pub failure: usize,
    pub error: usize,
    pub skipped: usize,
    pub canceled: usize,
}

impl Counters {
    pub(crate) fn record(&mut self, status: Status) {
        match status {
            Status::Pass => self.success += 1,
            Status::Fail => self.failure += 1,
            Status::Error => self.error += 1,
            Status::Skip => self.skipped += 1,
            Status::Canceled => self.canceled += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pass => self.success,
            Status::Fail => self.failure,
            Status::Error => self.error,
            Status::Skip => self.skipped,
            Status::Canceled => self.canceled,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failure + self.error + self.skipped + self.canceled
    }

    /// Number of FAIL and ERROR outcomes.
    pub fn failed(&self) -> usize {
        self.failure + self.error
    }
}

/// Render a duration as `HH:MM:SS`.
pub fn hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_label() {
        let id = TestId::new("volume.Create", "test_small");
        assert_eq!(id.to_string(), "test_small (volume.Create)");
        assert_eq!(id.label(), "test_small");
        let id = id.with_description("one GiB volume");
        assert_eq!(id.label(), "test_small: one GiB volume");
    }

    #[test]
    fn counters_sum_every_status() {
        let mut counters = Counters::default();
        for status in Status::ALL.iter().chain(&[Status::Pass, Status::Error]) {
            counters.record(*status);
        }
        assert_eq!(counters.total(), 7);
        assert_eq!(counters.get(Status::Pass), 2);
        assert_eq!(counters.failed(), 3);
    }

    #[test]
    fn hms_pads_every_field() {
        assert_eq!(hms(Duration::from_secs(5)), "00:00:05");
        assert_eq!(hms(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(hms(Duration::from_secs(36 * 3600)), "36:00:00");
        assert_eq!(hms(Duration::from_millis(999)), "00:00:00");
    }
}
