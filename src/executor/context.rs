use super::{
    engine::{self, PassEnd, SuiteFactory},
    interrupt::Interrupt,
    results::{Counters, Outcome},
    tracker::{Policy, Tracker},
};
use chrono::{DateTime, Local};
use std::{fmt, time::Duration, time::Instant};
use tracing::{error, info, warn};

/// Overall result of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Passed,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Passed => "PASSED",
            RunStatus::Failed => "FAILED",
            RunStatus::Canceled => "CANCELED",
        }
    }

    /// Prefix this status onto a report title.
    pub fn title(self, title: &str) -> String {
        format!("{}: {}", self.as_str(), title)
    }

    /// Status of a run that ended early: failed if anything failed,
    /// canceled if nothing passed.
    fn from_counters(counters: &Counters) -> Self {
        if counters.failed() > 0 {
            RunStatus::Failed
        } else if counters.success == 0 {
            RunStatus::Canceled
        } else {
            RunStatus::Passed
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Everything a finished run hands to the report emitters.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub status: RunStatus,
    pub outcomes: Vec<Outcome>,
    pub counters: Counters,
    /// Attempts started, used to detect an empty run.
    pub tests_run: usize,
    /// Suite passes that ran to completion.
    pub passes: u32,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub elapsed: Duration,
}

/// An execution context repeats whole-suite passes under the iteration
/// policy and turns interruptions and harness faults into outcomes.
pub struct Context<F> {
    factory: F,
    policy: Policy,
    interrupt: Interrupt,
}

impl<F: SuiteFactory> Context<F> {
    pub fn new(factory: F, policy: Policy, interrupt: Interrupt) -> Self {
        Self {
            factory,
            policy,
            interrupt,
        }
    }

    /// Run suite passes until the iteration limit, a failing pass, an
    /// interruption or a harness fault.
    pub fn run(self) -> RunResult {
        let started = Local::now();
        let clock = Instant::now();
        let mut tracker = Tracker::new(self.policy.clone());
        let mut passes = 0;

        let status = loop {
            if self.interrupt.is_triggered() {
                break stopped_by_user(&mut tracker);
            }

            let tests = match self.factory.build() {
                Ok(tests) => tests,
                Err(err) => {
                    tracker.fault(err.to_string());
                    break RunStatus::Failed;
                }
            };
            if tests.is_empty() {
                warn!("Suite pass {} has no tests", passes + 1);
                break RunStatus::from_counters(tracker.counters());
            }
            info!("Test Case List:");
            for test in &tests {
                info!("{}", test.id());
            }

            match engine::run_pass(tests, &mut tracker, &self.interrupt) {
                PassEnd::Completed | PassEnd::Halted => {}
                PassEnd::Interrupted => break stopped_by_user(&mut tracker),
                PassEnd::Fault(err) => {
                    error!("Unexpected fault in pass {}", tracker.pass());
                    tracker.fault(err.to_string());
                    break RunStatus::Failed;
                }
            }

            passes += 1;
            tracker.next_pass();
            if tracker.counters().failed() > 0 {
                break RunStatus::Failed;
            }
            if self.policy.iterations != 0 && passes >= self.policy.iterations {
                break RunStatus::Passed;
            }
        };

        let tests_run = tracker.tests_run();
        let (outcomes, counters) = tracker.into_results();
        RunResult {
            status,
            outcomes,
            counters,
            tests_run,
            passes,
            started,
            finished: Local::now(),
            elapsed: clock.elapsed(),
        }
    }
}

/// Cancel the in-flight attempt after an interruption.
fn stopped_by_user(tracker: &mut Tracker) -> RunStatus {
    info!("Script stopped by user --> ^C");
    let status = RunStatus::from_counters(tracker.counters());
    tracker.cancel();
    status
}
