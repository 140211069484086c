use super::{
    engine::{TestCase, Verdict},
    interrupt::Interrupt,
    results::{hms, Counters, Outcome, Status, TestId},
};
use crate::{capture::Capture, errors::SoakError};
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Level};

/// How much the tracker logs about every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// One status character per attempt.
    Dots,
    /// The status word and the test.
    Status,
    /// Full status line plus total elapsed time. Test output is echoed.
    All,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 | 1 => Verbosity::Dots,
            2 => Verbosity::Status,
            _ => Verbosity::All,
        }
    }
}

impl Verbosity {
    /// Most detailed log level shown when `RUST_LOG` is unset. Commands and
    /// other debug lines only show at [Verbosity::All].
    pub fn log_level(self) -> Level {
        match self {
            Verbosity::Dots | Verbosity::Status => Level::INFO,
            Verbosity::All => Level::DEBUG,
        }
    }
}

/// Looping and retry policy for a run.
#[derive(Clone, Debug)]
pub struct Policy {
    /// Number of suite passes. 0 loops until a failure or an interruption.
    pub iterations: u32,
    /// Attempts per test within a pass while it keeps passing. 0 is
    /// unlimited.
    pub repeat: u32,
    /// Halt the pass on the first FAIL, ERROR or CANCELED outcome.
    pub fail_exit: bool,
    /// Cumulative time after which a test's retry loop is cut short.
    pub retry_budget: Option<Duration>,
    pub verbosity: Verbosity,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            iterations: 1,
            repeat: 1,
            fail_exit: true,
            retry_budget: None,
            verbosity: Verbosity::Status,
        }
    }
}

/// Decision taken after a passing attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry {
    /// Run the same test again.
    Again,
    /// The retry sequence is over.
    Done,
}

/// How a test's retry sequence ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    Finished,
    /// The interruption signal arrived. An in-flight attempt, if any, is
    /// left open for [Tracker::cancel].
    Interrupted,
}

/// The attempt currently running. Never part of the outcome log.
#[derive(Debug)]
struct InFlight {
    test: TestId,
    started: Instant,
}

/// State machine fed by test lifecycle events. Owns the outcome log, the
/// counters and the capture buffers.
#[derive(Debug)]
pub struct Tracker {
    policy: Policy,
    capture: Capture,
    outcomes: Vec<Outcome>,
    counters: Counters,
    in_flight: Option<InFlight>,
    /// Attempts of the current test that passed in this retry sequence.
    test_loop: u32,
    /// Current suite pass, starting at 1.
    pass: u32,
    tests_run: usize,
    stop: bool,
    run_started: Instant,
    retry_started: Option<Instant>,
}

impl Tracker {
    pub fn new(policy: Policy) -> Self {
        let capture = Capture::new(policy.verbosity == Verbosity::All);
        Self {
            policy,
            capture,
            outcomes: Vec::new(),
            counters: Counters::default(),
            in_flight: None,
            test_loop: 0,
            pass: 1,
            tests_run: 0,
            stop: false,
            run_started: Instant::now(),
            retry_started: None,
        }
    }

    /// An attempt of `test` begins.
    pub fn start(&mut self, test: &TestId) {
        info!("[START ] {} -- Loop: {}", test, self.pass);
        let now = Instant::now();
        self.retry_started.get_or_insert(now);
        self.in_flight = Some(InFlight {
            test: test.clone(),
            started: now,
        });
        self.tests_run += 1;
        self.capture.begin();
    }

    /// The in-flight attempt passed. Decides whether the test runs again.
    pub fn success(&mut self) -> Retry {
        self.finish(Status::Pass, String::new());
        self.test_loop += 1;

        let limit = self.policy.repeat;
        let within_limit = limit == 0 || limit > self.test_loop;
        let within_budget = match (self.policy.retry_budget, self.retry_started) {
            (Some(budget), Some(started)) => started.elapsed() < budget,
            _ => true,
        };
        if within_limit && within_budget {
            Retry::Again
        } else {
            if within_limit {
                info!("Retry budget exhausted after {} attempts", self.test_loop);
            }
            self.conclude();
            Retry::Done
        }
    }

    /// The in-flight attempt failed an assertion.
    pub fn failure(&mut self, detail: String) {
        if let Some(test) = self.finish(Status::Fail, detail) {
            self.conclude();
            self.halt(&test, "FAILED");
        }
    }

    /// The in-flight attempt raised an unhandled fault.
    pub fn error(&mut self, detail: String) {
        if let Some(test) = self.finish(Status::Error, detail) {
            self.conclude();
            self.halt(&test, "meet Error");
        }
    }

    /// The in-flight attempt skipped itself. Never halts the pass.
    pub fn skip(&mut self, reason: String) {
        self.finish(Status::Skip, reason);
        self.conclude();
    }

    /// Convert the in-flight attempt into CANCELED, keeping whatever output
    /// it produced so far.
    pub fn cancel(&mut self) {
        if let Some(test) = self.finish(Status::Canceled, String::new()) {
            self.conclude();
            self.halt(&test, "CANCELED");
        }
    }

    /// A harness fault stopped the run. The in-flight attempt, if any, is
    /// recorded as ERROR.
    pub fn fault(&mut self, detail: String) {
        error!("{}", detail);
        self.finish(Status::Error, detail);
        self.conclude();
        self.stop = true;
    }

    /// Run `test` through its retry sequence.
    pub fn execute(
        &mut self,
        test: &mut dyn TestCase,
        interrupt: &Interrupt,
    ) -> Result<Attempt, SoakError> {
        loop {
            self.start(test.id());
            match test.run(&mut self.capture)? {
                Verdict::Pass => {
                    if self.success() == Retry::Done {
                        return Ok(Attempt::Finished);
                    }
                    if interrupt.is_triggered() {
                        self.conclude();
                        return Ok(Attempt::Interrupted);
                    }
                }
                Verdict::Fail(detail) => {
                    self.failure(detail);
                    return Ok(Attempt::Finished);
                }
                Verdict::Error(detail) => {
                    self.error(detail);
                    return Ok(Attempt::Finished);
                }
                Verdict::Skip(reason) => {
                    self.skip(reason);
                    return Ok(Attempt::Finished);
                }
                Verdict::Interrupted => return Ok(Attempt::Interrupted),
            }
        }
    }

    /// A suite pass completed.
    pub fn next_pass(&mut self) {
        self.pass += 1;
    }

    pub fn pass(&self) -> u32 {
        self.pass
    }

    pub fn should_stop(&self) -> bool {
        self.stop
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Number of attempts started, including unfinished ones.
    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    pub fn in_flight(&self) -> Option<&TestId> {
        self.in_flight.as_ref().map(|in_flight| &in_flight.test)
    }

    /// Finalized outcome log and counters.
    pub fn into_results(self) -> (Vec<Outcome>, Counters) {
        (self.outcomes, self.counters)
    }

    /// Close the in-flight attempt with `status` and append its outcome.
    /// Returns the test, or `None` when no attempt was in flight.
    fn finish(&mut self, status: Status, detail: String) -> Option<TestId> {
        let InFlight { test, started } = self.in_flight.take()?;
        let output = self.capture.end();
        let elapsed = started.elapsed();

        self.counters.record(status);
        self.log_outcome(status, &test, elapsed);
        self.outcomes.push(Outcome {
            status,
            test: test.clone(),
            output,
            detail,
            elapsed,
            iteration: self.pass,
        });
        Some(test)
    }

    /// The test's retry sequence is over.
    fn conclude(&mut self) {
        self.test_loop = 0;
        self.retry_started = None;
    }

    fn halt(&mut self, test: &TestId, why: &str) {
        if self.policy.fail_exit {
            warn!("Stop all test because test {} {} ...", test, why);
            self.stop = true;
        }
    }

    fn log_outcome(&self, status: Status, test: &TestId, elapsed: Duration) {
        let msg = match self.policy.verbosity {
            Verbosity::All => format!(
                "[{:^6}] {} --Loop: {} --ElapsedTime: {}",
                status,
                test,
                self.pass,
                hms(elapsed)
            ),
            Verbosity::Status => format!("{} {}", status, test),
            Verbosity::Dots => status.marker().to_string(),
        };
        match status {
            Status::Pass | Status::Canceled => info!("{}", msg),
            Status::Fail | Status::Error => error!("{}", msg),
            Status::Skip => warn!("{}", msg),
        }
        if self.policy.verbosity == Verbosity::All {
            info!("Total Elapsedtime: {}", hms(self.run_started.elapsed()));
        }
    }
}
