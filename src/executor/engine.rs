//! The contract between soak and the code that actually runs tests.
use super::{interrupt::Interrupt, results::TestId, tracker::{Attempt, Tracker}};
use crate::{capture::Capture, errors::SoakError};
use tracing::warn;

/// What a single attempt of a test reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// Assertion mismatch. Contains the failure trace.
    Fail(String),
    /// Unhandled fault inside the test. Contains the error trace.
    Error(String),
    /// The test excluded itself. Contains the reason.
    Skip(String),
    /// The attempt was cut short by the interruption signal.
    Interrupted,
}

/// A runnable test.
///
/// `run` may be called several times on the same value when the test is
/// retried within a pass. An `Err` is a harness fault: it is not attributed
/// to the test and stops the run.
pub trait TestCase {
    fn id(&self) -> &TestId;

    /// Run one attempt. Everything the test prints goes to `capture`.
    fn run(&mut self, capture: &mut Capture) -> Result<Verdict, SoakError>;
}

/// Builds a fresh set of tests for every suite pass so that no state leaks
/// from one pass into the next.
pub trait SuiteFactory {
    fn build(&self) -> Result<Vec<Box<dyn TestCase>>, SoakError>;
}

impl<F> SuiteFactory for F
where
    F: Fn() -> Result<Vec<Box<dyn TestCase>>, SoakError>,
{
    fn build(&self) -> Result<Vec<Box<dyn TestCase>>, SoakError> {
        self()
    }
}

/// How a suite pass ended.
#[derive(Debug)]
pub enum PassEnd {
    /// Every test ran.
    Completed,
    /// Stop-on-failure cut the pass short.
    Halted,
    /// The interruption signal arrived.
    Interrupted,
    /// A harness fault stopped the pass.
    Fault(SoakError),
}

/// Run every test of one pass in order, feeding lifecycle events to
/// `tracker`.
pub fn run_pass(
    tests: Vec<Box<dyn TestCase>>,
    tracker: &mut Tracker,
    interrupt: &Interrupt,
) -> PassEnd {
    for mut test in tests {
        if interrupt.is_triggered() {
            return PassEnd::Interrupted;
        }
        if tracker.should_stop() {
            warn!("Skipping {} and the rest of the pass", test.id());
            return PassEnd::Halted;
        }
        match tracker.execute(test.as_mut(), interrupt) {
            Ok(Attempt::Finished) => {}
            Ok(Attempt::Interrupted) => return PassEnd::Interrupted,
            Err(err) => return PassEnd::Fault(err),
        }
    }
    if tracker.should_stop() {
        PassEnd::Halted
    } else {
        PassEnd::Completed
    }
}
