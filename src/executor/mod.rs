//! An executor runs suite passes, tracks every attempt and hands the finished
//! outcome log to the report emitters.

mod context;
pub mod engine;
pub mod interrupt;
pub mod results;
#[cfg(test)]
pub(crate) mod scripted;
pub mod suite;
pub mod tracker;

pub use context::{Context, RunResult, RunStatus};
pub use engine::{SuiteFactory, TestCase, Verdict};
pub use interrupt::Interrupt;
pub use test::ShellTest;
pub use tracker::{Policy, Tracker, Verbosity};
