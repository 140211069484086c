//! Soak is a looping test harness. It runs test suites over and over, keeps
//! every attempt of every test, and renders the run as an HTML report and a
//! JUnit XML document.
//!
//! ## Installation
//!
//! To install the `soak` binary, run:
//! ```text
//! cargo install soak
//! ```
//!
//! ## Configuration
//! A soak run is described by a `soak.toml` file in the test directory.
//! Suites are declared the same way a snapshot runner declares them: input
//! paths (globs) and a command run for each of them, with `{}` replaced by the
//! path.
//! ```toml
//! ver = "0.1.0"
//!
//! [run]
//! # Suite passes. 0 loops until a failure or Ctrl-C.
//! iterations = 10
//! # Attempts per test in each pass while it keeps passing.
//! repeat = 2
//! # Stop the pass at the first FAIL or ERROR.
//! fail_exit = true
//!
//! [report]
//! title = "storage soak"
//! html = "report/report.html"
//! xml = "report/result.xml"
//!
//! [env]
//! cluster = "lab-3"
//!
//! [[tests]]
//! name = "Volume tests"
//! paths = [ "volume/*.sh" ]
//! cmd = "sh {}"
//! # (Optional) Timeout for one attempt in seconds. Defaults to 1200.
//! timeout = 120
//! ```
//!
//! ## Outcomes
//! Every attempt ends in exactly one of `PASS`, `FAIL`, `ERROR`, `SKIP` or
//! `CANCELED`:
//!   - A command exiting with 0 passes, any other exit code fails.
//!   - Timeouts and commands that cannot be started are errors.
//!   - A test with a `.skip` file next to it is skipped, with the file
//!     contents as the reason.
//!   - Ctrl-C kills the running command and records it as canceled.
//!
//! A test that passes is run again up to `repeat` times within the same pass.
//! The first FAIL or ERROR ends the run after the current pass, or right
//! away when `fail_exit` is set.
//!
//! ## Library use
//! The loop controller does not care how tests run. Anything implementing
//! [executor::TestCase] can be driven by an [executor::Context], and the
//! finished [executor::RunResult] renders through [report::emit].
pub mod aggregate;
pub mod capture;
pub mod cli;
pub mod errors;
pub mod executor;
pub mod mail;
pub mod picker;
pub mod printer;
pub mod report;
