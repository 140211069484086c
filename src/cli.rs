use crate::{errors::SoakError, executor::Policy};
use regex::Regex;
use std::path::PathBuf;
use structopt::StructOpt;

/// Options for the CLI.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "soak",
    about = "Run test suites in a loop and report every attempt."
)]
pub struct Opts {
    /// Test folder containing soak.toml.
    #[structopt(name = "TEST_DIR", parse(from_os_str))]
    pub dir: PathBuf,

    /// Number of suite passes. 0 loops until a failure or Ctrl-C.
    #[structopt(short = "l", long = "loop")]
    pub iterations: Option<u32>,

    /// Attempts per test in each pass while it keeps passing. 0 is unlimited.
    #[structopt(short, long)]
    pub repeat: Option<u32>,

    /// Verbosity: -v prints status words, -vv prints full status lines and
    /// echoes test output.
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Keep running the pass after a failing test.
    #[structopt(long)]
    pub no_fail_exit: bool,

    /// Include tests that match the regex. Matched against `<suite>:<path>`.
    #[structopt(short, long = "include")]
    pub include_filter: Option<String>,

    /// Exclude tests that match the regex. Matched against `<suite>:<path>`.
    #[structopt(short, long = "exclude")]
    pub exclude_filter: Option<String>,

    /// Print the commands of the selected tests without running them.
    #[structopt(short = "n", long)]
    pub dry_run: bool,
}

impl Opts {
    /// Apply the command-line overrides on top of `policy`.
    pub fn override_policy(&self, mut policy: Policy) -> Policy {
        if let Some(iterations) = self.iterations {
            policy.iterations = iterations;
        }
        if let Some(repeat) = self.repeat {
            policy.repeat = repeat;
        }
        if self.verbose > 0 {
            policy.verbosity = (self.verbose + 1).into();
        }
        if self.no_fail_exit {
            policy.fail_exit = false;
        }
        policy
    }

    pub fn include(&self) -> Result<Option<Regex>, SoakError> {
        compile("--include", self.include_filter.as_deref())
    }

    pub fn exclude(&self) -> Result<Option<Regex>, SoakError> {
        compile("--exclude", self.exclude_filter.as_deref())
    }
}

fn compile(flag: &str, pattern: Option<&str>) -> Result<Option<Regex>, SoakError> {
    pattern
        .map(|reg| {
            Regex::new(reg)
                .map_err(|err| SoakError::Config(format!("Invalid {} regex: {}", flag, err)))
        })
        .transpose()
}
