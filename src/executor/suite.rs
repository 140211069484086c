use super::{
    engine::{SuiteFactory, TestCase},
    interrupt::Interrupt,
    test::ShellTest,
};
use crate::errors::SoakError;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::runtime::Handle;

pub struct Config {
    /// Name of this suite. Used as the group of its tests.
    pub name: String,
    /// Command to execute. The pattern `{}` in this string is replaced with
    /// the matching path.
    pub cmd: String,
    /// Timeout for one attempt of a test.
    pub timeout: Duration,
}

/// A test suite: the paths it matched and how to run each of them.
pub struct Suite {
    pub paths: Vec<PathBuf>,
    pub config: Config,
}

impl Suite {
    /// Keep only the paths accepted by both filters. Filters are matched
    /// against `<suite name>:<path>`.
    pub fn with_filters(mut self, include: Option<&Regex>, exclude: Option<&Regex>) -> Self {
        let name = &self.config.name;
        self.paths.retain(|path| {
            let key = format!("{}:{}", name, path.to_string_lossy());
            include.map_or(true, |inc| inc.is_match(&key))
                && !exclude.map_or(false, |ex| ex.is_match(&key))
        });
        self
    }

    /// Concrete command for `path`.
    pub fn command_for(&self, path: &Path) -> String {
        self.config.cmd.replace("{}", &path.to_string_lossy())
    }
}

/// Builds fresh shell tests for every pass from the configured suites.
pub struct ShellFactory {
    suites: Vec<Suite>,
    runtime: Handle,
    interrupt: Interrupt,
}

impl ShellFactory {
    pub fn new(suites: Vec<Suite>, runtime: Handle, interrupt: Interrupt) -> Self {
        Self {
            suites,
            runtime,
            interrupt,
        }
    }
}

impl SuiteFactory for ShellFactory {
    fn build(&self) -> Result<Vec<Box<dyn TestCase>>, SoakError> {
        let mut tests: Vec<Box<dyn TestCase>> = Vec::new();
        for suite in &self.suites {
            for path in &suite.paths {
                tests.push(Box::new(ShellTest::new(
                    &suite.config,
                    path.clone(),
                    suite.command_for(path),
                    self.runtime.clone(),
                    self.interrupt.clone(),
                )));
            }
        }
        Ok(tests)
    }
}
