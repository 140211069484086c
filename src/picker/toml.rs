//! The default picker: gathers the run configuration and the suites to run
//! from a soak.toml file.
use indexmap::IndexMap;
use serde::Deserialize;
use std::{
    convert::TryFrom,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    errors::SoakError,
    executor::{suite, Policy, Verbosity},
    mail::MailSettings,
    report::Node,
};

/// Name of the configuration file looked up in the test directory.
pub const CONFIG_FILE: &str = "soak.toml";

/// Default timeout of one attempt, in seconds.
const DEFAULT_TIMEOUT: u64 = 1200;

/// Configuration for a single soak run.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Version of soak this configuration is compatible with.
    pub ver: String,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Extra attributes shown in the report, in file order.
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub mail: MailSettings,
    /// Test suite configurations.
    #[serde(default)]
    pub tests: Vec<SuiteConfig>,
}

/// The `[run]` section.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Suite passes. 0 loops until a failure or Ctrl-C.
    pub iterations: u32,
    /// Attempts per test and pass while it keeps passing. 0 is unlimited.
    pub repeat: u32,
    pub fail_exit: bool,
    pub verbosity: u8,
    /// Seconds after which a test's retry loop stops.
    pub retry_budget: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            repeat: 1,
            fail_exit: true,
            verbosity: 2,
            retry_budget: None,
        }
    }
}

impl RunConfig {
    pub fn policy(&self) -> Policy {
        Policy {
            iterations: self.iterations,
            repeat: self.repeat,
            fail_exit: self.fail_exit,
            retry_budget: self.retry_budget.map(Duration::from_secs),
            verbosity: Verbosity::from(self.verbosity),
        }
    }
}

/// The `[report]` section.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub tester: String,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Where the HTML report goes. The run log is written next to it.
    pub html: PathBuf,
    pub xml: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "soak".to_string(),
            tester: String::new(),
            version: None,
            description: None,
            html: PathBuf::from("report/report.html"),
            xml: PathBuf::from("report/result.xml"),
        }
    }
}

/// Configuration for a test suite.
#[derive(Debug, Deserialize)]
pub struct SuiteConfig {
    /// Name of this suite.
    pub name: String,
    /// Glob patterns of the test paths.
    pub paths: Vec<String>,
    /// Command to execute. The pattern `{}` in this string is replaced with
    /// the matching path.
    pub cmd: String,
    /// Optional timeout in seconds.
    pub timeout: Option<u64>,
}

impl Config {
    /// Create a configuration by reading the soak.toml file in `conf_dir`.
    /// Ensures that the version number it names matches this soak.
    pub fn from_path(conf_dir: &Path) -> Result<Self, SoakError> {
        let conf_path = conf_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&conf_path).map_err(|_| {
            SoakError::Config(format!(
                "{} is missing. Soak expects a directory with a {} file.",
                conf_path.display(),
                CONFIG_FILE
            ))
        })?;
        Self::parse(&contents, &conf_path)
    }

    fn parse(contents: &str, conf_path: &Path) -> Result<Self, SoakError> {
        let conf: Config = toml::from_str(contents).map_err(|err| {
            SoakError::Config(format!("Failed to parse {}: {}", conf_path.display(), err))
        })?;

        if env!("CARGO_PKG_VERSION") != conf.ver {
            return Err(SoakError::Config(format!(
                "Soak version mismatch. Configuration requires: {}, tool version: {}.",
                conf.ver,
                env!("CARGO_PKG_VERSION")
            )));
        }
        Ok(conf)
    }
}

impl TryFrom<SuiteConfig> for suite::Suite {
    type Error = SoakError;

    /// Expand the glob patterns into the matching paths, in pattern order.
    fn try_from(conf: SuiteConfig) -> Result<Self, Self::Error> {
        let mut paths = Vec::new();
        for pattern in &conf.paths {
            let matches = glob::glob(pattern).map_err(|err| {
                SoakError::Config(format!("{}: bad pattern {}: {}", conf.name, pattern, err))
            })?;
            for path in matches {
                paths.push(path.map_err(|err| {
                    SoakError::Config(format!("{}: cannot read {}", conf.name, err))
                })?);
            }
        }

        Ok(suite::Suite {
            paths,
            config: suite::Config {
                name: conf.name,
                cmd: conf.cmd,
                timeout: Duration::from_secs(conf.timeout.unwrap_or(DEFAULT_TIMEOUT)),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn with_version(body: &str) -> String {
        format!("ver = \"{}\"\n{}", env!("CARGO_PKG_VERSION"), body)
    }

    #[test]
    fn full_configuration_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let body = with_version(
            r#"
[run]
iterations = 0
repeat = 3
fail_exit = false
verbosity = 3
retry_budget = 60

[report]
title = "storage soak"
tester = "qa"
html = "out/r.html"

[env]
zone = "b"
cluster = "lab-3"

[[nodes]]
name = "node-1"
address = "10.0.0.8"
password = "hunter2"

[mail]
to = ["qa@example.com"]
host = "smtp.example.com"
user = "soak"
tls = true

[[tests]]
name = "Cat tests"
paths = ["cat/*.txt"]
cmd = "cat {}"
timeout = 30
"#,
        );
        fs::write(dir.path().join(CONFIG_FILE), body).unwrap();

        let conf = Config::from_path(dir.path()).unwrap();
        let policy = conf.run.policy();
        assert_eq!(policy.iterations, 0);
        assert_eq!(policy.repeat, 3);
        assert!(!policy.fail_exit);
        assert_eq!(policy.verbosity, Verbosity::All);
        assert_eq!(policy.retry_budget, Some(Duration::from_secs(60)));
        assert_eq!(conf.report.title, "storage soak");
        assert_eq!(conf.report.xml, PathBuf::from("report/result.xml"));
        let keys: Vec<&str> = conf.env.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zone", "cluster"]);
        assert_eq!(conf.nodes[0].password, "hunter2");
        assert_eq!(conf.mail.to, vec!["qa@example.com".to_string()]);
        assert_eq!(conf.mail.host, "smtp.example.com");
        assert_eq!(conf.mail.port, 25);
        assert_eq!(conf.mail.user, "soak");
        assert!(conf.mail.tls);
        assert_eq!(conf.tests[0].timeout, Some(30));
    }

    #[test]
    fn defaults_apply_to_a_minimal_file() {
        let conf = Config::parse(&with_version(""), Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(conf.run, RunConfig::default());
        assert_eq!(conf.report, ReportConfig::default());
        assert!(conf.tests.is_empty());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let err = Config::parse("ver = \"0.0.0-never\"", Path::new(CONFIG_FILE)).unwrap_err();
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains("soak.toml is missing"));
    }

    #[test]
    fn globs_expand_to_sorted_paths() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["b.txt", "a.txt", "c.md"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let conf = SuiteConfig {
            name: "Cat tests".to_string(),
            paths: vec![format!("{}/*.txt", dir.path().display())],
            cmd: "cat {}".to_string(),
            timeout: None,
        };
        let suite = suite::Suite::try_from(conf).unwrap();
        let names: Vec<String> = suite
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(suite.config.timeout, Duration::from_secs(DEFAULT_TIMEOUT));
    }

    #[test]
    fn bad_glob_is_a_config_error() {
        let conf = SuiteConfig {
            name: "broken".to_string(),
            paths: vec!["[".to_string()],
            cmd: "true".to_string(),
            timeout: None,
        };
        assert!(matches!(
            suite::Suite::try_from(conf),
            Err(SoakError::Config(_))
        ));
    }
}
