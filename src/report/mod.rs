//! Report emitters. Both reports render from a [ReportInfo] snapshot and the
//! finalized outcome log, so rendering never reads the clock or the host.
pub mod html;
pub mod junit;

use crate::{
    aggregate::Summary,
    errors::SoakError,
    executor::{
        results::{hms, Outcome},
        RunResult, RunStatus,
    },
};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{
    fs,
    net::ToSocketAddrs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Generator identity written into the HTML head.
pub const GENERATOR: &str = concat!("soak ", env!("CARGO_PKG_VERSION"));

const REDACTED: &str = "********";

/// A machine involved in the run, shown for operator context.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Node {
    pub name: String,
    pub status: String,
    pub address: String,
    pub roles: String,
    pub user: String,
    pub password: String,
    pub os: String,
}

impl Node {
    /// The machine soak itself runs on.
    pub fn local() -> Self {
        let host = Host::detect();
        Node {
            name: host.name,
            status: "Ready".to_string(),
            address: host.address,
            roles: "Executor".to_string(),
            user: std::env::var("USER").unwrap_or_else(|_| "root".to_string()),
            password: REDACTED.to_string(),
            os: std::env::consts::OS.to_string(),
        }
    }

    /// Passwords are never written into a report.
    pub fn redacted_password(&self) -> &str {
        if self.password.is_empty() {
            ""
        } else {
            REDACTED
        }
    }
}

/// Name and address of the local machine.
#[derive(Clone, Debug, PartialEq)]
pub struct Host {
    pub name: String,
    pub address: String,
}

impl Host {
    pub fn detect() -> Self {
        let name = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());
        let address = (name.as_str(), 0)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.find(|addr| addr.is_ipv4()))
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        Host { name, address }
    }

    /// `name(address)`
    pub fn location(&self) -> String {
        format!("{}({})", self.name, self.address)
    }
}

/// Run metadata frozen at the end of a run.
#[derive(Clone, Debug)]
pub struct ReportInfo {
    pub title: String,
    pub status: RunStatus,
    pub generator: String,
    pub tester: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub elapsed: Duration,
    pub host: Host,
    pub workspace: String,
    pub html_path: PathBuf,
    pub xml_path: PathBuf,
    pub command: String,
    /// Extra key/value pairs appended to the attributes table.
    pub env: IndexMap<String, String>,
    /// Configured nodes. The local executor is added when rendering.
    pub nodes: Vec<Node>,
}

impl ReportInfo {
    /// Snapshot the metadata of a finished run.
    pub fn new(title: impl Into<String>, result: &RunResult) -> Self {
        ReportInfo {
            title: title.into(),
            status: result.status,
            generator: GENERATOR.to_string(),
            tester: String::new(),
            version: None,
            description: None,
            started: result.started,
            finished: result.finished,
            elapsed: result.elapsed,
            host: Host::detect(),
            workspace: std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            html_path: PathBuf::from("report.html"),
            xml_path: PathBuf::from("result.xml"),
            command: std::env::args().collect::<Vec<_>>().join(" "),
            env: IndexMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Title prefixed with the overall status.
    pub fn full_title(&self) -> String {
        self.status.title(&self.title)
    }

    /// Ordered attribute rows. Values may be empty; renderers drop those.
    pub fn attributes(&self, summary: &Summary) -> Vec<(String, String)> {
        let timestamp = |at: &DateTime<Local>| at.format("%Y-%m-%d %H:%M:%S").to_string();
        let mut attrs = vec![
            ("Tester".to_string(), self.tester.clone()),
            ("Version".to_string(), self.version.clone().unwrap_or_default()),
            ("Start".to_string(), timestamp(&self.started)),
            ("End".to_string(), timestamp(&self.finished)),
            ("Elapsed".to_string(), hms(self.elapsed)),
            ("Summary".to_string(), summary.describe()),
            ("Location".to_string(), self.host.location()),
            ("Workspace".to_string(), self.workspace.clone()),
            ("Report".to_string(), self.html_path.display().to_string()),
            ("Command".to_string(), self.command.clone()),
        ];
        if let Some(desc) = &self.description {
            attrs.push(("Description".to_string(), desc.clone()));
        }
        attrs.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        attrs
    }
}

/// Write `bytes` to `path` in one operation, creating parent directories.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<(), SoakError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if !dir.is_dir() {
            fs::create_dir_all(dir).map_err(|err| SoakError::report(dir, err))?;
        }
    }
    fs::write(path, bytes).map_err(|err| SoakError::report(path, err))
}

/// Write the HTML and JUnit reports to the paths recorded in `info`.
pub fn emit(info: &ReportInfo, outcomes: &[Outcome]) -> Result<(), SoakError> {
    html::write(&info.html_path, info, outcomes)?;
    junit::write(&info.xml_path, info, outcomes)
}
