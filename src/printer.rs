//! Console rendering of a finished run.
use crate::{
    aggregate::Summary,
    executor::{
        results::{hms, Outcome, Status},
        RunStatus,
    },
    report::ReportInfo,
};
use colored::*;
use std::path::Path;

const SEPARATOR: &str =
    "----------------------------------------------------------------------";

fn paint(text: &str, status: Status) -> ColoredString {
    match status {
        Status::Pass => text.green(),
        Status::Fail => text.red().bold(),
        Status::Error => text.red(),
        Status::Skip => text.yellow(),
        Status::Canceled => text.dimmed(),
    }
}

/// One line per outcome followed by its detail, if any.
pub fn outcome_str(outcome: &Outcome) -> String {
    let mut buf = format!(
        "{} - {} - Loop: {} - Elapsed: {}",
        paint(outcome.status.as_str(), outcome.status),
        outcome.test,
        outcome.iteration,
        hms(outcome.elapsed)
    );
    let detail = outcome.detail.trim_end();
    if !detail.is_empty() {
        buf.push('\n');
        for line in detail.lines() {
            buf.push_str("    ");
            buf.push_str(line);
            buf.push('\n');
        }
        buf.pop();
    }
    buf
}

/// Full end-of-run summary.
pub fn summary_str(info: &ReportInfo, outcomes: &[Outcome], log_path: Option<&Path>) -> String {
    let summary = Summary::from_outcomes(outcomes);
    let mut buf = String::with_capacity(500);

    buf.push_str(SEPARATOR);
    buf.push('\n');
    for outcome in outcomes {
        buf.push_str(&outcome_str(outcome));
        buf.push('\n');
    }
    buf.push_str(SEPARATOR);
    buf.push('\n');

    let counts = [
        (Status::Pass, summary.pass),
        (Status::Fail, summary.fail),
        (Status::Error, summary.error),
        (Status::Skip, summary.skip),
        (Status::Canceled, summary.cancel),
    ];
    let counts: Vec<String> = counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| paint(&format!("{} {}", status, count), *status).to_string())
        .collect();
    if !counts.is_empty() {
        buf.push_str(&format!("  {}\n", counts.join(" / ")));
    }
    buf.push_str(&format!(
        "  Ran {} tests in {} (passing rate {}%)\n",
        summary.total,
        hms(info.elapsed),
        summary.pass_rate()
    ));

    let title = info.full_title();
    let title = match info.status {
        RunStatus::Passed => title.green().bold(),
        RunStatus::Failed => title.red().bold(),
        RunStatus::Canceled => title.yellow().bold(),
    };
    buf.push_str(&format!("  {}\n", title));
    buf.push_str(&format!("  HTML report: {}\n", info.html_path.display()));
    buf.push_str(&format!("  XML report: {}\n", info.xml_path.display()));
    if let Some(log) = log_path {
        buf.push_str(&format!("  Log: {}\n", log.display()));
    }
    buf.push_str(&format!("  Location: {}\n", info.host.location()));
    buf
}
