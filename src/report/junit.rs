//! JUnit XML report rendering.
use super::ReportInfo;
use crate::{
    aggregate::Summary,
    errors::SoakError,
    executor::results::{Outcome, Status},
};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::path::Path;

const SUITE_NAME: &str = "soak";

fn testcase(outcome: &Outcome) -> TestCase {
    let status = match outcome.status {
        Status::Pass | Status::Canceled => TestCaseStatus::success(),
        Status::Skip => {
            let mut status = TestCaseStatus::skipped();
            status.set_message(outcome.detail.trim());
            status
        }
        Status::Fail | Status::Error => {
            let detail = outcome.detail.trim_matches('\n');
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            status
                .set_message(detail.lines().last().unwrap_or_default())
                .set_type(if outcome.status == Status::Fail {
                    "Failure"
                } else {
                    "Error"
                })
                .set_description(detail);
            status
        }
    };

    let mut testcase = TestCase::new(outcome.test.name.as_str(), status);
    testcase
        .set_classname(outcome.test.group.as_str())
        .set_time(outcome.elapsed);
    testcase
}

/// Build the JUnit document: one `testsuite` holding one `testcase` per
/// outcome.
pub fn build(info: &ReportInfo, outcomes: &[Outcome]) -> Report {
    let summary = Summary::from_outcomes(outcomes);

    let mut suite = TestSuite::new(SUITE_NAME);
    suite.add_test_cases(outcomes.iter().map(testcase));
    suite
        .set_timestamp(info.started)
        .set_time(info.elapsed);
    // FAIL and ERROR both render as <failure>; keep their own tallies.
    suite.tests = summary.total;
    suite.failures = summary.fail;
    suite.errors = summary.error;
    suite
        .extra
        .insert("skipped".into(), summary.skip.to_string().into());
    suite
        .extra
        .insert("hostname".into(), info.host.location().into());

    let mut report = Report::new(SUITE_NAME);
    report.add_test_suite(suite);
    report.tests = summary.total;
    report.failures = summary.fail;
    report.errors = summary.error;
    report
}

/// Serialize the JUnit document.
pub fn render(info: &ReportInfo, outcomes: &[Outcome]) -> Result<String, SoakError> {
    build(info, outcomes)
        .to_string()
        .map_err(|err| SoakError::Junit {
            path: info.xml_path.clone(),
            message: err.to_string(),
        })
}

/// Serialize the JUnit document and write it to `path`.
pub fn write(path: &Path, info: &ReportInfo, outcomes: &[Outcome]) -> Result<(), SoakError> {
    let xml = render(info, outcomes)?;
    super::write_file(path, xml.as_bytes())
}
