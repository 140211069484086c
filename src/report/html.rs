//! HTML report rendering.
use super::{Node, ReportInfo};
use crate::{
    aggregate::{self, Summary},
    errors::SoakError,
    executor::results::{hms, Outcome, Status},
};
use html_escape::encode_text;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::{fmt::Write, path::Path};

const TEMPLATE: &str = include_str!("template.html");

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"));

/// CSS class of a result row.
fn row_class(status: Status) -> &'static str {
    match status {
        Status::Pass => "passCase",
        Status::Fail => "failCase",
        Status::Error => "errorCase",
        Status::Skip => "skipCase",
        Status::Canceled => "cancelCase",
    }
}

fn attribute_rows(info: &ReportInfo, summary: &Summary) -> String {
    let mut buf = String::new();
    for (idx, (key, value)) in info.attributes(summary).iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let _ = write!(
            buf,
            "        <tr id='attr_{}' class='attr'>\n            \
             <td align='left' width='15%'>{}</td>\n            \
             <td align='left'>{}</td>\n        </tr>\n",
            idx + 1,
            encode_text(key),
            encode_text(value)
        );
    }
    buf
}

fn node_rows(nodes: &[Node]) -> String {
    let local = Node::local();
    let mut buf = String::new();
    for (idx, node) in std::iter::once(&local).chain(nodes).enumerate() {
        let _ = writeln!(buf, "        <tr id='node_{}' class='nodes'>", idx);
        let cells = [
            node.name.as_str(),
            node.status.as_str(),
            node.address.as_str(),
            node.roles.as_str(),
            node.user.as_str(),
            node.redacted_password(),
            node.os.as_str(),
        ];
        for cell in cells.iter() {
            let _ = writeln!(
                buf,
                "            <td align='center'>{}</td>",
                encode_text(cell)
            );
        }
        buf.push_str("        </tr>\n");
    }
    buf
}

fn result_rows(outcomes: &[Outcome]) -> String {
    let mut buf = String::new();
    for (gid, (group, items)) in aggregate::sort_by_group(outcomes).into_iter().enumerate() {
        let counts = Summary::from_outcomes(items.iter().copied());
        let _ = write!(
            buf,
            "        <tr id='group_{}' class='groupRow'>\n            \
             <td colspan='4' align='left'>{} (pass {} / fail {} / error {} / skip {} / cancel {})</td>\n        \
             </tr>\n",
            gid,
            encode_text(group),
            counts.pass,
            counts.fail,
            counts.error,
            counts.skip,
            counts.cancel
        );
        for (cid, outcome) in items.iter().enumerate() {
            let class = row_class(outcome.status);
            let _ = write!(
                buf,
                "        <tr id='result_{gid}_{cid}' class='{class}'>\n            \
                 <td align='left'>{}</td>\n            \
                 <td align='center'>{}</td>\n            \
                 <td align='center'>{}</td>\n            \
                 <td align='center'>{}</td>\n        </tr>\n",
                encode_text(&outcome.test.label()),
                outcome.status,
                hms(outcome.elapsed),
                outcome.iteration,
                gid = gid,
                cid = cid,
                class = class,
            );
            let message = format!("{}{}", outcome.output, outcome.detail);
            if !message.is_empty() {
                let _ = write!(
                    buf,
                    "        <tr id='msg_{gid}_{cid}' class='{class}'>\n            \
                     <td align='left'>Message</td>\n            \
                     <td colspan='3' align='left'><pre>{}</pre></td>\n        </tr>\n",
                    encode_text(&message),
                    gid = gid,
                    cid = cid,
                    class = class,
                );
            }
        }
    }
    buf
}

/// Render the full report document.
pub fn render(info: &ReportInfo, outcomes: &[Outcome]) -> String {
    let summary = Summary::from_outcomes(outcomes);
    let title = info.full_title();
    let title_color = if title.contains("FAIL") || title.contains("ERROR") {
        "h_red"
    } else {
        "h_green"
    };

    let attributes = attribute_rows(info, &summary);
    let nodes = node_rows(&info.nodes);
    let results = result_rows(outcomes);

    PLACEHOLDER
        .replace_all(TEMPLATE, |caps: &Captures| -> String {
            match &caps[1] {
                "title" => encode_text(&title).into_owned(),
                "title_color" => title_color.to_string(),
                "generator" => encode_text(&info.generator).into_owned(),
                "attributes" => attributes.clone(),
                "nodes" => nodes.clone(),
                "results" => results.clone(),
                "total" => summary.total.to_string(),
                "pass" => summary.pass.to_string(),
                "fail" => summary.fail.to_string(),
                "error" => summary.error.to_string(),
                "skip" => summary.skip.to_string(),
                "cancel" => summary.cancel.to_string(),
                "pass_rate" => format!("{}%", summary.pass_rate()),
                other => format!("{{{{{}}}}}", other),
            }
        })
        .into_owned()
}

/// Render the report and write it to `path`, creating parent directories.
pub fn write(path: &Path, info: &ReportInfo, outcomes: &[Outcome]) -> Result<(), SoakError> {
    super::write_file(path, render(info, outcomes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{fixture_info, outcome};
    use pretty_assertions::assert_eq;

    #[test]
    fn rendering_is_idempotent() {
        let info = fixture_info();
        let outcomes = vec![
            outcome("suite.A", "a1", Status::Pass, "", ""),
            outcome("suite.B", "b1", Status::Fail, "out\n", "assert failed\n"),
        ];
        assert_eq!(render(&info, &outcomes), render(&info, &outcomes));
    }

    #[test]
    fn captured_output_is_escaped() {
        let outcomes = vec![outcome(
            "g",
            "t",
            Status::Error,
            "<script>alert('x')</script>\n",
            "",
        )];
        let html = render(&fixture_info(), &outcomes);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert('x')&lt;/script&gt;"));
    }

    #[test]
    fn message_row_only_when_there_is_text() {
        let outcomes = vec![
            outcome("g", "quiet", Status::Pass, "", ""),
            outcome("g", "noisy", Status::Skip, "", "no gpu"),
        ];
        let html = render(&fixture_info(), &outcomes);
        assert!(!html.contains("id='msg_0_0'"));
        assert!(html.contains("id='msg_0_1' class='skipCase'"));
        assert!(html.contains("<pre>no gpu</pre>"));
    }

    #[test]
    fn title_carries_status_and_color() {
        let mut info = fixture_info();
        let html = render(&info, &[]);
        assert!(html.contains("<h1 class='h_green'>PASSED: nightly</h1>"));

        info.status = crate::executor::RunStatus::Failed;
        let html = render(&info, &[]);
        assert!(html.contains("<h1 class='h_red'>FAILED: nightly</h1>"));
    }

    #[test]
    fn empty_attributes_are_omitted_and_local_node_is_first() {
        let mut info = fixture_info();
        info.version = None;
        let html = render(&info, &[]);
        assert!(!html.contains(">Version<"));
        assert!(html.contains(">Tester<"));

        let local = html.find("<td align='center'>Executor</td>").unwrap();
        let remote = html.find("<td align='center'>storage</td>").unwrap();
        assert!(local < remote);
        assert!(!html.contains("hunter2"));
    }

    #[test]
    fn groups_are_rendered_in_first_seen_order() {
        let outcomes = vec![
            outcome("A", "a1", Status::Pass, "", ""),
            outcome("B", "b1", Status::Pass, "", ""),
            outcome("A", "a2", Status::Pass, "", ""),
        ];
        let html = render(&fixture_info(), &outcomes);
        let a1 = html.find(">a1<").unwrap();
        let a2 = html.find(">a2<").unwrap();
        let b1 = html.find(">b1<").unwrap();
        assert!(a1 < a2 && a2 < b1);
        assert!(html.contains("<td>3</td>"));
        assert!(html.contains("<td>100%</td>"));
    }
}
