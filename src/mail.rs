//! Shipping the HTML report by mail.
//!
//! Transport lives behind [MailDispatcher]. [send_report] only assembles the
//! message: the rendered report becomes the body and the run log is attached
//! when it is small enough.
use crate::errors::SoakError;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

/// Logs at or above this size are not attached.
pub const ATTACHMENT_LIMIT: u64 = 2_048_000;

/// The `[mail]` section of `soak.toml`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailSettings {
    pub from: String,
    pub to: Vec<String>,
    pub subject: Option<String>,
    /// SMTP relay.
    pub host: String,
    pub port: u16,
    /// Login is skipped when empty.
    pub user: String,
    pub password: String,
    /// Upgrade the connection with STARTTLS.
    pub tls: bool,
}

impl Default for MailSettings {
    fn default() -> Self {
        MailSettings {
            from: "soak@localhost".to_string(),
            to: Vec::new(),
            subject: None,
            host: "localhost".to_string(),
            port: 25,
            user: String::new(),
            password: String::new(),
            tls: false,
        }
    }
}

/// Everything a transport needs to deliver one report.
#[derive(Clone, Debug, PartialEq)]
pub struct MailMessage {
    pub subject: String,
    pub body: Vec<u8>,
    pub recipients: Vec<String>,
    pub attachments: Vec<PathBuf>,
}

pub trait MailDispatcher {
    fn dispatch(&self, message: &MailMessage) -> Result<(), SoakError>;
}

/// Read the report at `html_path` and hand it to `dispatcher`.
///
/// Returns whether a message was delivered. Failures are logged and never
/// propagate.
pub fn send_report(
    dispatcher: &dyn MailDispatcher,
    recipients: &[String],
    subject: &str,
    html_path: &Path,
    log_path: Option<&Path>,
) -> bool {
    if recipients.is_empty() {
        return false;
    }

    let body = match fs::read(html_path) {
        Ok(body) => body,
        Err(err) => {
            error!("Cannot read report {}: {}", html_path.display(), err);
            return false;
        }
    };

    let mut attachments = Vec::new();
    if let Some(log) = log_path {
        match fs::metadata(log) {
            Ok(meta) if meta.len() < ATTACHMENT_LIMIT => attachments.push(log.to_path_buf()),
            Ok(meta) => warn!(
                "Log {} is {} bytes, not attaching it",
                log.display(),
                meta.len()
            ),
            Err(err) => warn!("Cannot attach {}: {}", log.display(), err),
        }
    }

    let message = MailMessage {
        subject: subject.to_string(),
        body,
        recipients: recipients.to_vec(),
        attachments,
    };
    match dispatcher.dispatch(&message) {
        Ok(()) => {
            info!("Report mailed to {}", recipients.join(", "));
            true
        }
        Err(err) => {
            error!("{}", err);
            false
        }
    }
}

fn mailbox(address: &str) -> Result<Mailbox, SoakError> {
    address
        .trim()
        .parse()
        .map_err(|err| SoakError::Mail(format!("invalid address {:?}: {}", address, err)))
}

/// Build the MIME message: the report as the HTML part, then one part per
/// attachment.
pub fn compose(from: &str, message: &MailMessage) -> Result<Message, SoakError> {
    // Header values are single-line; a title with a newline stays a subject.
    let subject: String = message
        .subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let mut builder = Message::builder().from(mailbox(from)?).subject(subject);
    for recipient in &message.recipients {
        builder = builder.to(mailbox(recipient)?);
    }

    let html = String::from_utf8_lossy(&message.body).into_owned();
    let mut parts = MultiPart::mixed().singlepart(SinglePart::html(html));
    for path in &message.attachments {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read(path)?;
        parts = parts.singlepart(Attachment::new(name).body(content, ContentType::TEXT_PLAIN));
    }

    builder
        .multipart(parts)
        .map_err(|err| SoakError::Mail(err.to_string()))
}

/// Delivers through an SMTP relay.
pub struct Smtp<'a> {
    settings: &'a MailSettings,
}

impl<'a> Smtp<'a> {
    pub fn new(settings: &'a MailSettings) -> Self {
        Smtp { settings }
    }

    fn transport(&self) -> Result<SmtpTransport, SoakError> {
        let settings = self.settings;
        let builder = if settings.tls {
            SmtpTransport::starttls_relay(&settings.host)
                .map_err(|err| SoakError::Mail(err.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(&settings.host)
        };
        let mut builder = builder.port(settings.port);
        if !settings.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ));
        }
        Ok(builder.build())
    }
}

impl MailDispatcher for Smtp<'_> {
    fn dispatch(&self, message: &MailMessage) -> Result<(), SoakError> {
        let email = compose(&self.settings.from, message)?;
        self.transport()?
            .send(&email)
            .map_err(|err| SoakError::Mail(format!("{}: {}", self.settings.host, err)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<MailMessage>>,
        fail: bool,
    }

    impl MailDispatcher for Recorder {
        fn dispatch(&self, message: &MailMessage) -> Result<(), SoakError> {
            if self.fail {
                return Err(SoakError::Mail("relay refused".to_string()));
            }
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    fn recipients() -> Vec<String> {
        vec!["qa@example.com".to_string()]
    }

    fn message(subject: &str, attachments: Vec<PathBuf>) -> MailMessage {
        MailMessage {
            subject: subject.to_string(),
            body: b"<h1>report</h1>".to_vec(),
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            attachments,
        }
    }

    #[test]
    fn small_log_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("report.html");
        let log = dir.path().join("report.log");
        fs::write(&html, "<html/>").unwrap();
        fs::write(&log, "a few lines\n").unwrap();

        let recorder = Recorder::default();
        assert!(send_report(
            &recorder,
            &recipients(),
            "PASSED: nightly",
            &html,
            Some(&log)
        ));
        let sent = recorder.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "PASSED: nightly");
        assert_eq!(sent[0].body, b"<html/>".to_vec());
        assert_eq!(sent[0].attachments, vec![log.clone()]);
    }

    #[test]
    fn oversized_log_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("report.html");
        let log = dir.path().join("report.log");
        fs::write(&html, "<html/>").unwrap();
        fs::write(&log, vec![b'x'; ATTACHMENT_LIMIT as usize]).unwrap();

        let recorder = Recorder::default();
        assert!(send_report(&recorder, &recipients(), "s", &html, Some(&log)));
        assert!(recorder.sent.borrow()[0].attachments.is_empty());
    }

    #[test]
    fn nothing_is_sent_without_recipients() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("report.html");
        fs::write(&html, "<html/>").unwrap();

        let recorder = Recorder::default();
        assert!(!send_report(&recorder, &[], "s", &html, None));
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn delivery_failure_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("report.html");
        fs::write(&html, "<html/>").unwrap();

        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        assert!(!send_report(&recorder, &recipients(), "s", &html, None));
        assert!(!send_report(
            &Recorder::default(),
            &recipients(),
            "s",
            &dir.path().join("missing.html"),
            None
        ));
    }

    #[test]
    fn composed_message_has_body_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");
        fs::write(&log, "log line\n").unwrap();

        let email = compose("soak@example.com", &message("FAILED: nightly", vec![log])).unwrap();
        let envelope = email.envelope();
        assert_eq!(envelope.to().len(), 2);
        let text = String::from_utf8(email.formatted()).unwrap();
        assert!(text.contains("From: soak@example.com\r\n"));
        assert!(text.contains("Subject: FAILED: nightly\r\n"));
        assert!(text.contains("multipart/mixed"));
        assert!(text.contains("<h1>report</h1>"));
        assert!(text.contains("run.log"));
    }

    #[test]
    fn newline_in_subject_cannot_add_headers() {
        let email = compose(
            "soak@example.com",
            &message("x\nBcc: attacker@example.com", Vec::new()),
        )
        .unwrap();
        let text = String::from_utf8(email.formatted()).unwrap();
        assert!(!text.contains("\r\nBcc:"));
        assert!(!text.contains("\nBcc:"));
        let to: Vec<String> = email.envelope().to().iter().map(|a| a.to_string()).collect();
        assert_eq!(to, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn invalid_address_is_a_mail_error() {
        let mut bad = message("s", Vec::new());
        bad.recipients = vec!["not an address".to_string()];
        assert!(matches!(
            compose("soak@example.com", &bad),
            Err(SoakError::Mail(_))
        ));
        assert!(matches!(
            compose("", &message("s", Vec::new())),
            Err(SoakError::Mail(_))
        ));
    }
}
