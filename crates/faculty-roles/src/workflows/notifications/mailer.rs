use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid recipient {0:?}")]
    InvalidRecipient(String),
    #[error("mail delivery rejected: {0}")]
    Rejected(String),
    #[error("mail spool unavailable: {0}")]
    Spool(#[from] std::io::Error),
}

/// Outbound mail delivery.
pub trait Mailer: Debug + Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Keeps sent messages in memory.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<EmailMessage>>,
    rejecting: AtomicBool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery is rejected.
    pub fn rejecting() -> Self {
        let mailer = Self::default();
        mailer.rejecting.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(MailError::Rejected("outbox is rejecting mail".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// Writes each message as a plain-text file under a spool directory, for
/// local runs without a mail relay.
#[derive(Debug, Clone)]
pub struct SpoolMailer {
    dir: PathBuf,
}

impl SpoolMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Mailer for SpoolMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        fs::create_dir_all(&self.dir)?;
        let name = format!(
            "{}-{}.txt",
            Utc::now().format("%Y%m%dT%H%M%S"),
            Uuid::new_v4().simple()
        );
        let contents = format!(
            "To: {}\nSubject: {}\n\n{}",
            message.to, message.subject, message.body
        );
        fs::write(self.dir.join(name), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "hr@org.example".to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        }
    }

    #[test]
    fn spool_writes_one_file_per_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mailer = SpoolMailer::new(dir.path().join("outbox"));

        mailer.send(&message()).expect("first");
        mailer.send(&message()).expect("second");

        let files: Vec<_> = fs::read_dir(dir.path().join("outbox"))
            .expect("spool dir")
            .collect();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn rejecting_outbox_keeps_nothing() {
        let mailer = OutboxMailer::rejecting();
        assert!(mailer.send(&message()).is_err());
        assert!(mailer.sent().is_empty());
    }
}
