use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use super::mailer::{EmailMessage, MailError, Mailer};
use super::responses::ResponseFeed;
use super::submission::{Submission, EMAIL_LABEL, TIMESTAMP_LABEL};
use crate::events::{DashboardEvent, EventSink};
use crate::workflows::forms::QuestionRole;
use crate::workflows::sheets::TIMESTAMP_FORMAT;

const UNKNOWN_POSITION: &str = "Unknown Position";
const UNKNOWN_NAME: &str = "Unknown";
const NOT_PROVIDED: &str = "Not provided";

// Older response sheets used these headers.
const LEGACY_POSITION_LABEL: &str = "Position of Interest";
const LEGACY_MOTIVATION_LABEL: &str = "Why are you interested in this position?";
const EMAIL_LABELS: [&str; 2] = [EMAIL_LABEL, "Email"];

/// The fields of a submission that go into the HR email, placeholders applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HrNotice {
    pub position: String,
    pub submitted: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub phone: String,
    pub current_title: String,
    pub current_department: String,
    pub motivation: String,
    pub availability: String,
}

impl HrNotice {
    pub fn from_submission(submission: &Submission, now: NaiveDateTime) -> Self {
        let text = |labels: &[&str], placeholder: &str| {
            submission
                .answer(labels)
                .unwrap_or(placeholder)
                .to_string()
        };

        Self {
            position: text(
                &[QuestionRole::RoleSelect.label(), LEGACY_POSITION_LABEL],
                UNKNOWN_POSITION,
            ),
            submitted: submission
                .answer(&[TIMESTAMP_LABEL])
                .map(str::to_string)
                .unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string()),
            applicant_name: text(&[QuestionRole::FullName.label()], UNKNOWN_NAME),
            applicant_email: text(&EMAIL_LABELS, NOT_PROVIDED),
            phone: text(&[QuestionRole::Phone.label()], NOT_PROVIDED),
            current_title: text(&[QuestionRole::CurrentTitle.label()], NOT_PROVIDED),
            current_department: text(&[QuestionRole::CurrentDepartment.label()], NOT_PROVIDED),
            motivation: text(
                &[QuestionRole::Motivation.label(), LEGACY_MOTIVATION_LABEL],
                NOT_PROVIDED,
            ),
            availability: text(&[QuestionRole::Availability.label()], NOT_PROVIDED),
        }
    }

    pub fn subject(&self) -> String {
        format!("New Faculty Role Interest Application: {}", self.position)
    }

    pub fn body(&self) -> String {
        format!(
            "Hello HR Team,

A new internal faculty role interest application has been submitted through the Faculty Role Expression of Interest system.

=== APPLICATION DETAILS ===
Faculty Role Applied For: {position}
Submitted: {submitted}

=== APPLICANT INFORMATION ===
Name: {name}
Email: {email}
Phone: {phone}
Current Position: {title}
Current Department: {department}

=== APPLICATION RESPONSES ===
Why Interested:
{motivation}

Availability: {availability}

=== NEXT STEPS ===
Please review the complete application details in the form responses spreadsheet and follow up with the applicant as appropriate.

This notification was automatically generated by the Faculty Role Expression of Interest system.
",
            position = self.position,
            submitted = self.submitted,
            name = self.applicant_name,
            email = self.applicant_email,
            phone = self.phone,
            title = self.current_title,
            department = self.current_department,
            motivation = self.motivation,
            availability = self.availability,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    Dropped,
}

/// Emails HR once per submission. Delivery problems are reported as events
/// and never retried.
#[derive(Debug, Clone)]
pub struct HrNotifier {
    mailer: Arc<dyn Mailer>,
    hr_email: String,
    events: Arc<dyn EventSink>,
}

impl HrNotifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        hr_email: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            mailer,
            hr_email: hr_email.into(),
            events,
        }
    }

    pub fn notify_hr(&self, submission: &Submission) -> Delivery {
        self.notify_hr_at(submission, Local::now().naive_local())
    }

    /// Same as [`HrNotifier::notify_hr`] with an explicit fallback timestamp.
    pub fn notify_hr_at(&self, submission: &Submission, now: NaiveDateTime) -> Delivery {
        let notice = HrNotice::from_submission(submission, now);
        let message = EmailMessage {
            to: self.hr_email.trim().to_string(),
            subject: notice.subject(),
            body: notice.body(),
        };

        let sent = if message.to.is_empty() {
            Err(MailError::InvalidRecipient(self.hr_email.clone()))
        } else {
            self.mailer.send(&message)
        };

        match sent {
            Ok(()) => {
                self.events.emit(DashboardEvent::NotificationSent {
                    recipient: message.to,
                    applicant: notice.applicant_name,
                });
                Delivery::Sent
            }
            Err(err) => {
                self.events.emit(DashboardEvent::NotificationFailed {
                    recipient: message.to,
                    reason: err.to_string(),
                });
                Delivery::Dropped
            }
        }
    }

    /// Notifies HR about the most recent row of the response spreadsheet.
    /// `None` when there is no response to report.
    pub fn notify_latest_response(&self, feed: &ResponseFeed) -> Option<Delivery> {
        feed.latest_submission()
            .map(|submission| self.notify_hr(&submission))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn placeholders_fill_missing_answers() {
        let notice = HrNotice::from_submission(&Submission::new(), noon());

        assert_eq!(notice.position, "Unknown Position");
        assert_eq!(notice.applicant_name, "Unknown");
        assert_eq!(notice.applicant_email, "Not provided");
        assert_eq!(notice.submitted, "2026-03-02 12:00:00");
    }

    #[test]
    fn legacy_labels_are_understood() {
        let submission = Submission::new()
            .with_answer("Position of Interest", "High School - Counselor")
            .with_answer("Email", "kim@org.example")
            .with_answer("Why are you interested in this position?", "Growth");

        let notice = HrNotice::from_submission(&submission, noon());

        assert_eq!(notice.position, "High School - Counselor");
        assert_eq!(notice.applicant_email, "kim@org.example");
        assert_eq!(notice.motivation, "Growth");
        assert!(notice
            .subject()
            .ends_with("Application: High School - Counselor"));
    }
}
