//! HR notification for interest form submissions.

mod mailer;
mod notifier;
mod responses;
mod submission;

pub use mailer::{EmailMessage, MailError, Mailer, OutboxMailer, SpoolMailer};
pub use notifier::{Delivery, HrNotice, HrNotifier};
pub use responses::ResponseFeed;
pub use submission::{Submission, EMAIL_LABEL, TIMESTAMP_LABEL};
