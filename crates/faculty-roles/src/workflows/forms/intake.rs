use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use super::local::{FormView, LocalFormService};
use super::service::FormServiceError;
use crate::events::{DashboardEvent, EventSink};
use crate::workflows::notifications::{Submission, EMAIL_LABEL, TIMESTAMP_LABEL};
use crate::workflows::sheets::{ResponseSheet, SheetError, TIMESTAMP_FORMAT};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Forms(#[from] FormServiceError),
    #[error("'{0}' needs an answer")]
    MissingAnswer(String),
    #[error("{value:?} is not a choice for '{question}'")]
    InvalidChoice { question: String, value: String },
    #[error("response could not be recorded: {0}")]
    Sheet(#[from] SheetError),
}

/// Serves locally hosted forms to respondents and records what they submit
/// in the form's response spreadsheet.
#[derive(Debug, Clone)]
pub struct LocalIntake {
    forms: Arc<LocalFormService>,
    responses: Arc<dyn ResponseSheet>,
    tab: String,
    events: Arc<dyn EventSink>,
}

impl LocalIntake {
    pub fn new(
        forms: Arc<LocalFormService>,
        responses: Arc<dyn ResponseSheet>,
        tab: impl Into<String>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            forms,
            responses,
            tab: tab.into(),
            events,
        }
    }

    pub fn view(
        &self,
        form_id: &str,
        prefilled: &BTreeMap<String, String>,
    ) -> Result<FormView, IntakeError> {
        Ok(self.forms.view(form_id, prefilled)?)
    }

    /// [`LocalIntake::submit`] stamped with the local time.
    pub fn submit_now(
        &self,
        form_id: &str,
        submission: &Submission,
    ) -> Result<Submission, IntakeError> {
        self.submit(form_id, submission, Local::now().naive_local())
    }

    /// Checks `submission` against the form, appends it to the response tab
    /// and returns it as stored, timestamp included.
    ///
    /// Answers are keyed by question title. Answers to questions the form
    /// does not have are dropped.
    pub fn submit(
        &self,
        form_id: &str,
        submission: &Submission,
        submitted_at: NaiveDateTime,
    ) -> Result<Submission, IntakeError> {
        let form = self
            .forms
            .form(form_id)
            .ok_or_else(|| FormServiceError::FormNotFound(form_id.to_string()))?;

        let mut columns = vec![(
            TIMESTAMP_LABEL.to_string(),
            submitted_at.format(TIMESTAMP_FORMAT).to_string(),
        )];

        let collect_email = form
            .settings
            .as_ref()
            .map(|settings| settings.collect_email)
            .unwrap_or(false);
        if collect_email {
            let email = submission
                .answer(&[EMAIL_LABEL])
                .ok_or_else(|| IntakeError::MissingAnswer(EMAIL_LABEL.to_string()))?;
            columns.push((EMAIL_LABEL.to_string(), email.to_string()));
        }

        for (_, question) in form.answerable() {
            let answer = submission.answer(&[question.title.as_str()]).unwrap_or("");
            if answer.is_empty() && question.required {
                return Err(IntakeError::MissingAnswer(question.title.clone()));
            }

            let choices = question.kind.choices();
            if !answer.is_empty() && !choices.is_empty() && !choices.iter().any(|c| c == answer) {
                return Err(IntakeError::InvalidChoice {
                    question: question.title.clone(),
                    value: answer.to_string(),
                });
            }
            columns.push((question.title.clone(), answer.to_string()));
        }

        if let Some(spreadsheet_id) = &form.destination {
            self.responses
                .append_response(spreadsheet_id, &self.tab, &columns)?;
        }
        self.forms.record_response(form_id)?;
        self.events.emit(DashboardEvent::ResponseRecorded {
            form_id: form_id.to_string(),
            spreadsheet_id: form.destination.clone(),
        });

        Ok(columns
            .into_iter()
            .fold(Submission::new(), |stored, (label, answer)| {
                stored.with_answer(label, answer)
            }))
    }
}
