use std::sync::Arc;

use serde::Serialize;

use super::properties::{
    PropertyStore, PropertyStoreError, FORM_ID_KEY, FORM_LAYOUT_KEY, RESPONSE_SHEET_ID_KEY,
};
use super::questions::{FormQuestionSet, QuestionLayout, QuestionRole};
use super::service::{
    FormHandle, FormService, FormServiceError, FormSettings, PrefilledAnswer, ResponseStore,
    ResponseStoreGateway,
};
use crate::events::{DashboardEvent, EventSink};
use crate::workflows::listings::{role_choice, Listing, ListingReader};
use crate::workflows::profiles::{ProfileResolver, RespondentProfile};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Forms(#[from] FormServiceError),
    #[error(transparent)]
    Properties(#[from] PropertyStoreError),
    #[error("question layout could not be stored: {0}")]
    Layout(#[from] serde_json::Error),
    #[error("no interest form has been provisioned yet")]
    NotProvisioned,
}

/// External services the provisioner writes to.
#[derive(Debug, Clone)]
pub struct FormBackends {
    pub forms: Arc<dyn FormService>,
    pub response_stores: Arc<dyn ResponseStoreGateway>,
    pub properties: Arc<dyn PropertyStore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedForm {
    pub form_id: String,
    pub published_url: String,
    pub edit_url: String,
    pub role_choices: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_store: Option<ResponseStore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseSpreadsheetStatus {
    Accessible(ResponseStore),
    Inaccessible { spreadsheet_id: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormManagementInfo {
    pub form_id: String,
    pub title: String,
    pub published_url: String,
    pub edit_url: String,
    pub response_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_spreadsheet: Option<ResponseSpreadsheetStatus>,
}

/// An open listing together with its pre-filled interest link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefilledListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub prefilled_form_url: Option<String>,
}

/// Builds and maintains the interest form and answers link requests for it.
///
/// `provision_form` is the only operation that reports failures. Link
/// lookups degrade: a broken pre-fill falls back to the plain form URL, and
/// a missing form is provisioned on demand.
#[derive(Debug, Clone)]
pub struct FormProvisioner {
    backends: FormBackends,
    listings: ListingReader,
    profiles: ProfileResolver,
    settings: FormSettings,
    events: Arc<dyn EventSink>,
}

impl FormProvisioner {
    pub fn new(
        backends: FormBackends,
        listings: ListingReader,
        profiles: ProfileResolver,
        settings: FormSettings,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            backends,
            listings,
            profiles,
            settings,
            events,
        }
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    pub fn resolve_profile(&self, email: &str) -> RespondentProfile {
        self.profiles.resolve(email)
    }

    /// Rebuilds the whole form from the current open listings.
    pub fn provision_form(&self) -> Result<ProvisionedForm, ProvisionError> {
        self.rebuild().map_err(|err| {
            self.events.emit(DashboardEvent::ProvisioningFailed {
                reason: err.to_string(),
            });
            err
        })
    }

    fn rebuild(&self) -> Result<ProvisionedForm, ProvisionError> {
        let forms = &self.backends.forms;
        let handle = self.open_or_create()?;
        let form_id = handle.form_id.as_str();

        forms.apply_settings(form_id, &self.settings)?;
        forms.clear_items(form_id)?;

        let question_set = FormQuestionSet::from_listings(&self.listings.list_open_roles());
        let mut layout = QuestionLayout::new(form_id, question_set.role_choices().to_vec());
        for question in question_set.questions() {
            let item = forms.add_item(form_id, question)?;
            layout.insert(question.role, item);
        }
        self.backends
            .properties
            .set(FORM_LAYOUT_KEY, &layout.to_json()?)?;

        self.events.emit(DashboardEvent::FormRebuilt {
            form_id: form_id.to_string(),
            role_choices: question_set.role_choices().len(),
            questions: question_set.questions().len(),
        });

        let response_store = self.link_response_store(form_id);

        Ok(ProvisionedForm {
            form_id: handle.form_id.clone(),
            published_url: handle.published_url,
            edit_url: handle.edit_url,
            role_choices: question_set.role_choices().len(),
            response_store,
        })
    }

    fn open_or_create(&self) -> Result<FormHandle, ProvisionError> {
        let forms = &self.backends.forms;
        let properties = &self.backends.properties;

        if let Some(form_id) = non_empty(properties.get(FORM_ID_KEY)?) {
            match forms.open_form(&form_id) {
                Ok(handle) => {
                    self.events.emit(DashboardEvent::FormReopened { form_id });
                    return Ok(handle);
                }
                Err(FormServiceError::FormNotFound(_)) => {
                    self.events.emit(DashboardEvent::FormUnavailable {
                        form_id,
                        reason: "stored form no longer exists".to_string(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        let handle = forms.create_form(&self.settings.title)?;
        properties.set(FORM_ID_KEY, &handle.form_id)?;
        properties.clear(FORM_LAYOUT_KEY)?;
        self.events.emit(DashboardEvent::FormCreated {
            form_id: handle.form_id.clone(),
        });
        Ok(handle)
    }

    /// Points the form at its response spreadsheet. Failures leave the form
    /// usable and are only reported as events.
    fn link_response_store(&self, form_id: &str) -> Option<ResponseStore> {
        let linked = self.response_store().and_then(|(store, created)| {
            self.backends
                .forms
                .set_destination(form_id, &store.spreadsheet_id)?;
            Ok((store, created))
        });

        match linked {
            Ok((store, created)) => {
                self.events.emit(DashboardEvent::ResponseStoreLinked {
                    spreadsheet_id: store.spreadsheet_id.clone(),
                    created,
                });
                Some(store)
            }
            Err(err) => {
                self.events.emit(DashboardEvent::ResponseStoreUnavailable {
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn response_store(&self) -> Result<(ResponseStore, bool), ProvisionError> {
        let stores = &self.backends.response_stores;
        let properties = &self.backends.properties;

        if let Some(spreadsheet_id) = non_empty(properties.get(RESPONSE_SHEET_ID_KEY)?) {
            if let Ok(store) = stores.open(&spreadsheet_id) {
                return Ok((store, false));
            }
        }

        let store = stores.create(&format!("{} - Responses", self.settings.title))?;
        properties.set(RESPONSE_SHEET_ID_KEY, &store.spreadsheet_id)?;
        Ok((store, true))
    }

    /// Published URL of the stored form, provisioning one when none can be
    /// opened. `None` only when provisioning fails too.
    pub fn interest_form_url(&self) -> Option<String> {
        if let Some(form_id) = self.stored_form_id() {
            if let Ok(handle) = self.backends.forms.open_form(&form_id) {
                return Some(handle.published_url);
            }
        }
        self.provision_form()
            .ok()
            .map(|provisioned| provisioned.published_url)
    }

    /// Interest link with the role and the respondent's known details filled in.
    pub fn prefilled_url(
        &self,
        role_title: &str,
        division: &str,
        respondent_email: &str,
    ) -> Option<String> {
        let profile = self.profiles.resolve(respondent_email);
        self.prefilled_url_for(&profile, role_title, division)
    }

    pub fn listings_with_prefilled_urls(&self, respondent_email: &str) -> Vec<PrefilledListing> {
        let listings = self.listings.list_open_roles();
        if listings.is_empty() {
            return Vec::new();
        }

        let profile = self.profiles.resolve(respondent_email);
        listings
            .into_iter()
            .map(|listing| {
                let prefilled_form_url =
                    self.prefilled_url_for(&profile, &listing.role_title, &listing.division);
                PrefilledListing {
                    listing,
                    prefilled_form_url,
                }
            })
            .collect()
    }

    fn prefilled_url_for(
        &self,
        profile: &RespondentProfile,
        role_title: &str,
        division: &str,
    ) -> Option<String> {
        let Some(form_id) = self.stored_form_id() else {
            return self.interest_form_url();
        };

        let Some(layout) = self.stored_layout(&form_id) else {
            self.events.emit(DashboardEvent::PrefillFallback {
                reason: format!("no question layout recorded for form {form_id}"),
            });
            return self.interest_form_url();
        };

        let choice = role_choice(division, role_title);
        if !layout.offers_choice(&choice) {
            self.events
                .emit(DashboardEvent::PrefillSkippedChoice { choice });
        }

        let answers = prefill_answers(&layout, role_title, division, profile);
        match self.backends.forms.prefilled_url(&form_id, &answers) {
            Ok(url) => Some(url),
            Err(err) => {
                self.events.emit(DashboardEvent::PrefillFallback {
                    reason: err.to_string(),
                });
                self.interest_form_url()
            }
        }
    }

    pub fn management_info(&self) -> Result<FormManagementInfo, ProvisionError> {
        let properties = &self.backends.properties;
        let form_id = non_empty(properties.get(FORM_ID_KEY)?).ok_or(ProvisionError::NotProvisioned)?;

        let handle = self.backends.forms.open_form(&form_id)?;
        let response_count = self.backends.forms.response_count(&form_id)?;
        let response_spreadsheet = non_empty(properties.get(RESPONSE_SHEET_ID_KEY)?).map(
            |spreadsheet_id| match self.backends.response_stores.open(&spreadsheet_id) {
                Ok(store) => ResponseSpreadsheetStatus::Accessible(store),
                Err(_) => ResponseSpreadsheetStatus::Inaccessible {
                    spreadsheet_id,
                    error: "response spreadsheet not accessible".to_string(),
                },
            },
        );

        Ok(FormManagementInfo {
            form_id,
            title: handle.title,
            published_url: handle.published_url,
            edit_url: handle.edit_url,
            response_count,
            response_spreadsheet,
        })
    }

    fn stored_form_id(&self) -> Option<String> {
        match self.backends.properties.get(FORM_ID_KEY) {
            Ok(value) => non_empty(value),
            Err(err) => {
                self.events.emit(DashboardEvent::PropertiesUnavailable {
                    key: FORM_ID_KEY,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn stored_layout(&self, form_id: &str) -> Option<QuestionLayout> {
        let raw = match self.backends.properties.get(FORM_LAYOUT_KEY) {
            Ok(raw) => non_empty(raw)?,
            Err(err) => {
                self.events.emit(DashboardEvent::PropertiesUnavailable {
                    key: FORM_LAYOUT_KEY,
                    reason: err.to_string(),
                });
                return None;
            }
        };

        QuestionLayout::from_json(&raw)
            .ok()
            .filter(|layout| layout.form_id() == form_id)
    }
}

/// Answers for a pre-filled link. The role answer is only set when the form
/// offers it as a choice, and empty profile fields are left out.
pub fn prefill_answers(
    layout: &QuestionLayout,
    role_title: &str,
    division: &str,
    profile: &RespondentProfile,
) -> Vec<PrefilledAnswer> {
    let mut answers = Vec::new();

    let choice = role_choice(division, role_title);
    if layout.offers_choice(&choice) {
        if let Some(item) = layout.item(QuestionRole::RoleSelect) {
            answers.push(PrefilledAnswer {
                item: item.clone(),
                value: choice,
            });
        }
    }

    let fields = [
        (QuestionRole::FullName, &profile.name),
        (QuestionRole::CurrentTitle, &profile.job_title),
        (QuestionRole::CurrentDepartment, &profile.department),
        (QuestionRole::Phone, &profile.phone),
    ];
    for (role, value) in fields {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if let Some(item) = layout.item(role) {
            answers.push(PrefilledAnswer {
                item: item.clone(),
                value: value.to_string(),
            });
        }
    }

    answers
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::forms::questions::ItemId;

    fn layout() -> QuestionLayout {
        let mut layout = QuestionLayout::new("form-1", vec!["Elementary - Art".to_string()]);
        layout.insert(QuestionRole::RoleSelect, ItemId("10".into()));
        layout.insert(QuestionRole::FullName, ItemId("11".into()));
        layout.insert(QuestionRole::CurrentDepartment, ItemId("12".into()));
        layout.insert(QuestionRole::CurrentTitle, ItemId("13".into()));
        layout.insert(QuestionRole::Phone, ItemId("14".into()));
        layout
    }

    #[test]
    fn empty_profile_fields_are_not_answered() {
        let profile = RespondentProfile {
            name: "Jane Doe".to_string(),
            email: "jane.doe@org.example".to_string(),
            job_title: String::new(),
            department: "  ".to_string(),
            phone: String::new(),
        };

        let answers = prefill_answers(&layout(), "Art", "Elementary", &profile);

        let items: Vec<&str> = answers.iter().map(|a| a.item.0.as_str()).collect();
        assert_eq!(items, vec!["10", "11"]);
        assert!(answers.iter().all(|answer| !answer.value.is_empty()));
        assert_eq!(answers[0].value, "Elementary - Art");
    }

    #[test]
    fn role_not_on_form_is_left_blank() {
        let profile = RespondentProfile {
            email: "kim@org.example".to_string(),
            ..RespondentProfile::default()
        };

        let answers = prefill_answers(&layout(), "Music", "Elementary", &profile);
        assert!(answers.is_empty());
    }
}
